//! Error types for the fairdice protocol.

use crate::protocol::RoundKind;
use thiserror::Error;

/// Result type alias for fairdice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during fairdice operations
#[derive(Debug, Error)]
pub enum Error {
    /// A die was constructed with no faces
    #[error("a die must have at least one face")]
    EmptyDice,

    /// A die has the wrong number of faces for this game
    #[error("die {index} has {actual} faces, expected {expected}")]
    InvalidFaceCount {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Too few dice were supplied
    #[error("at least {required} dice are required, got {actual}")]
    NotEnoughDice { required: usize, actual: usize },

    /// A face value failed to parse as an integer
    #[error("invalid face value '{0}': faces must be comma-separated integers")]
    InvalidFaceValue(String),

    /// A face index was out of bounds
    #[error("face index {index} out of range for a die with {count} faces")]
    IndexOutOfRange { index: usize, count: usize },

    /// The protocol modulus was zero
    #[error("modulus must be at least 1")]
    InvalidModulus,

    /// A contribution fell outside the round's range
    #[error("contribution {value} out of range for modulus {modulus}")]
    ContributionOutOfRange { value: u64, modulus: u64 },

    /// A die was selected twice
    #[error("die {index} is already claimed")]
    DieAlreadyClaimed { index: usize },

    /// A commitment failed to verify: the counterpart attempted to cheat
    #[error("integrity violation in {round} round: reveal does not match commitment")]
    IntegrityViolation { round: RoundKind },

    /// The secure random source could not supply entropy
    #[error("random source failure: {0}")]
    RandomSource(#[from] rand::Error),
}
