//! Fairdice Core Library
//!
//! This crate provides the commitment scheme, the fair value protocol,
//! the win-probability analysis, and the game orchestration for a
//! two-party dice game played without a trusted third party.

pub mod analysis;
pub mod crypto;
pub mod dice;
pub mod error;
pub mod game;
pub mod protocol;

pub use analysis::ProbabilityMatrix;
pub use crypto::{Commitment, Nonce, Reveal, Secret};
pub use dice::{validate_dice, Die, GAME_FACES, MIN_DICE};
pub use error::{Error, Result};
pub use game::{Decision, Match, MatchOutcome, MatchVerdict, Player, PlayerAgent, TiePolicy};
pub use protocol::{run_fair_round, GameId, Initiator, Responder, RoundKind, RoundResult};
