//! One round of the fair value protocol.
//!
//! Round state machine:
//! `Idle -> Committed -> CounterpartChosen -> Revealed -> Verified(Valid|Invalid)`
//!
//! The states are enforced by two role types. [`Initiator`] holds the secret
//! and exposes only the commitment; [`Responder`] fixes the counterpart's
//! contribution before any reveal and performs verification. Because the
//! commitment is published before the contribution is known, the initiator
//! cannot steer the outcome; because the contribution is fixed before the
//! reveal, the initiator cannot claim a different secret. The combined value
//! `(secret + contribution) mod N` is therefore unbiasable by either party
//! alone.

use crate::crypto::{self, Commitment, Reveal, Secret};
use crate::error::{Error, Result};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Unique game identifier, tagging every protocol message
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Create a new random game ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({})", self.0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which protocol round a message or failure belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundKind {
    /// The N=2 toss deciding who picks a die first
    FirstPickToss,
    /// The human player's roll
    HumanRoll,
    /// The computer player's roll
    ComputerRoll,
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKind::FirstPickToss => write!(f, "first-pick toss"),
            RoundKind::HumanRoll => write!(f, "human roll"),
            RoundKind::ComputerRoll => write!(f, "computer roll"),
        }
    }
}

/// Outcome of a completed round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    /// `(secret + contribution) mod N`; only meaningful when `is_valid`
    pub combined_value: u64,
    /// Whether the reveal matched the commitment
    pub is_valid: bool,
}

/// Uniform draw from `[0, modulus)` that surfaces entropy failure instead
/// of panicking. Rejection sampling below the largest multiple of `modulus`
/// keeps the draw unbiased.
fn draw_uniform<R: RngCore + CryptoRng>(modulus: u64, rng: &mut R) -> Result<u64> {
    let limit = u64::MAX - (u64::MAX % modulus);
    let mut bytes = [0u8; 8];
    loop {
        rng.try_fill_bytes(&mut bytes)?;
        let v = u64::from_be_bytes(bytes);
        if v < limit {
            return Ok(v % modulus);
        }
    }
}

/// The committing side of a round. State: `Committed`.
///
/// Owns the secret; nothing outside this struct can observe it before
/// [`Initiator::reveal`] consumes it.
pub struct Initiator {
    modulus: u64,
    commitment: Commitment,
    secret: Secret,
}

impl Initiator {
    /// `Idle -> Committed`: draw a uniform secret in `[0, N)` and commit
    pub fn commit<R: RngCore + CryptoRng>(modulus: u64, rng: &mut R) -> Result<Self> {
        if modulus == 0 {
            return Err(Error::InvalidModulus);
        }
        let value = draw_uniform(modulus, rng)?;
        let (commitment, secret) = crypto::commit(value, rng)?;
        debug!(%commitment, modulus, "initiator committed");
        Ok(Self {
            modulus,
            commitment,
            secret,
        })
    }

    /// The public commitment, safe to publish to the counterpart
    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    /// The round's modulus
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// `CounterpartChosen -> Revealed`: disclose the secret, consuming it
    pub fn reveal(self) -> Reveal {
        self.secret.reveal()
    }
}

/// The contributing side of a round. State: `CounterpartChosen`.
///
/// Sees only the commitment until the initiator reveals.
pub struct Responder {
    modulus: u64,
    commitment: Commitment,
    contribution: u64,
}

impl Responder {
    /// `Committed -> CounterpartChosen`: fix the contribution against a
    /// published commitment. Rejects contributions outside `[0, N)`.
    pub fn accept(commitment: Commitment, modulus: u64, contribution: u64) -> Result<Self> {
        if modulus == 0 {
            return Err(Error::InvalidModulus);
        }
        if contribution >= modulus {
            return Err(Error::ContributionOutOfRange {
                value: contribution,
                modulus,
            });
        }
        Ok(Self {
            modulus,
            commitment,
            contribution,
        })
    }

    /// The contribution fixed for this round
    pub fn contribution(&self) -> u64 {
        self.contribution
    }

    /// `Revealed -> Verified`: recompute the digest from the reveal and
    /// combine. An invalid reveal yields `is_valid == false` and no trusted
    /// combined value.
    pub fn verify(&self, reveal: &Reveal) -> RoundResult {
        if !crypto::verify(&self.commitment, reveal) {
            debug!(commitment = %self.commitment, "reveal failed verification");
            return RoundResult {
                combined_value: 0,
                is_valid: false,
            };
        }
        // u128 intermediate so the sum cannot overflow for large moduli.
        let combined_value =
            ((u128::from(reveal.value) + u128::from(self.contribution)) % u128::from(self.modulus)) as u64;
        debug!(
            secret = reveal.value,
            contribution = self.contribution,
            combined_value,
            "round verified"
        );
        RoundResult {
            combined_value,
            is_valid: true,
        }
    }
}

/// Drive one full fair round: commit, collect the counterpart's contribution
/// given only the commitment, reveal, verify, combine.
///
/// `contribute` is the counterpart capability; it may inspect the published
/// commitment but learns nothing about the secret from it.
pub fn run_fair_round<R, F>(modulus: u64, rng: &mut R, mut contribute: F) -> Result<RoundResult>
where
    R: RngCore + CryptoRng,
    F: FnMut(&Commitment) -> Result<u64>,
{
    let initiator = Initiator::commit(modulus, rng)?;
    let contribution = contribute(initiator.commitment())?;
    let responder = Responder::accept(*initiator.commitment(), modulus, contribution)?;
    let reveal = initiator.reveal();
    Ok(responder.verify(&reveal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Nonce;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    /// Random source whose entropy pool is exhausted
    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new("entropy exhausted"))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn test_entropy_failure_surfaces_from_commit() {
        // Both the secret draw and the nonce draw go through the fallible
        // path, so a dead random source is an error, not a panic.
        assert!(matches!(
            Initiator::commit(6, &mut FailingRng),
            Err(Error::RandomSource(_))
        ));
    }

    #[test]
    fn test_draw_uniform_covers_range() {
        let mut rng = test_rng(17);
        let mut counts = [0u64; 6];
        for _ in 0..600 {
            let v = draw_uniform(6, &mut rng).unwrap();
            assert!(v < 6);
            counts[v as usize] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0), "residue missed: {counts:?}");

        assert_eq!(draw_uniform(1, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_round_combines_mod_n() {
        let mut rng = test_rng(1);
        let initiator = Initiator::commit(6, &mut rng).unwrap();
        let responder = Responder::accept(*initiator.commitment(), 6, 5).unwrap();

        let reveal = initiator.reveal();
        let expected = (reveal.value + 5) % 6;
        let result = responder.verify(&reveal);

        assert!(result.is_valid);
        assert_eq!(result.combined_value, expected);
        assert!(result.combined_value < 6);
    }

    #[test]
    fn test_zero_modulus_rejected() {
        let mut rng = test_rng(2);
        assert!(matches!(
            Initiator::commit(0, &mut rng),
            Err(Error::InvalidModulus)
        ));
    }

    #[test]
    fn test_modulus_one_always_zero() {
        let mut rng = test_rng(3);
        let result = run_fair_round(1, &mut rng, |_| Ok(0)).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.combined_value, 0);
    }

    #[test]
    fn test_contribution_out_of_range_rejected() {
        let mut rng = test_rng(4);
        let initiator = Initiator::commit(2, &mut rng).unwrap();
        assert!(matches!(
            Responder::accept(*initiator.commitment(), 2, 2),
            Err(Error::ContributionOutOfRange {
                value: 2,
                modulus: 2
            })
        ));
    }

    #[test]
    fn test_tampered_reveal_is_invalid() {
        let mut rng = test_rng(5);
        let initiator = Initiator::commit(6, &mut rng).unwrap();
        let responder = Responder::accept(*initiator.commitment(), 6, 3).unwrap();

        let mut reveal = initiator.reveal();
        let mut bytes = *reveal.nonce.as_bytes();
        bytes[7] ^= 0x10;
        reveal.nonce = Nonce::from_bytes(bytes);

        assert!(!responder.verify(&reveal).is_valid);
    }

    #[test]
    fn test_substituted_value_is_invalid() {
        let mut rng = test_rng(6);
        let initiator = Initiator::commit(6, &mut rng).unwrap();
        let responder = Responder::accept(*initiator.commitment(), 6, 3).unwrap();

        let mut reveal = initiator.reveal();
        reveal.value = (reveal.value + 1) % 6;

        assert!(!responder.verify(&reveal).is_valid);
    }

    #[test]
    fn test_uniform_against_adversarial_contribution() {
        // The counterpart always plays the same contribution; the combined
        // value must still be uniform because the secret is.
        let mut rng = test_rng(7);
        let modulus = 6u64;
        let trials = 6000;
        let mut counts = [0u64; 6];

        for _ in 0..trials {
            let result = run_fair_round(modulus, &mut rng, |_| Ok(modulus - 1)).unwrap();
            assert!(result.is_valid);
            counts[result.combined_value as usize] += 1;
        }

        // Chi-square against uniform, 5 degrees of freedom. The seeded RNG
        // makes this deterministic; 15.0 is well above the 95th percentile.
        let expected = trials as f64 / modulus as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum();
        assert!(chi2 < 15.0, "chi-square {chi2} suggests bias: {counts:?}");
    }

    #[test]
    fn test_contribution_provider_sees_only_commitment() {
        let mut rng = test_rng(8);
        let mut seen = None;
        let result = run_fair_round(6, &mut rng, |commitment| {
            seen = Some(*commitment);
            Ok(0)
        })
        .unwrap();

        assert!(result.is_valid);
        assert!(seen.is_some());
    }

    #[test]
    fn test_provider_error_propagates() {
        let mut rng = test_rng(9);
        let err = run_fair_round(6, &mut rng, |_| {
            Err(Error::ContributionOutOfRange {
                value: 9,
                modulus: 6,
            })
        });
        assert!(matches!(err, Err(Error::ContributionOutOfRange { .. })));
    }
}
