//! Commitment, Nonce, Secret, and Reveal for the commit-reveal scheme.
//!
//! A commitment is `HMAC-SHA3-256(nonce, value)`. The nonce doubles as the
//! HMAC key and is used for exactly one commit/reveal pair, so a published
//! digest hides the committed value and binds the committer to it.

use crate::error::Result;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::Sha3_256;
use std::fmt;

type HmacSha3 = Hmac<Sha3_256>;

/// Length of a commitment digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Length of a nonce (HMAC key) in bytes: 256 bits of fresh entropy per round
pub const NONCE_LEN: usize = 32;

/// Single-use key for the keyed hash
#[derive(Clone, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from a cryptographically secure source
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; NONCE_LEN];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Hex encoding for display
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(&self.0[..8]))
    }
}

/// Commitment = HMAC-SHA3-256(nonce, value)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment([u8; DIGEST_LEN]);

impl Commitment {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The committer's private half: the value and the nonce that bound it.
///
/// Held by the initiator until reveal time; consumed exactly once.
#[derive(Debug)]
pub struct Secret {
    value: u64,
    nonce: Nonce,
}

impl Secret {
    /// The committed value
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Disclose the secret, consuming it
    pub fn reveal(self) -> Reveal {
        Reveal {
            value: self.value,
            nonce: self.nonce,
        }
    }
}

/// Public disclosure of a secret: the value and the nonce used to commit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reveal {
    pub value: u64,
    pub nonce: Nonce,
}

fn keyed_digest(nonce: &Nonce, value: u64) -> [u8; DIGEST_LEN] {
    // HMAC accepts keys of any length, so this cannot fail for a 32-byte nonce.
    let mut mac = HmacSha3::new_from_slice(nonce.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&value.to_be_bytes());
    mac.finalize().into_bytes().into()
}

/// Commit to a value with a fresh nonce.
///
/// Returns the public commitment to publish and the private secret to hold
/// until the counterpart's contribution is fixed.
pub fn commit<R: RngCore + CryptoRng>(value: u64, rng: &mut R) -> Result<(Commitment, Secret)> {
    let nonce = Nonce::random(rng)?;
    let digest = keyed_digest(&nonce, value);
    Ok((Commitment(digest), Secret { value, nonce }))
}

/// Verify that a reveal matches an earlier commitment.
///
/// Constant-time comparison; returns false on any mismatch, never panics.
pub fn verify(commitment: &Commitment, reveal: &Reveal) -> bool {
    let mut mac =
        HmacSha3::new_from_slice(reveal.nonce.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&reveal.value.to_be_bytes());
    mac.verify_slice(commitment.as_bytes()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(7)
    }

    #[test]
    fn test_commit_verify_roundtrip() {
        let mut rng = test_rng();
        let (commitment, secret) = commit(4, &mut rng).unwrap();

        assert_eq!(secret.value(), 4);
        assert!(verify(&commitment, &secret.reveal()));
    }

    #[test]
    fn test_wrong_value_fails_verification() {
        let mut rng = test_rng();
        let (commitment, secret) = commit(4, &mut rng).unwrap();

        let mut reveal = secret.reveal();
        reveal.value = 5;
        assert!(!verify(&commitment, &reveal));
    }

    #[test]
    fn test_wrong_nonce_fails_verification() {
        let mut rng = test_rng();
        let (commitment, secret) = commit(4, &mut rng).unwrap();

        let mut reveal = secret.reveal();
        let mut bytes = *reveal.nonce.as_bytes();
        bytes[0] ^= 0x01;
        reveal.nonce = Nonce::from_bytes(bytes);
        assert!(!verify(&commitment, &reveal));
    }

    #[test]
    fn test_single_bit_digest_mutation_fails() {
        let mut rng = test_rng();
        let (commitment, secret) = commit(2, &mut rng).unwrap();
        let reveal = secret.reveal();

        for byte in 0..DIGEST_LEN {
            for bit in 0..8 {
                let mut bytes = *commitment.as_bytes();
                bytes[byte] ^= 1 << bit;
                assert!(!verify(&Commitment::from_bytes(bytes), &reveal));
            }
        }
    }

    #[test]
    fn test_same_value_distinct_digests() {
        // Hiding: the digest depends on the nonce, so repeated commitments to
        // the same value must not repeat or correlate.
        let mut rng = test_rng();
        let mut digests = std::collections::HashSet::new();
        let trials = 256;

        let mut ones = 0u32;
        for _ in 0..trials {
            let (commitment, _) = commit(3, &mut rng).unwrap();
            ones += commitment
                .as_bytes()
                .iter()
                .map(|b| b.count_ones())
                .sum::<u32>();
            assert!(digests.insert(*commitment.as_bytes()));
        }

        // Bit balance: expect ~50% ones across all digest bits.
        let total_bits = (trials * DIGEST_LEN * 8) as f64;
        let ratio = f64::from(ones) / total_bits;
        assert!((0.48..=0.52).contains(&ratio), "bit ratio {ratio}");
    }

    #[test]
    fn test_commitment_hex_display() {
        let commitment = Commitment::from_bytes([0xab; DIGEST_LEN]);
        assert_eq!(commitment.to_string(), "ab".repeat(DIGEST_LEN));
    }

    #[test]
    fn test_reveal_serialization() {
        let mut rng = test_rng();
        let (_, secret) = commit(1, &mut rng).unwrap();
        let reveal = secret.reveal();

        let json = serde_json::to_string(&reveal).unwrap();
        let back: Reveal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, reveal.value);
        assert_eq!(back.nonce.as_bytes(), reveal.nonce.as_bytes());
    }
}
