//! Cryptographic primitives for the fairdice protocol.
//!
//! This module provides the keyed-hash commitment scheme: Nonce,
//! Commitment, Secret, and Reveal, built on HMAC-SHA3-256.

mod commitment;

pub use commitment::{commit, verify, Commitment, Nonce, Reveal, Secret, DIGEST_LEN, NONCE_LEN};
