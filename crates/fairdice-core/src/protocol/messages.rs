//! Protocol messages.
//!
//! The two roles exchange only these three messages per round; neither
//! role's code path can observe the other's private state.

use crate::crypto::{Commitment, Reveal};
use crate::protocol::{GameId, RoundKind};
use serde::{Deserialize, Serialize};

/// Step 1: the initiator publishes its commitment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitMessage {
    pub game_id: GameId,
    pub round: RoundKind,
    pub modulus: u64,
    pub commitment: Commitment,
}

/// Step 2: the counterpart fixes its contribution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContributionMessage {
    pub game_id: GameId,
    pub round: RoundKind,
    pub contribution: u64,
}

/// Step 3: the initiator discloses value and nonce for verification
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevealMessage {
    pub game_id: GameId,
    pub round: RoundKind,
    pub reveal: Reveal,
}
