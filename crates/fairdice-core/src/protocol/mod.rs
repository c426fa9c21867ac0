//! The fair value protocol: commit-reveal-combine rounds and their messages.

mod messages;
mod round;

pub use messages::{CommitMessage, ContributionMessage, RevealMessage};
pub use round::{run_fair_round, GameId, Initiator, Responder, RoundKind, RoundResult};
