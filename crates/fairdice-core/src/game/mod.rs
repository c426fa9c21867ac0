//! Game orchestration: analysis, fair toss, die selection, fair rolls,
//! comparison.
//!
//! The computer role is always the committing initiator and the human role
//! is always the responder, so the human's code path (the [`PlayerAgent`])
//! only ever observes commitments and reveals, never a live secret.

use crate::analysis::ProbabilityMatrix;
use crate::crypto::{Commitment, Reveal};
use crate::dice::{Die, GAME_FACES, MIN_DICE};
use crate::error::{Error, Result};
use crate::protocol::{
    CommitMessage, ContributionMessage, GameId, Initiator, Responder, RevealMessage, RoundKind,
    RoundResult,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Rerolls attempted under [`TiePolicy::Reroll`] before settling on a draw.
/// Two dice with identical face multisets could otherwise tie forever.
const MAX_REROLLS: usize = 32;

/// The two parties of a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    Human,
    Computer,
}

impl Player {
    /// Get the opponent
    pub fn opponent(&self) -> Player {
        match self {
            Player::Human => Player::Computer,
            Player::Computer => Player::Human,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Human => write!(f, "human"),
            Player::Computer => write!(f, "computer"),
        }
    }
}

/// What to do when both parties roll the same face value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TiePolicy {
    /// Report the tie as a draw
    #[default]
    Draw,
    /// Replay the two roll rounds with fresh commitments
    Reroll,
}

/// An agent answer: either a choice or a request to quit the game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision<T> {
    Pick(T),
    Quit,
}

/// The human-side capability driving a match.
///
/// Implemented by the interactive CLI in production and by scripted doubles
/// in tests. Every method may return [`Decision::Quit`]; quitting before a
/// reveal discards the in-flight round and ends the match with no result.
pub trait PlayerAgent {
    /// Contribution in `[0, 2)` for the first-pick toss, given the
    /// published commitment
    fn toss_contribution(&mut self, commitment: &Commitment) -> Result<Decision<u64>>;

    /// Pick a die index from `available`
    fn choose_die(
        &mut self,
        available: &[usize],
        dice: &[Die],
        matrix: &ProbabilityMatrix,
    ) -> Result<Decision<usize>>;

    /// Contribution in `[0, modulus)` for a roll round, given the
    /// published commitment
    fn roll_contribution(
        &mut self,
        round: RoundKind,
        commitment: &Commitment,
        modulus: u64,
    ) -> Result<Decision<u64>>;
}

/// Full message transcript of one protocol round, for display and audit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRecord {
    pub commit: CommitMessage,
    pub contribution: ContributionMessage,
    pub reveal: RevealMessage,
    pub result: RoundResult,
}

/// Outcome of a completed match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub game_id: GameId,
    pub first_picker: Player,
    pub human_die: usize,
    pub computer_die: usize,
    pub human_roll: i64,
    pub computer_roll: i64,
    /// `None` is a draw
    pub winner: Option<Player>,
    pub rounds: Vec<RoundRecord>,
}

/// How a match ended
#[derive(Clone, Debug)]
pub enum MatchVerdict {
    Completed(MatchOutcome),
    /// The human quit at a prompt; no result, not a loss
    Aborted,
}

enum Step {
    Round(RoundRecord),
    Quit,
}

/// A single two-party match over a validated dice set
pub struct Match {
    game_id: GameId,
    dice: Vec<Die>,
    matrix: ProbabilityMatrix,
    tie_policy: TiePolicy,
}

impl Match {
    /// Create a match from already-constructed dice.
    ///
    /// Re-checks the game configuration: at least [`MIN_DICE`] dice, each
    /// with exactly [`GAME_FACES`] faces.
    pub fn new(dice: Vec<Die>, tie_policy: TiePolicy) -> Result<Self> {
        if dice.len() < MIN_DICE {
            return Err(Error::NotEnoughDice {
                required: MIN_DICE,
                actual: dice.len(),
            });
        }
        for (index, die) in dice.iter().enumerate() {
            if die.face_count() != GAME_FACES {
                return Err(Error::InvalidFaceCount {
                    index,
                    expected: GAME_FACES,
                    actual: die.face_count(),
                });
            }
        }
        let matrix = ProbabilityMatrix::compute(&dice);
        Ok(Self {
            game_id: GameId::new(),
            dice,
            matrix,
            tie_policy,
        })
    }

    /// Create a match from raw face lists
    pub fn from_configs(raw_configs: &[Vec<i64>], tie_policy: TiePolicy) -> Result<Self> {
        Self::new(crate::dice::validate_dice(raw_configs)?, tie_policy)
    }

    /// This match's game ID
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// The dice in play
    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    /// Win-probability matrix for the dice in play
    pub fn matrix(&self) -> &ProbabilityMatrix {
        &self.matrix
    }

    /// Play one match to completion.
    ///
    /// Sequence: fair toss for first pick, die selection, one fair roll per
    /// party, comparison. Any failed verification aborts the match with
    /// [`Error::IntegrityViolation`] naming the round.
    pub fn play<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        agent: &mut dyn PlayerAgent,
    ) -> Result<MatchVerdict> {
        self.play_with_disclosure(rng, agent, |_, reveal| reveal)
    }

    /// Like [`Match::play`], but with the committing side's disclosure step
    /// factored out. Production discloses reveals verbatim; tests substitute
    /// a dishonest initiator to exercise the integrity-violation path.
    pub(crate) fn play_with_disclosure<R, F>(
        &self,
        rng: &mut R,
        agent: &mut dyn PlayerAgent,
        mut disclose: F,
    ) -> Result<MatchVerdict>
    where
        R: RngCore + CryptoRng,
        F: FnMut(RoundKind, Reveal) -> Reveal,
    {
        let mut rounds = Vec::new();
        info!(game_id = %self.game_id, dice = self.dice.len(), "match started");

        // Fair toss: odd combined value gives the human the first pick.
        let toss = match self.run_round(
            RoundKind::FirstPickToss,
            2,
            rng,
            &mut |commitment| agent.toss_contribution(commitment),
            &mut disclose,
        )? {
            Step::Round(record) => record,
            Step::Quit => return Ok(MatchVerdict::Aborted),
        };
        let first_picker = if toss.result.combined_value == 1 {
            Player::Human
        } else {
            Player::Computer
        };
        rounds.push(toss);
        info!(%first_picker, "first pick decided");

        let (human_die, computer_die) = match self.select_dice(first_picker, agent)? {
            Some(selection) => selection,
            None => return Ok(MatchVerdict::Aborted),
        };
        info!(human_die, computer_die, "dice claimed");

        let mut rerolls = 0;
        let (human_roll, computer_roll) = loop {
            let human_roll = match self.roll(
                RoundKind::HumanRoll,
                human_die,
                rng,
                agent,
                &mut disclose,
                &mut rounds,
            )? {
                Some(face) => face,
                None => return Ok(MatchVerdict::Aborted),
            };
            let computer_roll = match self.roll(
                RoundKind::ComputerRoll,
                computer_die,
                rng,
                agent,
                &mut disclose,
                &mut rounds,
            )? {
                Some(face) => face,
                None => return Ok(MatchVerdict::Aborted),
            };

            if human_roll != computer_roll
                || self.tie_policy == TiePolicy::Draw
                || rerolls >= MAX_REROLLS
            {
                break (human_roll, computer_roll);
            }
            rerolls += 1;
            info!(human_roll, computer_roll, rerolls, "tie, rerolling");
        };

        let winner = match human_roll.cmp(&computer_roll) {
            std::cmp::Ordering::Greater => Some(Player::Human),
            std::cmp::Ordering::Less => Some(Player::Computer),
            std::cmp::Ordering::Equal => None,
        };
        info!(game_id = %self.game_id, human_roll, computer_roll, ?winner, "match finished");

        Ok(MatchVerdict::Completed(MatchOutcome {
            game_id: self.game_id,
            first_picker,
            human_die,
            computer_die,
            human_roll,
            computer_roll,
            winner,
            rounds,
        }))
    }

    /// Die selection in first-pick order. Returns `(human_die, computer_die)`
    /// or `None` if the human quit. The computer selects deterministically
    /// from the probability matrix.
    fn select_dice(
        &self,
        first_picker: Player,
        agent: &mut dyn PlayerAgent,
    ) -> Result<Option<(usize, usize)>> {
        let mut available: Vec<usize> = (0..self.dice.len()).collect();

        match first_picker {
            Player::Human => {
                let human_die = match agent.choose_die(&available, &self.dice, &self.matrix)? {
                    Decision::Pick(index) => self.claim(&mut available, index)?,
                    Decision::Quit => return Ok(None),
                };
                let computer_die = self
                    .matrix
                    .best_against(human_die, &available)
                    .ok_or(Error::NotEnoughDice {
                        required: MIN_DICE,
                        actual: available.len(),
                    })?;
                debug!(human_die, computer_die, "computer countered");
                Ok(Some((human_die, computer_die)))
            }
            Player::Computer => {
                let computer_die =
                    self.matrix
                        .best_of(&available)
                        .ok_or(Error::NotEnoughDice {
                            required: MIN_DICE,
                            actual: available.len(),
                        })?;
                available.retain(|&i| i != computer_die);
                debug!(computer_die, "computer picked first");
                let human_die = match agent.choose_die(&available, &self.dice, &self.matrix)? {
                    Decision::Pick(index) => self.claim(&mut available, index)?,
                    Decision::Quit => return Ok(None),
                };
                Ok(Some((human_die, computer_die)))
            }
        }
    }

    fn claim(&self, available: &mut Vec<usize>, index: usize) -> Result<usize> {
        if index >= self.dice.len() {
            return Err(Error::IndexOutOfRange {
                index,
                count: self.dice.len(),
            });
        }
        if !available.contains(&index) {
            return Err(Error::DieAlreadyClaimed { index });
        }
        available.retain(|&i| i != index);
        Ok(index)
    }

    /// One fair roll round for the die at `die_index`, mapped through the
    /// die's face list. Returns `None` if the human quit at the prompt.
    fn roll<R: RngCore + CryptoRng>(
        &self,
        kind: RoundKind,
        die_index: usize,
        rng: &mut R,
        agent: &mut dyn PlayerAgent,
        disclose: &mut dyn FnMut(RoundKind, Reveal) -> Reveal,
        rounds: &mut Vec<RoundRecord>,
    ) -> Result<Option<i64>> {
        let die = &self.dice[die_index];
        let modulus = die.face_count() as u64;

        let record = match self.run_round(
            kind,
            modulus,
            rng,
            &mut |commitment| agent.roll_contribution(kind, commitment, modulus),
            disclose,
        )? {
            Step::Round(record) => record,
            Step::Quit => return Ok(None),
        };
        let face = die.face_at(record.result.combined_value as usize)?;
        rounds.push(record);
        Ok(Some(face))
    }

    /// Run one commit-reveal round, recording the full message transcript.
    /// A failed verification terminates the match with an integrity error.
    fn run_round<R: RngCore + CryptoRng>(
        &self,
        kind: RoundKind,
        modulus: u64,
        rng: &mut R,
        contribute: &mut dyn FnMut(&Commitment) -> Result<Decision<u64>>,
        disclose: &mut dyn FnMut(RoundKind, Reveal) -> Reveal,
    ) -> Result<Step> {
        let initiator = Initiator::commit(modulus, rng)?;
        let commit = CommitMessage {
            game_id: self.game_id,
            round: kind,
            modulus,
            commitment: *initiator.commitment(),
        };

        let contribution = match contribute(&commit.commitment)? {
            Decision::Pick(value) => value,
            Decision::Quit => {
                info!(round = %kind, "human quit, discarding in-flight secret");
                return Ok(Step::Quit);
            }
        };
        let responder = Responder::accept(commit.commitment, modulus, contribution)?;
        let contribution = ContributionMessage {
            game_id: self.game_id,
            round: kind,
            contribution,
        };

        let reveal = RevealMessage {
            game_id: self.game_id,
            round: kind,
            reveal: disclose(kind, initiator.reveal()),
        };
        let result = responder.verify(&reveal.reveal);
        if !result.is_valid {
            return Err(Error::IntegrityViolation { round: kind });
        }

        Ok(Step::Round(RoundRecord {
            commit,
            contribution,
            reveal,
            result,
        }))
    }
}
