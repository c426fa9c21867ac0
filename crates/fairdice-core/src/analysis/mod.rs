//! Win-probability analysis for dice matchups.
//!
//! Purely combinatorial: every ordered pair of dice is compared face by
//! face, so the counts are exact and the result is deterministic.

use crate::dice::Die;
use serde::{Deserialize, Serialize};

/// Exact win counts for every ordered pair of dice.
///
/// For pair `(i, j)` with `i != j`, `wins(i, j)` is the number of face
/// combinations where die `i` strictly beats die `j`, out of
/// `total(i, j) = face_count(i) * face_count(j)` combinations. Wins, losses,
/// and ties partition the total.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbabilityMatrix {
    dice_count: usize,
    face_totals: Vec<u64>,
    win_counts: Vec<u64>,
}

impl ProbabilityMatrix {
    /// Compute the matrix for a set of dice by exhaustive pairwise comparison
    pub fn compute(dice: &[Die]) -> Self {
        let n = dice.len();
        let mut win_counts = vec![0u64; n * n];
        let mut face_totals = vec![0u64; n * n];

        for (i, a) in dice.iter().enumerate() {
            for (j, b) in dice.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut wins = 0u64;
                for &fa in a.faces() {
                    for &fb in b.faces() {
                        if fa > fb {
                            wins += 1;
                        }
                    }
                }
                win_counts[i * n + j] = wins;
                face_totals[i * n + j] = (a.face_count() * b.face_count()) as u64;
            }
        }

        Self {
            dice_count: n,
            face_totals,
            win_counts,
        }
    }

    /// Number of dice the matrix covers
    pub fn dice_count(&self) -> usize {
        self.dice_count
    }

    /// Exact count of face pairs where die `i` beats die `j`
    pub fn wins(&self, i: usize, j: usize) -> Option<u64> {
        if i == j || i >= self.dice_count || j >= self.dice_count {
            return None;
        }
        Some(self.win_counts[i * self.dice_count + j])
    }

    /// Total face pairs for the ordered pair `(i, j)`
    pub fn total(&self, i: usize, j: usize) -> Option<u64> {
        if i == j || i >= self.dice_count || j >= self.dice_count {
            return None;
        }
        Some(self.face_totals[i * self.dice_count + j])
    }

    /// Probability that die `i` beats die `j` in one independent roll
    pub fn probability(&self, i: usize, j: usize) -> Option<f64> {
        let wins = self.wins(i, j)? as f64;
        let total = self.total(i, j)? as f64;
        Some(wins / total)
    }

    /// The die among `available` with the best worst-case matchup against
    /// the other available dice. Used for deterministic computer selection.
    pub fn best_of(&self, available: &[usize]) -> Option<usize> {
        available
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let worst_a = self.worst_case(a, available);
                let worst_b = self.worst_case(b, available);
                worst_a
                    .partial_cmp(&worst_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// The best counter among `available` to an opponent's fixed die
    pub fn best_against(&self, opponent: usize, available: &[usize]) -> Option<usize> {
        available
            .iter()
            .copied()
            .filter(|&i| i != opponent)
            .max_by(|&a, &b| {
                let pa = self.probability(a, opponent).unwrap_or(0.0);
                let pb = self.probability(b, opponent).unwrap_or(0.0);
                pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn worst_case(&self, candidate: usize, available: &[usize]) -> f64 {
        available
            .iter()
            .copied()
            .filter(|&j| j != candidate)
            .filter_map(|j| self.probability(candidate, j))
            .fold(1.0, f64::min)
    }
}
