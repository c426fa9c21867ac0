//! Dice model: arbitrary-faced dice and game configuration validation.

use crate::error::{Error, Result};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of faces every die must have in this game
pub const GAME_FACES: usize = 6;

/// Minimum number of dice a game configuration must supply
pub const MIN_DICE: usize = 3;

/// A multi-sided die with arbitrary integer faces.
///
/// Faces may repeat and need not be sequential. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    faces: Vec<i64>,
}

impl Die {
    /// Create a die from an ordered face list; rejects empty lists
    pub fn new(faces: Vec<i64>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::EmptyDice);
        }
        Ok(Self { faces })
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// All faces in order
    pub fn faces(&self) -> &[i64] {
        &self.faces
    }

    /// Face value at the given index, bounds-checked
    pub fn face_at(&self, index: usize) -> Result<i64> {
        self.faces
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                count: self.faces.len(),
            })
    }

    /// Uniformly chosen face value from a secure random source.
    ///
    /// Preview only: game outcomes come from the fair value protocol, not
    /// from local sampling.
    pub fn sample_uniform<R: RngCore + CryptoRng>(&self, rng: &mut R) -> i64 {
        self.faces[rng.gen_range(0..self.faces.len())]
    }
}

impl FromStr for Die {
    type Err = Error;

    /// Parse the CLI face-list format, e.g. `"2,3,4,5,6,1"`
    fn from_str(s: &str) -> Result<Self> {
        let faces = s
            .split(',')
            .map(|f| {
                f.trim()
                    .parse::<i64>()
                    .map_err(|_| Error::InvalidFaceValue(s.to_string()))
            })
            .collect::<Result<Vec<i64>>>()?;
        Self::new(faces)
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.faces.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", faces.join(","))
    }
}

/// Validate a full game configuration: at least [`MIN_DICE`] dice, each with
/// exactly [`GAME_FACES`] faces.
pub fn validate_dice(raw_configs: &[Vec<i64>]) -> Result<Vec<Die>> {
    if raw_configs.len() < MIN_DICE {
        return Err(Error::NotEnoughDice {
            required: MIN_DICE,
            actual: raw_configs.len(),
        });
    }
    raw_configs
        .iter()
        .enumerate()
        .map(|(index, faces)| {
            if faces.len() != GAME_FACES {
                return Err(Error::InvalidFaceCount {
                    index,
                    expected: GAME_FACES,
                    actual: faces.len(),
                });
            }
            Die::new(faces.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_empty_die_rejected() {
        assert!(matches!(Die::new(vec![]), Err(Error::EmptyDice)));
    }

    #[test]
    fn test_face_at_bounds() {
        let die = Die::new(vec![2, 2, 4, 4, 9, 9]).unwrap();
        assert_eq!(die.face_at(0).unwrap(), 2);
        assert_eq!(die.face_at(5).unwrap(), 9);
        assert!(matches!(
            die.face_at(6),
            Err(Error::IndexOutOfRange { index: 6, count: 6 })
        ));
    }

    #[test]
    fn test_parse_face_list() {
        let die: Die = "2,3,4,5,6,1".parse().unwrap();
        assert_eq!(die.faces(), &[2, 3, 4, 5, 6, 1]);

        let die: Die = " -1, 0 ,7 ".parse().unwrap();
        assert_eq!(die.faces(), &[-1, 0, 7]);
    }

    #[test]
    fn test_parse_rejects_non_integer_faces() {
        assert!(matches!(
            "1,2,x,4,5,6".parse::<Die>(),
            Err(Error::InvalidFaceValue(_))
        ));
        assert!(matches!("".parse::<Die>(), Err(Error::InvalidFaceValue(_))));
    }

    #[test]
    fn test_validate_dice_accepts_valid_config() {
        let configs = vec![
            vec![2, 2, 4, 4, 9, 9],
            vec![6, 8, 1, 1, 8, 6],
            vec![7, 5, 3, 7, 5, 3],
        ];
        let dice = validate_dice(&configs).unwrap();
        assert_eq!(dice.len(), 3);
        assert!(dice.iter().all(|d| d.face_count() == GAME_FACES));
    }

    #[test]
    fn test_validate_dice_requires_three_dice() {
        let configs = vec![vec![1, 2, 3, 4, 5, 6], vec![1, 2, 3, 4, 5, 6]];
        assert!(matches!(
            validate_dice(&configs),
            Err(Error::NotEnoughDice {
                required: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_validate_dice_requires_six_faces() {
        let configs = vec![
            vec![1, 2, 3, 4, 5, 6],
            vec![1, 2, 3],
            vec![1, 2, 3, 4, 5, 6],
        ];
        assert!(matches!(
            validate_dice(&configs),
            Err(Error::InvalidFaceCount {
                index: 1,
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_sample_uniform_hits_only_listed_faces() {
        let die = Die::new(vec![7, 5, 3, 7, 5, 3]).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..100 {
            let v = die.sample_uniform(&mut rng);
            assert!(die.faces().contains(&v));
        }
    }
}
