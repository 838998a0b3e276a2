//! Heuristic evaluation of whole positions
//!
//! A color's score is the summed threat score of every stone it owns. The
//! position value compares the two scores:
//! - Positive values favor the perspective color
//! - `WIN` or more on either side marks a finished game

use crate::board::{Position, Stone};

use super::patterns::WIN;
use super::threat::ThreatEvaluator;

/// Threat totals for both colors of one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heuristic {
    pub black: i64,
    pub white: i64,
}

impl Heuristic {
    /// Score both colors from scratch.
    #[must_use]
    pub fn compute(evaluator: &ThreatEvaluator, position: &Position) -> Self {
        Self {
            black: score_for(evaluator, position, Stone::Black),
            white: score_for(evaluator, position, Stone::White),
        }
    }

    #[inline]
    pub fn score(&self, color: Stone) -> i64 {
        match color {
            Stone::Black => self.black,
            Stone::White => self.white,
            Stone::Empty => 0,
        }
    }

    /// Black minus white, negated when seen from white.
    ///
    /// # Arguments
    /// * `perspective` - The color the value is reported for
    #[inline]
    pub fn value(&self, perspective: Stone) -> i64 {
        let v = self.black - self.white;
        if perspective == Stone::White {
            -v
        } else {
            v
        }
    }

    /// Color holding a five, if any. When both do, the higher total wins and
    /// black takes an exact tie.
    #[inline]
    pub fn winner(&self) -> Option<Stone> {
        if self.black < WIN && self.white < WIN {
            return None;
        }
        if self.black >= self.white {
            Some(Stone::Black)
        } else {
            Some(Stone::White)
        }
    }
}

/// Sum of `evaluate` over every stone of `color`.
#[must_use]
pub fn score_for(evaluator: &ThreatEvaluator, position: &Position, color: Stone) -> i64 {
    if !color.is_player() {
        return 0;
    }
    position
        .stones(color)
        .iter_ones()
        .map(|pos| evaluator.evaluate(position, color, pos))
        .sum()
}
