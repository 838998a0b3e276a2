//! Threat taxonomy and scoring weights
//!
//! A threat is a run of one player's stones (at most one internal gap) seen
//! along a single line. Categories differ by run length, whether the run is
//! open ("straight") or capped by an opponent stone or the edge ("blocked"),
//! and whether it contains a gap ("poked").

/// Weight of `five`. Any score at or beyond this magnitude is a proven
/// win or loss.
pub const WIN: i64 = 1_000_000_000_000_000;

/// Threats at or above this score are worth a closer look (straight three).
pub const INTERESTING: i64 = 5_000;

/// Threat categories, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Threat {
    Five,
    StraightFour,
    StraightPokedFour,
    BlockedFour,
    BlockedPokedFour,
    StraightThree,
    StraightPokedThree,
    BlockedThree,
    BlockedPokedThree,
    StraightTwo,
    StraightPokedTwo,
    BlockedTwo,
    BlockedPokedTwo,
    None,
}

impl Threat {
    /// Fixed score of the category.
    pub const fn weight(self) -> i64 {
        match self {
            Threat::Five => WIN,
            // _OOOO_
            Threat::StraightFour => 100_000,
            Threat::StraightPokedFour | Threat::BlockedFour | Threat::BlockedPokedFour => 10_000,
            // _OOO_ / _OO_O_
            Threat::StraightThree | Threat::StraightPokedThree => 5_000,
            Threat::BlockedThree | Threat::BlockedPokedThree => 1_670,
            Threat::StraightTwo | Threat::StraightPokedTwo => 1_500,
            Threat::BlockedTwo => 500,
            Threat::BlockedPokedTwo => 300,
            Threat::None => 0,
        }
    }

    /// Category of a run with `same` stones, `poked` if it spans one gap.
    ///
    /// Returns `None` (the Option) for runs that do not form a threat: fewer
    /// than two stones, or a gapped run holding five or more.
    pub fn from_run(same: usize, poked: bool, blocked: bool) -> Option<Threat> {
        let threat = match (same, poked, blocked) {
            (n, false, _) if n >= 5 => Threat::Five,
            (4, false, false) => Threat::StraightFour,
            (4, false, true) => Threat::BlockedFour,
            (4, true, false) => Threat::StraightPokedFour,
            (4, true, true) => Threat::BlockedPokedFour,
            (3, false, false) => Threat::StraightThree,
            (3, false, true) => Threat::BlockedThree,
            (3, true, false) => Threat::StraightPokedThree,
            (3, true, true) => Threat::BlockedPokedThree,
            (2, false, false) => Threat::StraightTwo,
            (2, false, true) => Threat::BlockedTwo,
            (2, true, false) => Threat::StraightPokedTwo,
            (2, true, true) => Threat::BlockedPokedTwo,
            _ => return None,
        };
        Some(threat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_hierarchy() {
        assert!(Threat::Five.weight() > Threat::StraightFour.weight());
        assert!(Threat::StraightFour.weight() > Threat::BlockedFour.weight());
        assert!(Threat::BlockedFour.weight() > Threat::StraightThree.weight());
        assert!(Threat::StraightThree.weight() > Threat::BlockedThree.weight());
        assert!(Threat::BlockedThree.weight() > Threat::StraightTwo.weight());
        assert!(Threat::StraightTwo.weight() > Threat::BlockedTwo.weight());
        assert!(Threat::BlockedTwo.weight() > Threat::BlockedPokedTwo.weight());
        assert_eq!(Threat::None.weight(), 0);
    }

    #[test]
    fn test_five_dominates_every_lesser_sum() {
        // Every cell of a 64x64 board, four axes, a few runs each
        let bound = 64 * 64 * 4 * 4 * Threat::StraightFour.weight();
        assert!(WIN > bound);
    }

    #[test]
    fn test_from_run() {
        assert_eq!(Threat::from_run(5, false, true), Some(Threat::Five));
        assert_eq!(Threat::from_run(6, false, false), Some(Threat::Five));
        assert_eq!(Threat::from_run(5, true, false), None);
        assert_eq!(Threat::from_run(4, true, true), Some(Threat::BlockedPokedFour));
        assert_eq!(Threat::from_run(3, false, false), Some(Threat::StraightThree));
        assert_eq!(Threat::from_run(1, false, false), None);
    }

    #[test]
    fn test_interesting_is_straight_three() {
        assert_eq!(INTERESTING, Threat::StraightThree.weight());
    }
}
