//! Win condition checking
//!
//! Five or more stones of one color in an unbroken line wins. These checks
//! read the board directly; search uses the threat heuristic instead, which
//! agrees with them on every five.

use crate::board::{Pos, Position, Stone, DIRECTIONS};

/// Stones of `color` in a row through `pos` along `(dr, dc)`, `pos` included
/// whether or not it holds `color`.
fn run_through(position: &Position, pos: Pos, color: Stone, dr: i32, dc: i32) -> Vec<Pos> {
    let dim = position.dim();
    let mut line = vec![pos];

    // Extend in negative direction first
    let mut k = 1;
    while let Some(prev) = pos.offset(dr, dc, -k, dim) {
        if position.get(prev) != color {
            break;
        }
        line.insert(0, prev);
        k += 1;
    }

    // Extend in positive direction
    let mut k = 1;
    while let Some(next) = pos.offset(dr, dc, k, dim) {
        if position.get(next) != color {
            break;
        }
        line.push(next);
        k += 1;
    }
    line
}

/// The winning line through `pos`, if `pos` holds `color` and completes one.
pub fn five_line_at(position: &Position, pos: Pos, color: Stone) -> Option<Vec<Pos>> {
    if !color.is_player() || position.get(pos) != color {
        return None;
    }
    DIRECTIONS
        .iter()
        .map(|&(dr, dc)| run_through(position, pos, color, dr, dc))
        .find(|line| line.len() >= 5)
}

/// Check for a winner
///
/// Returns the color holding a five anywhere on the board. Black is
/// reported first if, against the rules, both colors do.
pub fn find_winner(position: &Position) -> Option<Stone> {
    [Stone::Black, Stone::White].into_iter().find(|&color| {
        position
            .stones(color)
            .iter_ones()
            .any(|pos| five_line_at(position, pos, color).is_some())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(stones: &[(u8, u8, Stone)]) -> Position {
        let mut p = Position::new(15).unwrap();
        for &(r, c, s) in stones {
            p.place(Pos::new(r, c), s).unwrap();
        }
        p
    }

    #[test]
    fn test_five_in_row_horizontal() {
        let stones: Vec<_> = (0..5).map(|i| (9, i, Stone::Black)).collect();
        let p = with(&stones);
        assert_eq!(find_winner(&p), Some(Stone::Black));
        assert_eq!(five_line_at(&p, Pos::new(9, 0), Stone::Black).map(|l| l.len()), Some(5));
        assert_eq!(five_line_at(&p, Pos::new(9, 0), Stone::White), None);
    }

    #[test]
    fn test_five_in_row_vertical() {
        let stones: Vec<_> = (0..5).map(|i| (i, 9, Stone::White)).collect();
        assert_eq!(find_winner(&with(&stones)), Some(Stone::White));
    }

    #[test]
    fn test_five_in_row_diagonals() {
        let se: Vec<_> = (0..5).map(|i| (i, i, Stone::White)).collect();
        assert_eq!(find_winner(&with(&se)), Some(Stone::White));
        let sw: Vec<_> = (0..5).map(|i| (i, 14 - i, Stone::Black)).collect();
        assert_eq!(find_winner(&with(&sw)), Some(Stone::Black));
    }

    #[test]
    fn test_six_in_row_also_wins() {
        let stones: Vec<_> = (0..6).map(|i| (9, i, Stone::Black)).collect();
        let p = with(&stones);
        assert_eq!(five_line_at(&p, Pos::new(9, 2), Stone::Black).map(|l| l.len()), Some(6));
    }

    #[test]
    fn test_four_in_row_not_win() {
        let stones: Vec<_> = (0..4).map(|i| (9, i, Stone::Black)).collect();
        let p = with(&stones);
        assert_eq!(find_winner(&p), None);
        assert_eq!(five_line_at(&p, Pos::new(9, 3), Stone::Black), None);
        assert_eq!(five_line_at(&p, Pos::new(9, 4), Stone::Black), None);
    }

    #[test]
    fn test_gap_breaks_line() {
        let p = with(&[
            (3, 3, Stone::Black),
            (3, 4, Stone::Black),
            (3, 6, Stone::Black),
            (3, 7, Stone::Black),
            (3, 8, Stone::Black),
            (3, 5, Stone::White),
        ]);
        assert_eq!(find_winner(&p), None);
    }
}
