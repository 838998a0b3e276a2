//! Game rules for freestyle Gomoku
//!
//! Five or more in a row wins; there are no captures and no forbidden moves.

pub mod win;

pub use win::{find_winner, five_line_at};
