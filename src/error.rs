use thiserror::Error;

/// Errors reported by the engine to its callers.
///
/// Search-internal conditions (no candidates, timeouts, hash collisions) are
/// resolved locally and never show up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GomokuError {
    #[error("coordinate ({row}, {col}) is outside a {dim}x{dim} board")]
    OutOfBounds { row: i32, col: i32, dim: usize },

    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: u8, col: u8 },

    #[error("cell ({row}, {col}) is empty")]
    Vacant { row: u8, col: u8 },

    #[error("unsupported board dimension: {0}")]
    InvalidDimension(usize),

    #[error("an empty stone cannot act as a player")]
    NotAPlayer,

    #[error("no empty cell left on the board")]
    BoardFull,

    #[error("cannot parse coordinate: {0}")]
    ParsePos(String),

    #[error("the game is over, {0} has won")]
    GameOver(crate::board::Stone),

    #[error("unknown search kind: {0}")]
    UnknownSearchKind(String),
}

/// Convenience Result type for engine operations
pub type Result<T> = std::result::Result<T, GomokuError>;
