//! Gomoku move selection engine
//!
//! Freestyle Gomoku on square boards from 5x5 to 64x64: five or more in a
//! row wins. The engine picks moves with one of four searches:
//! - A one-ply greedy policy
//! - Fixed-depth alpha-beta
//! - Alpha-beta with random rollouts past the horizon
//! - Monte Carlo tree search with UCB1
//!
//! # Architecture
//!
//! - [`board`]: Positions with bitboards, incremental Zobrist hashing and
//!   active-cell tracking
//! - [`eval`]: Line threat classification and the position heuristic
//! - [`search`]: Caches, candidate generation and the search strategies
//! - [`rules`]: Win detection on the board itself
//! - [`engine`]: Move requests over shared caches
//! - [`game`]: A game session that notifies observers after each move
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use gomoku::{Engine, Game, SearchKind, SearchParams};
//! use gomoku::board::Pos;
//!
//! let engine = Engine::new();
//! let mut game = Game::new(15).unwrap();
//! game.play(Pos::new(7, 7)).unwrap();
//!
//! // Engine answers as white
//! let params = SearchParams::default().with_depth(2);
//! let result = game
//!     .play_engine(&engine, Duration::from_millis(300), SearchKind::AlphaBeta, &params)
//!     .unwrap();
//! println!("White plays {}", result.mv.pos);
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod game;
pub mod rules;
pub mod search;

// Re-export commonly used types for convenience
pub use board::{Move, Pos, Position, Stone};
pub use config::{EngineConfig, SearchParams};
pub use engine::{Engine, MoveResult, SearchKind};
pub use error::{GomokuError, Result};
pub use game::{Game, GameResult, PositionEvent};
