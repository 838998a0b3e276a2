//! Position evaluation: threat taxonomy, line classification and heuristics

pub mod heuristic;
pub mod patterns;
pub mod threat;

pub use heuristic::{score_for, Heuristic};
pub use patterns::{Threat, INTERESTING, WIN};
pub use threat::{Line, LineKey, ThreatEvaluator};
