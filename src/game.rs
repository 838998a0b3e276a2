//! Game session: turn order, move history and position-changed events
//!
//! Observers subscribe to a channel and receive a [`PositionEvent`] after
//! every accepted move or undo. Sends never block; a disconnected observer
//! is dropped silently.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::board::{Bitboard, Pos, Position, Stone};
use crate::config::SearchParams;
use crate::engine::{Engine, MoveResult, SearchKind};
use crate::error::{GomokuError, Result};
use crate::rules::five_line_at;
use crate::search::TreeSnapshot;

/// Pushed to observers after the position changes.
#[derive(Debug, Clone)]
pub struct PositionEvent {
    /// Full grid, row-major
    pub grid: Vec<Vec<Stone>>,
    pub last_move: Option<(Pos, Stone)>,
    /// Cells currently considered by move generation
    pub active: Bitboard,
    pub winner: Option<Stone>,
    /// Root statistics of the search that produced the move, if any
    pub tree: Option<TreeSnapshot>,
}

/// Game result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Stone,
    pub winning_line: Vec<Pos>,
}

pub struct Game {
    position: Position,
    turn: Stone,
    result: Option<GameResult>,
    subscribers: Vec<Sender<PositionEvent>>,
}

impl Game {
    /// Empty board; black moves first.
    pub fn new(dim: usize) -> Result<Self> {
        Ok(Self {
            position: Position::new(dim)?,
            turn: Stone::Black,
            result: None,
            subscribers: Vec::new(),
        })
    }

    /// Restore a saved game. The side to move follows the last recorded move.
    /// Moves recorded after a five are rejected.
    pub fn from_history(dim: usize, moves: &[(Pos, Stone)]) -> Result<Self> {
        let mut game = Self::new(dim)?;
        for &(pos, stone) in moves {
            if let Some(result) = &game.result {
                return Err(GomokuError::GameOver(result.winner));
            }
            game.position.place(pos, stone)?;
            game.turn = stone.opponent();
            game.result = Self::result_at(&game.position, pos, stone);
        }
        Ok(game)
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn turn(&self) -> Stone {
        self.turn
    }

    #[inline]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn winner(&self) -> Option<Stone> {
        self.result.as_ref().map(|r| r.winner)
    }

    /// Ordered `(cell, color)` list for save/restore.
    pub fn history(&self) -> &[(Pos, Stone)] {
        self.position.history()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some() || self.position.is_full()
    }

    /// Receive an event after every change from now on.
    pub fn subscribe(&mut self) -> Receiver<PositionEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Place a stone for the side to move.
    pub fn play(&mut self, pos: Pos) -> Result<()> {
        self.play_annotated(pos, None)
    }

    /// Ask `engine` for a move, play it, and attach the search tree to the
    /// event.
    pub fn play_engine(
        &mut self,
        engine: &Engine,
        budget: Duration,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<MoveResult> {
        if let Some(result) = &self.result {
            return Err(GomokuError::GameOver(result.winner));
        }
        let result = engine.request_move(&mut self.position, self.turn, budget, kind, params)?;
        self.play_annotated(result.mv.pos, result.tree.clone())?;
        Ok(result)
    }

    /// Search on a worker thread over a copy of the position.
    ///
    /// The answer arrives on the returned channel; apply it with [`Game::play`].
    pub fn think(
        &self,
        engine: &Engine,
        budget: Duration,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Receiver<Result<MoveResult>> {
        let (tx, rx) = channel();
        let engine = engine.clone();
        let mut position = self.position.clone();
        let player = self.turn;
        let params = params.clone();
        thread::spawn(move || {
            let result = engine.request_move(&mut position, player, budget, kind, &params);
            let _ = tx.send(result);
        });
        rx
    }

    /// Take back the last move.
    pub fn undo(&mut self) -> Option<(Pos, Stone)> {
        let undone = self.position.undo()?;
        self.turn = undone.1;
        self.result = None;
        self.notify(None);
        Some(undone)
    }

    fn play_annotated(&mut self, pos: Pos, tree: Option<TreeSnapshot>) -> Result<()> {
        if let Some(result) = &self.result {
            return Err(GomokuError::GameOver(result.winner));
        }
        let color = self.turn;
        self.position.place(pos, color)?;
        self.result = Self::result_at(&self.position, pos, color);
        if let Some(result) = &self.result {
            debug!("{} wins with {} stones in a row", result.winner, result.winning_line.len());
        }
        self.turn = color.opponent();
        self.notify(tree);
        Ok(())
    }

    fn result_at(position: &Position, pos: Pos, color: Stone) -> Option<GameResult> {
        five_line_at(position, pos, color).map(|winning_line| GameResult {
            winner: color,
            winning_line,
        })
    }

    fn notify(&mut self, tree: Option<TreeSnapshot>) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = PositionEvent {
            grid: self.position.grid(),
            last_move: self.position.last_move(),
            active: self.position.active_map(),
            winner: self.winner(),
            tree,
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_alternate() {
        let mut game = Game::new(9).unwrap();
        assert_eq!(game.turn(), Stone::Black);
        game.play(Pos::new(4, 4)).unwrap();
        assert_eq!(game.turn(), Stone::White);
        assert!(matches!(
            game.play(Pos::new(4, 4)),
            Err(GomokuError::Occupied { row: 4, col: 4 })
        ));
        assert_eq!(game.turn(), Stone::White);
    }

    #[test]
    fn test_events_are_pushed() {
        let mut game = Game::new(9).unwrap();
        let rx = game.subscribe();
        game.play(Pos::new(4, 4)).unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.grid[4][4], Stone::Black);
        assert_eq!(event.last_move, Some((Pos::new(4, 4), Stone::Black)));
        assert_eq!(event.active.count(), 24);
        assert!(event.tree.is_none());

        game.undo();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.last_move, None);
        assert_eq!(game.turn(), Stone::Black);
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let mut game = Game::new(9).unwrap();
        drop(game.subscribe());
        let rx = game.subscribe();
        game.play(Pos::new(1, 1)).unwrap();
        assert_eq!(game.subscribers.len(), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_five_ends_the_game() {
        let mut game = Game::new(9).unwrap();
        for c in 0..4 {
            game.play(Pos::new(0, c)).unwrap();
            game.play(Pos::new(8, c)).unwrap();
        }
        game.play(Pos::new(0, 4)).unwrap();
        assert_eq!(game.winner(), Some(Stone::Black));
        assert_eq!(game.result().map(|r| r.winning_line.len()), Some(5));
        assert!(game.is_over());
        assert!(matches!(game.play(Pos::new(5, 5)), Err(GomokuError::GameOver(Stone::Black))));

        game.undo();
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_history_roundtrip() {
        let mut game = Game::new(9).unwrap();
        for pos in [Pos::new(4, 4), Pos::new(4, 5), Pos::new(3, 3)] {
            game.play(pos).unwrap();
        }
        let restored = Game::from_history(9, game.history()).unwrap();
        assert_eq!(restored.position(), game.position());
        assert_eq!(restored.turn(), Stone::White);
    }

    #[test]
    fn test_history_stops_at_five() {
        let mut moves = Vec::new();
        for c in 0..5u8 {
            moves.push((Pos::new(0, c), Stone::Black));
            if c < 4 {
                moves.push((Pos::new(8, c), Stone::White));
            }
        }
        let finished = Game::from_history(9, &moves).unwrap();
        assert_eq!(finished.winner(), Some(Stone::Black));

        moves.push((Pos::new(8, 4), Stone::White));
        let err = Game::from_history(9, &moves);
        assert!(matches!(err, Err(GomokuError::GameOver(Stone::Black))));
    }

    #[test]
    fn test_engine_move_carries_tree() {
        let engine = Engine::new();
        let mut game = Game::new(9).unwrap();
        let rx = game.subscribe();
        game.play(Pos::new(4, 4)).unwrap();
        let params = SearchParams::default().with_max_iterations(20).with_seed(1);
        let result = game
            .play_engine(&engine, Duration::from_secs(10), SearchKind::MonteCarlo, &params)
            .unwrap();
        assert_eq!(game.position().get(result.mv.pos), Stone::White);
        let _ = rx.try_recv().unwrap();
        assert!(rx.try_recv().unwrap().tree.is_some());
    }

    #[test]
    fn test_think_on_worker_thread() {
        let engine = Engine::new();
        let mut game = Game::new(9).unwrap();
        game.play(Pos::new(4, 4)).unwrap();
        let rx = game.think(&engine, Duration::from_millis(200), SearchKind::Basic, &SearchParams::default());
        let result = rx.recv().unwrap().unwrap();
        game.play(result.mv.pos).unwrap();
        assert_eq!(game.history().len(), 2);
    }
}
