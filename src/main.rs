//! Gomoku move engine command line
//!
//! `gomoku move` answers one move request for a position given as a move
//! list; `gomoku selfplay` lets two search kinds play each other.

use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use gomoku::board::{Pos, Position, Stone};
use gomoku::eval::INTERESTING;
use gomoku::search::EqualityMode;
use gomoku::{Engine, EngineConfig, Game, SearchKind, SearchParams};

/// Gomoku move selection with alpha-beta and Monte Carlo search.
#[derive(Parser)]
#[command(name = "gomoku")]
#[command(about = "Pick Gomoku moves or watch two searches play each other")]
struct Cli {
    /// Log verbosity: -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Confirm cache hits by hash alone instead of comparing positions.
    #[arg(long, env = "GOMOKU_HASH_ONLY", global = true)]
    hash_only: bool,

    /// Entries per cache before it is flushed.
    #[arg(long, env = "GOMOKU_CACHE_CAPACITY", default_value_t = 1 << 20, global = true)]
    cache_capacity: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose one move for a position.
    Move {
        /// Board dimension.
        #[arg(short, long, env = "GOMOKU_SIZE", default_value_t = 15)]
        size: usize,

        /// Moves played so far as row,col; black moves first.
        moves: Vec<Pos>,

        /// Side to move; follows the move list when omitted.
        #[arg(short, long)]
        player: Option<Color>,

        /// Search algorithm.
        #[arg(short, long, env = "GOMOKU_KIND", default_value = "alpha-beta")]
        kind: SearchKind,

        /// Time budget in milliseconds.
        #[arg(short, long, env = "GOMOKU_TIME_MS", default_value_t = 1000)]
        time_ms: u64,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Play a full game between two search kinds.
    Selfplay {
        /// Board dimension.
        #[arg(short, long, env = "GOMOKU_SIZE", default_value_t = 15)]
        size: usize,

        /// Search kind playing black.
        #[arg(long, default_value = "alpha-beta")]
        black: SearchKind,

        /// Search kind playing white.
        #[arg(long, default_value = "monte-carlo")]
        white: SearchKind,

        /// Time budget per move in milliseconds.
        #[arg(short, long, env = "GOMOKU_TIME_MS", default_value_t = 500)]
        time_ms: u64,

        /// Stop after this many moves.
        #[arg(long, default_value_t = 225)]
        max_moves: usize,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Color {
    Black,
    White,
}

impl From<Color> for Stone {
    fn from(c: Color) -> Stone {
        match c {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }
}

#[derive(Args)]
struct SearchArgs {
    /// Alpha-beta depth in plies.
    #[arg(long, env = "GOMOKU_DEPTH", default_value_t = 4)]
    depth: usize,

    /// Candidates per alpha-beta node.
    #[arg(long, env = "GOMOKU_BREADTH", default_value_t = 8)]
    breadth: usize,

    /// Add small noise to alpha-beta values so repeated games differ.
    #[arg(long, env = "GOMOKU_RANDOMIZED_SELECTION")]
    randomized_selection: bool,

    /// Horizon rollout chance in percent.
    #[arg(long, env = "GOMOKU_ROLLOUT_PROBABILITY", default_value_t = 10,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    rollout_probability: u8,

    /// Threat weight that makes a leaf worth a rollout.
    #[arg(long, env = "GOMOKU_ROLLOUT_THRESHOLD", default_value_t = INTERESTING)]
    rollout_threshold: i64,

    /// Plies searched by a horizon rollout.
    #[arg(long, env = "GOMOKU_ROLLOUT_DEPTH", default_value_t = 10)]
    rollout_depth: usize,

    /// Children per Monte Carlo node.
    #[arg(long, env = "GOMOKU_MC_BREADTH", default_value_t = 10)]
    mc_breadth: usize,

    /// Plies per Monte Carlo playout.
    #[arg(long, env = "GOMOKU_MC_SIMULATION_DEPTH", default_value_t = 5)]
    mc_simulation_depth: usize,

    /// Shuffle candidates before Monte Carlo expansion.
    #[arg(long, env = "GOMOKU_MC_RANDOM_EXPANSION")]
    mc_random_expansion: bool,

    /// Monte Carlo iteration cap.
    #[arg(long, env = "GOMOKU_MAX_ITERATIONS")]
    max_iterations: Option<u64>,

    /// Seed for reproducible runs.
    #[arg(long, env = "GOMOKU_SEED")]
    seed: Option<u64>,
}

impl SearchArgs {
    fn params(&self) -> SearchParams {
        SearchParams {
            depth: self.depth,
            breadth: self.breadth,
            randomized_selection: self.randomized_selection,
            rollout_probability: self.rollout_probability,
            rollout_threshold: self.rollout_threshold,
            rollout_depth: self.rollout_depth,
            mc_breadth: self.mc_breadth,
            mc_simulation_depth: self.mc_simulation_depth,
            mc_random_expansion: self.mc_random_expansion,
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }
}

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("Failed to install logger")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let engine = Engine::with_config(EngineConfig {
        equality: if cli.hash_only {
            EqualityMode::HashOnly
        } else {
            EqualityMode::Exact
        },
        cache_capacity: cli.cache_capacity,
    });

    match cli.command {
        Commands::Move {
            size,
            moves,
            player,
            kind,
            time_ms,
            search,
        } => run_move(&engine, size, &moves, player, kind, time_ms, &search.params()),
        Commands::Selfplay {
            size,
            black,
            white,
            time_ms,
            max_moves,
            search,
        } => run_selfplay(&engine, size, black, white, time_ms, max_moves, &search.params()),
    }
}

fn run_move(
    engine: &Engine,
    size: usize,
    moves: &[Pos],
    player: Option<Color>,
    kind: SearchKind,
    time_ms: u64,
    params: &SearchParams,
) -> Result<()> {
    let history: Vec<(Pos, Stone)> = moves
        .iter()
        .enumerate()
        .map(|(i, &pos)| (pos, if i % 2 == 0 { Stone::Black } else { Stone::White }))
        .collect();
    let mut position = Position::from_history(size, &history).context("Invalid move list")?;
    let player = player.map_or(
        if history.len() % 2 == 0 { Stone::Black } else { Stone::White },
        Stone::from,
    );

    let result = engine
        .request_move(&mut position, player, Duration::from_millis(time_ms), kind, params)
        .context("Move request failed")?;
    info!(
        "{} searched {} nodes in {}ms",
        result.kind, result.stats.nodes, result.time_ms
    );
    if let Some(tree) = &result.tree {
        for child in &tree.children {
            info!("  {}: {}/{}", child.pos, child.wins, child.visits);
        }
    }

    position.place(result.mv.pos, player)?;
    print!("{position}");
    println!("{} {} (score {})", player, result.mv.pos, result.mv.score);
    Ok(())
}

fn run_selfplay(
    engine: &Engine,
    size: usize,
    black: SearchKind,
    white: SearchKind,
    time_ms: u64,
    max_moves: usize,
    params: &SearchParams,
) -> Result<()> {
    if max_moves == 0 {
        bail!("max-moves must be positive");
    }
    let mut game = Game::new(size).context("Invalid board size")?;
    let budget = Duration::from_millis(time_ms);

    while !game.is_over() && game.history().len() < max_moves {
        let kind = if game.turn() == Stone::Black { black } else { white };
        let result = game.play_engine(engine, budget, kind, params)?;
        println!(
            "{:>3}. {} {} {} ({}ms)",
            game.history().len(),
            kind,
            game.turn().opponent(),
            result.mv.pos,
            result.time_ms
        );
    }

    print!("{}", game.position());
    match game.winner() {
        Some(winner) => {
            let kind = if winner == Stone::Black { black } else { white };
            println!("{winner} ({kind}) wins after {} moves", game.history().len());
        }
        None => println!("No winner after {} moves", game.history().len()),
    }
    let stats = engine.cache_stats();
    info!(
        "heuristic cache: {} entries, {:.1}% hit",
        stats.heuristics.entries,
        stats.heuristics.hit_percent()
    );
    Ok(())
}
