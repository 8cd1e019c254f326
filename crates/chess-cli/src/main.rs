//! Command-line front end for the chess engine.
//!
//! Runs perft, lists legal moves, searches for the best move, prints a
//! board, or regenerates the magic multiplier tables.

mod config;

use anyhow::{bail, Context};
use chess_core::Square;
use chess_engine::movegen::magics::{find_magic, MagicRng, Slider};
use chess_engine::{
    find_move, generate_moves, perft, perft_divide, status, GameStatus, Position, Searcher,
};
use clap::{Parser, Subcommand};
use config::ChessConfig;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Chess engine command-line tool.
#[derive(Parser)]
#[command(name = "chess")]
#[command(about = "Legal move generation, perft and search for chess positions")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count leaf nodes to a fixed depth
    Perft {
        /// Depth in plies (defaults to the configured perft depth)
        #[arg(short, long)]
        depth: Option<u32>,
        /// Position in FEN (defaults to the configured position)
        #[arg(long)]
        fen: Option<String>,
    },
    /// Perft split by root move
    Divide {
        #[arg(short, long)]
        depth: Option<u32>,
        #[arg(long)]
        fen: Option<String>,
    },
    /// List the legal moves of a position
    Moves {
        #[arg(long)]
        fen: Option<String>,
        /// Moves to play first, in long algebraic notation
        moves: Vec<String>,
    },
    /// Search for the best move
    Best {
        /// Search depth in plies (defaults to the configured search depth)
        #[arg(short, long)]
        depth: Option<u32>,
        #[arg(long)]
        fen: Option<String>,
        /// Moves to play first, in long algebraic notation
        moves: Vec<String>,
    },
    /// Print the board after playing some moves
    Show {
        #[arg(long)]
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Search for fresh magic multipliers and print them as Rust tables
    Magics {
        /// Seed for the candidate generator
        #[arg(long, default_value_t = 0x9E37_79B9_7F4A_7C15)]
        seed: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds a position from FEN and plays the given moves on it.
fn setup_position(fen: &str, moves: &[String]) -> anyhow::Result<Position> {
    let mut position =
        Position::from_fen(fen).with_context(|| format!("invalid FEN: {}", fen))?;
    for uci in moves {
        match find_move(&position, uci) {
            Some(m) => position.make_move(m),
            None => bail!("illegal move {} in position {}", uci, position.to_fen()),
        }
    }
    Ok(position)
}

fn run_perft(position: &mut Position, depth: u32) {
    tracing::info!(depth, fen = %position.to_fen(), "running perft");
    let start = Instant::now();
    let nodes = perft(position, depth);
    let elapsed = start.elapsed();
    let nps = nodes as f64 / elapsed.as_secs_f64().max(1e-9);
    println!("Nodes: {}", nodes);
    println!("Time: {:.3}s ({:.0} nodes/s)", elapsed.as_secs_f64(), nps);
}

fn run_divide(position: &mut Position, depth: u32) {
    let results = perft_divide(position, depth);
    for (uci, nodes) in &results {
        println!("{}: {}", uci, nodes);
    }
    let total: u64 = results.iter().map(|(_, n)| n).sum();
    println!();
    println!("Moves: {}", results.len());
    println!("Nodes: {}", total);
}

fn run_moves(position: &Position) {
    let moves = generate_moves(position);
    let mut names: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
    names.sort();
    println!("{} legal moves: {}", names.len(), names.join(" "));
    report_status(position);
}

fn run_best(position: &mut Position, depth: u32) {
    let start = Instant::now();
    let result = Searcher::new().search(position, depth);
    tracing::info!(
        depth,
        nodes = result.nodes,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search finished"
    );
    match result.best_move {
        Some(m) => println!("bestmove {} (score {})", m, result.score),
        None => report_status(position),
    }
}

fn report_status(position: &Position) {
    match status(position) {
        GameStatus::Ongoing => {}
        GameStatus::Checkmate => println!("Checkmate: {} is mated", position.side_to_move()),
        GameStatus::Stalemate => println!("Stalemate"),
    }
}

fn run_magics(seed: u64) {
    let mut rng = MagicRng::new(seed);
    for (name, slider) in [("ROOK", Slider::Rook), ("BISHOP", Slider::Bishop)] {
        let start = Instant::now();
        println!("const {}_MAGICS: [u64; 64] = [", name);
        for sq in Square::all() {
            println!("    {:#018x},", find_magic(slider, sq, &mut rng));
        }
        println!("];");
        tracing::info!(?slider, elapsed_ms = start.elapsed().as_millis() as u64, "magics found");
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ChessConfig::load_from(path)?,
        None => ChessConfig::load()?,
    };
    tracing::debug!(?config, "loaded configuration");
    chess_engine::init();

    match cli.command {
        Commands::Perft { depth, fen } => {
            let mut position = setup_position(fen.as_deref().unwrap_or(&config.fen), &[])?;
            run_perft(&mut position, depth.unwrap_or(config.perft.depth));
        }
        Commands::Divide { depth, fen } => {
            let mut position = setup_position(fen.as_deref().unwrap_or(&config.fen), &[])?;
            run_divide(&mut position, depth.unwrap_or(config.perft.depth));
        }
        Commands::Moves { fen, moves } => {
            let position = setup_position(fen.as_deref().unwrap_or(&config.fen), &moves)?;
            run_moves(&position);
        }
        Commands::Best { depth, fen, moves } => {
            let mut position = setup_position(fen.as_deref().unwrap_or(&config.fen), &moves)?;
            run_best(&mut position, depth.unwrap_or(config.search.depth));
        }
        Commands::Show { fen, moves } => {
            let position = setup_position(fen.as_deref().unwrap_or(&config.fen), &moves)?;
            println!("{}", position);
            report_status(&position);
        }
        Commands::Magics { seed } => run_magics(seed),
    }

    Ok(())
}
