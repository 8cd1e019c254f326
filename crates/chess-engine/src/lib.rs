//! Bitboard chess engine: legal move generation, perft and alpha-beta search.
//!
//! This crate provides:
//! - [`Bitboard`] - 64-bit board representation with efficient operations
//! - [`Position`] - Board state with in-place, reversible move application
//! - Legal move generation using magic bitboards plus check and pin masks
//! - [`perft`] node counting for validating the generator
//! - Fixed-depth negamax search with material evaluation
//!
//! # Architecture
//!
//! The engine uses bitboards for piece representation - each piece type/color
//! combination has a 64-bit integer where each bit represents a square.
//! Attack tables are built once per process and only read afterwards.
//! A single [`Position`] is walked by make/undo during search, never cloned.
//!
//! # Example
//!
//! ```
//! use chess_engine::{find_best_move, generate_moves, Position};
//!
//! let mut position = Position::startpos();
//! let moves = generate_moves(&position);
//! println!("Legal moves from starting position: {}", moves.len());
//!
//! let best = find_best_move(&mut position, 3);
//! assert!(best.is_some());
//! assert_eq!(position.history_len(), 0);
//! ```

mod bitboard;
pub mod movegen;
mod position;
pub mod search;

pub use bitboard::Bitboard;
pub use movegen::perft::{perft, perft_divide};
pub use movegen::{
    between, bishop_attacks, find_move, generate_moves, king_attacks, knight_attacks, line,
    pawn_attacks, queen_attacks, rook_attacks, status, GameStatus, MoveList,
};
pub use position::{CastlingRights, Position, PositionError};
pub use search::{evaluate, find_best_move, SearchResult, Searcher, INFINITY, MATE_SCORE};

/// Builds the sliding attack tables up front instead of on first use.
pub fn init() {
    movegen::magics::init();
}
