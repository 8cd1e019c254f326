//! Leaper attack tables (king, knight, pawn) and the sliding-piece lookups.
//!
//! Leaper masks are built at compile time by shifting a single-bit board.
//! Any shift that would carry a bit across the A/H edge has its source file
//! masked out first.

use crate::Bitboard;
use chess_core::{Color, Square};

pub use super::magics::{bishop_attacks, queen_attacks, rook_attacks};

const NOT_A: u64 = !Bitboard::FILE_A.0;
const NOT_B: u64 = !Bitboard::FILE_B.0;
const NOT_G: u64 = !Bitboard::FILE_G.0;
const NOT_H: u64 = !Bitboard::FILE_H.0;
const NOT_AB: u64 = NOT_A & NOT_B;
const NOT_GH: u64 = NOT_G & NOT_H;

#[derive(Clone, Copy)]
enum Leaper {
    Knight,
    King,
    WhitePawn,
    BlackPawn,
}

const KNIGHT_ATTACKS: [Bitboard; 64] = build_table(Leaper::Knight);
const KING_ATTACKS: [Bitboard; 64] = build_table(Leaper::King);
const PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    build_table(Leaper::WhitePawn),
    build_table(Leaper::BlackPawn),
];

/// Returns knight attacks from the given square.
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index() as usize]
}

/// Returns king attacks from the given square.
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index() as usize]
}

/// Returns the squares a pawn of `color` on `sq` captures on.
#[inline]
pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index() as usize]
}

/// Returns every square attacked by the given pawns at once.
#[inline]
pub fn pawn_attacks_all(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => pawns.north_east() | pawns.north_west(),
        Color::Black => pawns.south_east() | pawns.south_west(),
    }
}

const fn build_table(leaper: Leaper) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let b = 1u64 << sq;
        let mask = match leaper {
            Leaper::Knight => knight_mask(b),
            Leaper::King => king_mask(b),
            Leaper::WhitePawn => white_pawn_mask(b),
            Leaper::BlackPawn => black_pawn_mask(b),
        };
        table[sq] = Bitboard(mask);
        sq += 1;
    }
    table
}

const fn knight_mask(b: u64) -> u64 {
    ((b & NOT_H) << 17)
        | ((b & NOT_A) << 15)
        | ((b & NOT_GH) << 10)
        | ((b & NOT_AB) << 6)
        | ((b & NOT_A) >> 17)
        | ((b & NOT_H) >> 15)
        | ((b & NOT_AB) >> 10)
        | ((b & NOT_GH) >> 6)
}

const fn king_mask(b: u64) -> u64 {
    (b << 8)
        | (b >> 8)
        | ((b & NOT_H) << 1)
        | ((b & NOT_A) >> 1)
        | ((b & NOT_H) << 9)
        | ((b & NOT_A) << 7)
        | ((b & NOT_H) >> 7)
        | ((b & NOT_A) >> 9)
}

const fn white_pawn_mask(b: u64) -> u64 {
    ((b & NOT_A) << 7) | ((b & NOT_H) << 9)
}

const fn black_pawn_mask(b: u64) -> u64 {
    ((b & NOT_A) >> 9) | ((b & NOT_H) >> 7)
}
