//! Chess position representation with reversible move application.
//!
//! A [`Position`] is mutated only through [`Position::make_move`] and
//! [`Position::undo_move`]. Every applied move pushes an [`UndoRecord`]
//! holding exactly what the move itself cannot tell us, so undo restores the
//! previous state bit for bit without cloning the board.

use chess_core::{Color, Fen, FenError, File, Move, Piece, Square};
use std::fmt;
use thiserror::Error;

use crate::movegen::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::Bitboard;

/// Errors raised by position mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("cannot undo: no moves have been applied")]
    EmptyHistory,
}

/// Castling rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// Creates new castling rights from flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        CastlingRights(flags & 0b1111)
    }

    const fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    const fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if the given side can castle kingside.
    #[inline]
    pub const fn can_castle_kingside(self, color: Color) -> bool {
        (self.0 & Self::kingside_flag(color)) != 0
    }

    /// Returns true if the given side can castle queenside.
    #[inline]
    pub const fn can_castle_queenside(self, color: Color) -> bool {
        (self.0 & Self::queenside_flag(color)) != 0
    }

    /// Removes castling rights for a color.
    #[inline]
    pub fn remove_color(&mut self, color: Color) {
        self.0 &= !(Self::kingside_flag(color) | Self::queenside_flag(color));
    }

    /// Removes kingside castling for a color.
    #[inline]
    pub fn remove_kingside(&mut self, color: Color) {
        self.0 &= !Self::kingside_flag(color);
    }

    /// Removes queenside castling for a color.
    #[inline]
    pub fn remove_queenside(&mut self, color: Color) {
        self.0 &= !Self::queenside_flag(color);
    }

    /// Removes the right tied to a rook home square, if `sq` is one.
    pub fn remove_rook_square(&mut self, sq: Square) {
        match sq {
            Square::H1 => self.remove_kingside(Color::White),
            Square::A1 => self.remove_queenside(Color::White),
            Square::H8 => self.remove_kingside(Color::Black),
            Square::A8 => self.remove_queenside(Color::Black),
            _ => {}
        }
    }

    /// Returns the raw flags.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Parses the FEN castling letters (`KQkq` subset, empty for none).
    pub fn from_fen_letters(letters: &str) -> Self {
        let flags = letters.chars().fold(0u8, |acc, c| {
            acc | match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                _ => 0,
            }
        });
        CastlingRights::new(flags)
    }

    /// The FEN castling letters in `KQkq` order, empty for none.
    pub fn to_fen_letters(self) -> String {
        [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ]
        .iter()
        .filter(|(flag, _)| self.0 & flag != 0)
        .map(|&(_, c)| c)
        .collect()
    }
}

/// State a move destroys and cannot recompute on undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UndoRecord {
    mv: Move,
    captured: Option<Piece>,
    en_passant: Option<Square>,
    castling: CastlingRights,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// Complete chess position state.
///
/// Two positions compare equal only if their boards, counters and undo
/// histories all match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Bitboards for each piece type, indexed by Piece enum.
    pieces: [Bitboard; 6],
    /// Bitboards for each color's pieces.
    colors: [Bitboard; 2],
    side_to_move: Color,
    castling: CastlingRights,
    /// En passant target square (if any).
    en_passant: Option<Square>,
    /// Halfmove clock for 50-move rule.
    halfmove_clock: u32,
    /// Fullmove number (starts at 1, increments after Black's move).
    fullmove_number: u32,
    history: Vec<UndoRecord>,
}

impl Position {
    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        match Fen::parse(Fen::STARTPOS) {
            Ok(fen) => Self::from(&fen),
            Err(_) => unreachable!("the starting position FEN is valid"),
        }
    }

    /// Creates a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Fen::parse(fen).map(|parsed| Self::from(&parsed))
    }

    /// Returns the FEN record for the current state.
    pub fn fen(&self) -> Fen {
        let mut board = [None; 64];
        for sq in Square::all() {
            board[sq.index() as usize] = self.piece_at(sq);
        }
        Fen {
            board,
            side_to_move: self.side_to_move,
            castling: self.castling.to_fen_letters(),
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }

    /// Converts the position to a FEN string.
    pub fn to_fen(&self) -> String {
        self.fen().to_string()
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves that can currently be undone.
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Returns the piece and color at the given square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        let color = Color::BOTH
            .into_iter()
            .find(|color| self.colors[color.index()].contains(sq))?;
        self.piece_kind_at(sq).map(|piece| (piece, color))
    }

    /// Returns the kind of piece on the given square, if any.
    #[inline]
    pub fn piece_kind_at(&self, sq: Square) -> Option<Piece> {
        Piece::ALL
            .into_iter()
            .find(|piece| self.pieces[piece.index()].contains(sq))
    }

    /// Returns a bitboard of all occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    /// Returns a bitboard of the given color's pieces.
    #[inline]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Returns a bitboard of every piece of the given type.
    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    /// Returns a bitboard of pieces of the given type and color.
    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.pieces[piece.index()] & self.colors[color.index()]
    }

    /// Returns the king square of the given color.
    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(Piece::King, color).lsb()
    }

    /// Pieces of color `by` attacking `sq`, with sliders blocked by `occupied`.
    pub fn attackers_to(&self, sq: Square, by: Color, occupied: Bitboard) -> Bitboard {
        let diagonal = self.pieces_of(Piece::Bishop, by) | self.pieces_of(Piece::Queen, by);
        let straight = self.pieces_of(Piece::Rook, by) | self.pieces_of(Piece::Queen, by);

        (pawn_attacks(sq, by.opposite()) & self.pieces_of(Piece::Pawn, by))
            | (knight_attacks(sq) & self.pieces_of(Piece::Knight, by))
            | (king_attacks(sq) & self.pieces_of(Piece::King, by))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
    }

    /// Returns true if the given square is attacked by the given color.
    #[inline]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        self.attackers_to(sq, by, self.occupied()).is_not_empty()
    }

    /// Enemy pieces giving check to the side to move.
    ///
    /// The king is left out of the occupancy so a slider's ray continues
    /// through the king's square.
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        match self.king_square(us) {
            Some(king) => {
                let occupied = self.occupied() & !Bitboard::from_square(king);
                self.attackers_to(king, us.opposite(), occupied)
            }
            None => Bitboard::EMPTY,
        }
    }

    /// Returns true if the side to move is in check.
    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.checkers().is_not_empty()
    }

    /// Checks that piece and color sets agree and never overlap.
    pub fn is_consistent(&self) -> bool {
        let mut union = Bitboard::EMPTY;
        for piece in self.pieces {
            if (union & piece).is_not_empty() {
                return false;
            }
            union |= piece;
        }
        (self.colors[0] & self.colors[1]).is_empty() && union == self.occupied()
    }

    #[inline]
    fn toggle(&mut self, piece: Piece, color: Color, sq: Square) {
        self.pieces[piece.index()].toggle(sq);
        self.colors[color.index()].toggle(sq);
    }

    /// Applies a legal move in place.
    ///
    /// The move must come from the move generator for this exact position.
    pub fn make_move(&mut self, m: Move) {
        let us = self.side_to_move;
        let them = us.opposite();
        let (from, to, piece) = (m.from(), m.to(), m.piece());

        let is_en_passant = is_en_passant_capture(m, self.en_passant);
        let captured = if is_en_passant {
            Some(Piece::Pawn)
        } else {
            self.piece_kind_at(to)
        };
        debug_assert_eq!(captured, m.captured(), "capture mismatch for {:?}", m);

        self.history.push(UndoRecord {
            mv: m,
            captured,
            en_passant: self.en_passant,
            castling: self.castling,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });

        if let Some(kind) = captured {
            let victim = if is_en_passant {
                Square::new(to.file(), from.rank())
            } else {
                to
            };
            self.toggle(kind, them, victim);
        }

        self.toggle(piece, us, from);
        self.toggle(m.promotion().unwrap_or(piece), us, to);

        if m.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            self.toggle(Piece::Rook, us, rook_from);
            self.toggle(Piece::Rook, us, rook_to);
        }

        self.en_passant = if piece == Piece::Pawn && from.index().abs_diff(to.index()) == 16 {
            from.offset(us.pawn_push())
        } else {
            None
        };

        if piece == Piece::King {
            self.castling.remove_color(us);
        }
        if piece == Piece::Rook {
            self.castling.remove_rook_square(from);
        }
        self.castling.remove_rook_square(to);

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
    }

    /// Reverts the most recent move, returning it.
    pub fn try_undo_move(&mut self) -> Result<Move, PositionError> {
        let record = self.history.pop().ok_or(PositionError::EmptyHistory)?;
        let m = record.mv;
        let them = self.side_to_move;
        let us = them.opposite();
        let (from, to, piece) = (m.from(), m.to(), m.piece());

        self.side_to_move = us;
        self.fullmove_number = record.fullmove_number;
        self.halfmove_clock = record.halfmove_clock;
        self.castling = record.castling;
        self.en_passant = record.en_passant;

        if m.is_castling() {
            let (rook_from, rook_to) = castling_rook_squares(to);
            self.toggle(Piece::Rook, us, rook_to);
            self.toggle(Piece::Rook, us, rook_from);
        }

        self.toggle(m.promotion().unwrap_or(piece), us, to);
        self.toggle(piece, us, from);

        if let Some(kind) = record.captured {
            let victim = if is_en_passant_capture(m, record.en_passant) {
                Square::new(to.file(), from.rank())
            } else {
                to
            };
            self.toggle(kind, them, victim);
        }

        Ok(m)
    }

    /// Reverts the most recent move.
    ///
    /// # Panics
    /// Panics if no move has been applied. Undoing past the start of the
    /// history is a caller bug, not a recoverable condition.
    pub fn undo_move(&mut self) -> Move {
        match self.try_undo_move() {
            Ok(m) => m,
            Err(err) => panic!("{}", err),
        }
    }
}

/// A pawn moving diagonally onto the en-passant target. A straight push
/// onto the same square is an ordinary move.
fn is_en_passant_capture(m: Move, en_passant: Option<Square>) -> bool {
    m.piece() == Piece::Pawn && Some(m.to()) == en_passant && m.from().file() != m.to().file()
}

/// Rook origin and destination for a castling king landing on `king_to`.
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    if king_to.file() == File::G {
        (Square::new(File::H, rank), Square::new(File::F, rank))
    } else {
        (Square::new(File::A, rank), Square::new(File::D, rank))
    }
}

impl From<&Fen> for Position {
    fn from(fen: &Fen) -> Self {
        let mut position = Position {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            side_to_move: fen.side_to_move,
            castling: CastlingRights::from_fen_letters(&fen.castling),
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
            fullmove_number: fen.fullmove_number,
            history: Vec::new(),
        };
        for (sq, slot) in Square::all().zip(fen.board.iter()) {
            if let Some((piece, color)) = *slot {
                position.toggle(piece, color, sq);
            }
        }
        position
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = Square::from_index(rank * 8 + file)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or('.', |(piece, color)| piece.to_fen_char(color));
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")?;
        write!(f, "Fen: {}", self.to_fen())
    }
}
