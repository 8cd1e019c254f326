//! Move representation.

use crate::{Piece, Square};
use std::fmt;

const SQUARE_MASK: u32 = 0x3F;
const KIND_MASK: u32 = 0x7;
const TO_SHIFT: u32 = 6;
const PIECE_SHIFT: u32 = 12;
const CAPTURED_SHIFT: u32 = 15;
const PROMOTION_SHIFT: u32 = 18;

/// A chess move.
///
/// Carries exactly five facts: origin, destination, moving piece, captured
/// piece (if any) and promotion piece (if any). They are packed into one
/// `u32`: 6 bits from, 6 bits to, 3 bits piece, 3 bits captured, 3 bits
/// promotion. Optional kinds are stored as `index + 1`, with 0 meaning none.
///
/// En passant captures record a captured pawn. Castling is a king move of
/// two files and needs no extra field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    /// Creates a new move.
    #[inline]
    pub const fn new(
        from: Square,
        to: Square,
        piece: Piece,
        captured: Option<Piece>,
        promotion: Option<Piece>,
    ) -> Self {
        let encoded = (from.index() as u32)
            | ((to.index() as u32) << TO_SHIFT)
            | ((piece as u32) << PIECE_SHIFT)
            | (encode_kind(captured) << CAPTURED_SHIFT)
            | (encode_kind(promotion) << PROMOTION_SHIFT);
        Move(encoded)
    }

    /// Creates a quiet move (no capture, no promotion).
    #[inline]
    pub const fn quiet(from: Square, to: Square, piece: Piece) -> Self {
        Self::new(from, to, piece, None, None)
    }

    /// Returns the source square.
    #[inline]
    pub const fn from(self) -> Square {
        // SAFETY: masked to 6 bits, always valid square index
        unsafe { Square::from_index_unchecked((self.0 & SQUARE_MASK) as u8) }
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(self) -> Square {
        // SAFETY: masked to 6 bits, always valid square index
        unsafe { Square::from_index_unchecked(((self.0 >> TO_SHIFT) & SQUARE_MASK) as u8) }
    }

    /// Returns the kind of the moving piece.
    #[inline]
    pub const fn piece(self) -> Piece {
        match Piece::from_index(((self.0 >> PIECE_SHIFT) & KIND_MASK) as usize) {
            Some(piece) => piece,
            None => Piece::Pawn,
        }
    }

    /// Returns the kind of the captured piece, if any.
    #[inline]
    pub const fn captured(self) -> Option<Piece> {
        decode_kind((self.0 >> CAPTURED_SHIFT) & KIND_MASK)
    }

    /// Returns the promotion piece, if any.
    #[inline]
    pub const fn promotion(self) -> Option<Piece> {
        decode_kind((self.0 >> PROMOTION_SHIFT) & KIND_MASK)
    }

    /// Returns true if the move captures a piece.
    #[inline]
    pub const fn is_capture(self) -> bool {
        (self.0 >> CAPTURED_SHIFT) & KIND_MASK != 0
    }

    /// Returns true if the move promotes a pawn.
    #[inline]
    pub const fn is_promotion(self) -> bool {
        (self.0 >> PROMOTION_SHIFT) & KIND_MASK != 0
    }

    /// Returns true if this is a king move of two files.
    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self.piece(), Piece::King) && self.from().index().abs_diff(self.to().index()) == 2
    }

    /// Returns the long algebraic notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_uci(self) -> String {
        match self.promotion() {
            Some(piece) => format!("{}{}{}", self.from(), self.to(), piece.letter()),
            None => format!("{}{}", self.from(), self.to()),
        }
    }

    /// Splits long algebraic notation into origin, destination and promotion.
    ///
    /// The remaining move fields depend on the position, so resolving the
    /// text to a full [`Move`] is left to the move generator.
    pub fn parse_uci(s: &str) -> Option<(Square, Square, Option<Piece>)> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            Some(c) => match Piece::from_letter(c)? {
                Piece::Pawn | Piece::King => return None,
                piece => Some(piece),
            },
            None => None,
        };
        Some((from, to, promotion))
    }

    /// A placeholder value, never produced by move generation.
    pub const NULL: Move = Move(0);
}

const fn encode_kind(kind: Option<Piece>) -> u32 {
    match kind {
        Some(piece) => piece as u32 + 1,
        None => 0,
    }
}

const fn decode_kind(code: u32) -> Option<Piece> {
    if code == 0 {
        None
    } else {
        Piece::from_index(code as usize - 1)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} {}", self.to_uci(), self.piece())?;
        if let Some(captured) = self.captured() {
            write!(f, "x{}", captured)?;
        }
        if let Some(promotion) = self.promotion() {
            write!(f, "={}", promotion)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
