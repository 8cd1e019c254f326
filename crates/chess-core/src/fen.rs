//! FEN (Forsyth-Edwards Notation) parsing and serialization.
//!
//! [`Fen`] is a validated, typed view of the six FEN fields. The engine
//! builds its bitboard position from it; nothing is constructed until every
//! field has been checked.

use crate::{Color, Piece, Square};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid king count: {0}")]
    InvalidKingCount(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// A parsed and validated FEN record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    /// Board contents indexed by square (a1 = 0).
    pub board: [Option<(Piece, Color)>; 64],
    /// The side to move.
    pub side_to_move: Color,
    /// Castling availability letters in `KQkq` order; empty for `-`.
    pub castling: String,
    /// En passant target square.
    pub en_passant: Option<Square>,
    /// Plies since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// Fullmove number, starting at 1.
    pub fullmove_number: u32,
}

impl Fen {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let board = parse_placement(parts[0])?;

        let side_to_move = match parts[1] {
            token if token.len() == 1 => token.chars().next().and_then(Color::from_fen_char),
            _ => None,
        }
        .ok_or_else(|| FenError::InvalidActiveColor(parts[1].to_string()))?;

        let castling = parse_castling(parts[2])?;
        let en_passant = parse_en_passant(parts[3], &board, side_to_move)?;

        let halfmove_clock = parts[4]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;

        let fullmove_number = parts[5]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidFullmoveNumber(parts[5].to_string()))?;

        Ok(Fen {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Returns the piece placement field (e.g. "rnbqkbnr/pppppppp/8/...").
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.board[(rank * 8 + file) as usize] {
                    Some((piece, color)) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let castling = if self.castling.is_empty() {
            "-"
        } else {
            &self.castling
        };
        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), Square::to_algebraic);
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement(),
            self.side_to_move.fen_char(),
            castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_placement(placement: &str) -> Result<[Option<(Piece, Color)>; 64], FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPiecePlacement(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = [None; 64];
    let mut kings = [0usize; 2];

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += skip as usize;
            } else if let Some((piece, color)) = Piece::from_fen_char(c) {
                if file < 8 {
                    board[rank * 8 + file] = Some((piece, color));
                }
                if piece == Piece::King {
                    kings[color.index()] += 1;
                }
                file += 1;
            } else {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "invalid character '{}' in rank {}",
                    c,
                    rank + 1
                )));
            }
            if file > 8 {
                break;
            }
        }
        if file != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "rank {} has {} squares, expected 8",
                rank + 1,
                file
            )));
        }
    }

    if kings != [1, 1] {
        return Err(FenError::InvalidKingCount(format!(
            "white has {}, black has {}, expected one each",
            kings[0], kings[1]
        )));
    }

    Ok(board)
}

fn parse_castling(castling: &str) -> Result<String, FenError> {
    if castling == "-" {
        return Ok(String::new());
    }

    let mut seen = String::new();
    for c in castling.chars() {
        if !"KQkq".contains(c) {
            return Err(FenError::InvalidCastlingRights(format!(
                "invalid character '{}'",
                c
            )));
        }
        if seen.contains(c) {
            return Err(FenError::InvalidCastlingRights(format!(
                "duplicate character '{}'",
                c
            )));
        }
        seen.push(c);
    }

    // Canonical KQkq order so serialization round-trips.
    Ok("KQkq".chars().filter(|c| seen.contains(*c)).collect())
}

/// The target must sit behind a pawn of the side that just moved, with both
/// the target and the pawn's origin square empty.
fn parse_en_passant(
    ep: &str,
    board: &[Option<(Piece, Color)>; 64],
    side_to_move: Color,
) -> Result<Option<Square>, FenError> {
    if ep == "-" {
        return Ok(None);
    }
    let invalid =
        |reason: &str| FenError::InvalidEnPassantSquare(format!("{} ({})", ep, reason));

    let target = Square::from_algebraic(ep).ok_or_else(|| invalid("not a square"))?;
    let mover = side_to_move.opposite();
    let expected_rank = if mover == Color::White { 2 } else { 5 };
    if target.rank().index() != expected_rank {
        return Err(invalid("wrong rank for the side to move"));
    }

    let at = |sq: Option<Square>| sq.and_then(|sq| board[sq.index() as usize]);
    if at(Some(target)).is_some() {
        return Err(invalid("target square is occupied"));
    }
    if at(target.offset(mover.pawn_push())) != Some((Piece::Pawn, mover)) {
        return Err(invalid("no pawn has just double-pushed"));
    }
    if at(target.offset(-mover.pawn_push())).is_some() {
        return Err(invalid("pawn origin square is occupied"));
    }
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINGS_ONLY: &str = "4k3/8/8/8/8/8/8/4K3";

    #[test]
    fn parse_startpos() {
        let fen = Fen::parse(Fen::STARTPOS).unwrap();
        assert_eq!(fen.side_to_move, Color::White);
        assert_eq!(fen.castling, "KQkq");
        assert_eq!(fen.en_passant, None);
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
        assert_eq!(fen.board[4], Some((Piece::King, Color::White)));
        assert_eq!(fen.board[59], Some((Piece::Queen, Color::Black)));
        assert_eq!(fen.board[28], None);
    }

    #[test]
    fn roundtrip() {
        for original in [
            Fen::STARTPOS,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        ] {
            assert_eq!(Fen::parse(original).unwrap().to_string(), original);
        }
    }

    #[test]
    fn castling_is_canonicalized() {
        let fen = Fen::parse(&format!("{} w qK - 0 1", KINGS_ONLY)).unwrap();
        assert_eq!(fen.castling, "Kq");
    }

    #[test]
    fn wrong_part_count() {
        assert_eq!(Fen::parse("invalid"), Err(FenError::InvalidPartCount(1)));
    }

    #[test]
    fn invalid_active_color() {
        assert!(matches!(
            Fen::parse(&format!("{} x KQkq - 0 1", KINGS_ONLY)),
            Err(FenError::InvalidActiveColor(_))
        ));
        assert!(matches!(
            Fen::parse(&format!("{} wb KQkq - 0 1", KINGS_ONLY)),
            Err(FenError::InvalidActiveColor(_))
        ));
    }

    #[test]
    fn invalid_piece_placement() {
        // Too few ranks
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Illegal character
        assert!(matches!(
            Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPXPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Nine squares in a rank
        assert!(matches!(
            Fen::parse("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
        // Digit zero is not a valid skip
        assert!(matches!(
            Fen::parse("4k3/8/8/8/8/8/08/4K3 w - - 0 1"),
            Err(FenError::InvalidPiecePlacement(_))
        ));
    }

    #[test]
    fn invalid_king_count() {
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::InvalidKingCount(_))
        ));
        assert!(matches!(
            Fen::parse("4k3/8/8/8/8/8/8/3KK3 w - - 0 1"),
            Err(FenError::InvalidKingCount(_))
        ));
    }

    #[test]
    fn invalid_castling_rights() {
        assert!(matches!(
            Fen::parse(&format!("{} w XYZ - 0 1", KINGS_ONLY)),
            Err(FenError::InvalidCastlingRights(_))
        ));
        assert!(matches!(
            Fen::parse(&format!("{} w KK - 0 1", KINGS_ONLY)),
            Err(FenError::InvalidCastlingRights(_))
        ));
    }

    #[test]
    fn invalid_en_passant() {
        for bad in ["abc", "x3", "e4"] {
            assert!(matches!(
                Fen::parse(&format!("{} w - {} 0 1", KINGS_ONLY, bad)),
                Err(FenError::InvalidEnPassantSquare(_))
            ));
        }
        let fen = Fen::parse("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(fen.en_passant, Square::from_algebraic("d6"));
    }

    #[test]
    fn en_passant_needs_a_double_pushed_pawn() {
        for bad in [
            // No black pawn on d5
            "4k3/8/8/3P4/8/8/8/4K3 w - d6 0 1",
            // Wrong rank for the side to move
            "4k3/8/8/3pP3/8/8/8/4K3 b - d6 0 1",
            // Target square occupied
            "4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1",
            // Origin square occupied
            "4k3/3n4/8/3pP3/8/8/8/4K3 w - d6 0 1",
            // White pawn where a black one should be
            "4k3/8/8/3PP3/8/8/8/4K3 w - d6 0 1",
        ] {
            assert!(
                matches!(Fen::parse(bad), Err(FenError::InvalidEnPassantSquare(_))),
                "accepted {}",
                bad
            );
        }
        assert!(Fen::parse("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1").is_ok());
    }

    #[test]
    fn invalid_counters() {
        assert!(matches!(
            Fen::parse(&format!("{} w - - abc 1", KINGS_ONLY)),
            Err(FenError::InvalidHalfmoveClock(_))
        ));
        assert!(matches!(
            Fen::parse(&format!("{} w - - 0 xyz", KINGS_ONLY)),
            Err(FenError::InvalidFullmoveNumber(_))
        ));
    }

    #[test]
    fn error_display_names_the_token() {
        let err = FenError::InvalidPartCount(3);
        assert!(err.to_string().contains('3'));
        let err = FenError::InvalidEnPassantSquare("z9".to_string());
        assert!(err.to_string().contains("z9"));
    }
}
