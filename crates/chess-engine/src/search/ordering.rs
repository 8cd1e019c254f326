//! Move ordering heuristic.
//!
//! Cheap guesses that put likely-good moves first so alpha-beta cuts early:
//! winning captures, then promotions, with a penalty for stepping onto a
//! square an enemy pawn covers.

use chess_core::{Move, Piece};
use std::cmp::Reverse;

use crate::movegen::pawn_attacks_all;
use crate::{Bitboard, Position};

/// Ordering score for one move given the squares enemy pawns attack.
pub fn score_move(m: Move, enemy_pawn_attacks: Bitboard) -> i32 {
    let mut score = 0;
    if let Some(captured) = m.captured() {
        score += 10 * captured.value() - m.piece().value();
    }
    if let Some(promotion) = m.promotion() {
        score += promotion.value();
    }
    if enemy_pawn_attacks.contains(m.to()) {
        score -= m.piece().value();
    }
    score
}

/// Sorts moves best-guess first. Equal scores keep their generated order.
pub fn order_moves(position: &Position, moves: &mut [Move]) {
    let them = position.side_to_move().opposite();
    let guarded = pawn_attacks_all(position.pieces_of(Piece::Pawn, them), them);
    moves.sort_by_key(|&m| Reverse(score_move(m, guarded)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_moves;
    use chess_core::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn captures_weighted_by_victim() {
        let pxq = Move::new(sq("e4"), sq("d5"), Piece::Pawn, Some(Piece::Queen), None);
        let qxp = Move::new(sq("d1"), sq("d5"), Piece::Queen, Some(Piece::Pawn), None);
        assert_eq!(score_move(pxq, Bitboard::EMPTY), 9000 - 100);
        assert_eq!(score_move(qxp, Bitboard::EMPTY), 1000 - 900);
    }

    #[test]
    fn promotion_and_pawn_guard_terms() {
        let promo = Move::new(sq("a7"), sq("a8"), Piece::Pawn, None, Some(Piece::Queen));
        assert_eq!(score_move(promo, Bitboard::EMPTY), 900);

        let knight = Move::quiet(Square::G1, sq("f3"), Piece::Knight);
        assert_eq!(score_move(knight, Bitboard::from_square(sq("f3"))), -300);
        assert_eq!(score_move(knight, Bitboard::EMPTY), 0);
    }

    #[test]
    fn best_capture_first() {
        // White can take the queen with the pawn or the knight on d5.
        let position = Position::from_fen("4k3/8/8/3q4/4P3/2N5/8/4K3 w - - 0 1").unwrap();
        let mut moves = generate_moves(&position);
        order_moves(&position, moves.as_mut_slice());
        assert_eq!(moves[0].to_uci(), "e4d5");
        assert_eq!(moves[1].to_uci(), "c3d5");
    }

    #[test]
    fn order_is_stable_for_ties() {
        let position = Position::startpos();
        let generated = generate_moves(&position);
        let mut ordered = generated.clone();
        order_moves(&position, ordered.as_mut_slice());
        // No captures and no enemy pawn reaches rank 3 yet.
        assert_eq!(ordered.as_slice(), generated.as_slice());
    }
}
