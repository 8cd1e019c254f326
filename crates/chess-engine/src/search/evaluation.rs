//! Static evaluation.

use chess_core::Piece;

use crate::Position;

/// Material balance in centipawns from the side to move's perspective.
pub fn evaluate(position: &Position) -> i32 {
    let us = position.side_to_move();
    let them = us.opposite();

    Piece::ALL
        .into_iter()
        .map(|piece| {
            let ours = position.pieces_of(piece, us).count() as i32;
            let theirs = position.pieces_of(piece, them).count() as i32;
            piece.value() * (ours - theirs)
        })
        .sum()
}
