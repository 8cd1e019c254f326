//! Move generation.
//!
//! Produces strictly legal moves without playing them out. The king's
//! checkers and the pinned pieces are found first; every other piece is then
//! limited to the squares that resolve the check and keep it on its pin line.

mod attacks;
pub mod lines;
pub mod magics;
pub mod perft;

use crate::{Bitboard, Position};
use chess_core::{Color, File, Move, Piece, Rank, Square};

pub use attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, pawn_attacks_all, queen_attacks,
    rook_attacks,
};
pub use lines::{between, line};

/// A list of moves with a fixed maximum capacity.
///
/// Chess positions have at most 218 legal moves, so we use a fixed-size
/// array to avoid heap allocations during move generation.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    /// Maximum number of legal moves in any chess position.
    pub const MAX_MOVES: usize = 256;

    /// Creates an empty move list.
    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; Self::MAX_MOVES],
            len: 0,
        }
    }

    /// Adds a move to the list.
    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    /// Mutable view for in-place ordering.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    /// Returns true if the list holds the given move.
    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }

    /// Retains only moves for which the predicate returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if f(&self.moves[read]) {
                self.moves[write] = self.moves[read];
                write += 1;
            }
        }
        self.len = write;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Outcome of a position from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// Shared per-call state for the generator.
struct Context<'a> {
    position: &'a Position,
    us: Color,
    them: Color,
    king: Square,
    ours: Bitboard,
    theirs: Bitboard,
    occupied: Bitboard,
    /// Squares that capture or block the single checker; full when not in check.
    evasion: Bitboard,
    pinned: Bitboard,
}

impl Context<'_> {
    /// Destinations a piece on `from` may use without exposing the king.
    #[inline]
    fn pin_mask(&self, from: Square) -> Bitboard {
        if self.pinned.contains(from) {
            line(self.king, from)
        } else {
            Bitboard::FULL
        }
    }

    #[inline]
    fn push(&self, moves: &mut MoveList, from: Square, to: Square, piece: Piece) {
        let captured = self.position.piece_kind_at(to);
        moves.push(Move::new(from, to, piece, captured, None));
    }
}

/// Generates all legal moves for the given position.
///
/// The order of the returned moves is unspecified.
pub fn generate_moves(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();
    let Some(king) = position.king_square(us) else {
        return moves;
    };
    let them = us.opposite();
    let ours = position.occupied_by(us);
    let theirs = position.occupied_by(them);
    let occupied = ours | theirs;
    let checkers = position.checkers();

    // The king may not step back along the ray it is checked on.
    let without_king = occupied & !Bitboard::from_square(king);
    for to in king_attacks(king) & !ours {
        if position.attackers_to(to, them, without_king).is_empty() {
            let captured = position.piece_kind_at(to);
            moves.push(Move::new(king, to, Piece::King, captured, None));
        }
    }

    if checkers.more_than_one() {
        return moves;
    }

    let evasion = match checkers.lsb() {
        Some(checker) => between(king, checker) | Bitboard::from_square(checker),
        None => Bitboard::FULL,
    };

    let ctx = Context {
        position,
        us,
        them,
        king,
        ours,
        theirs,
        occupied,
        evasion,
        pinned: pinned_pieces(position, king, us),
    };

    if checkers.is_empty() {
        generate_castling_moves(&ctx, &mut moves);
    }
    generate_piece_moves(&ctx, &mut moves);
    generate_pawn_moves(&ctx, &mut moves);

    moves
}

/// Friendly pieces that are the only blocker between the king and an enemy slider.
fn pinned_pieces(position: &Position, king: Square, us: Color) -> Bitboard {
    let them = us.opposite();
    let theirs = position.occupied_by(them);
    let ours = position.occupied_by(us);
    let queens = position.pieces_of(Piece::Queen, them);

    // X-ray from the king through our own pieces.
    let snipers = (rook_attacks(king, theirs) & (position.pieces_of(Piece::Rook, them) | queens))
        | (bishop_attacks(king, theirs) & (position.pieces_of(Piece::Bishop, them) | queens));

    let mut pinned = Bitboard::EMPTY;
    for sniper in snipers {
        let blockers = between(king, sniper) & ours;
        if blockers.is_not_empty() && !blockers.more_than_one() {
            pinned |= blockers;
        }
    }
    pinned
}

fn generate_piece_moves(ctx: &Context<'_>, moves: &mut MoveList) {
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for from in ctx.position.pieces_of(piece, ctx.us) {
            let attacks = match piece {
                Piece::Knight => knight_attacks(from),
                Piece::Bishop => bishop_attacks(from, ctx.occupied),
                Piece::Rook => rook_attacks(from, ctx.occupied),
                _ => queen_attacks(from, ctx.occupied),
            };
            let targets = attacks & !ctx.ours & ctx.evasion & ctx.pin_mask(from);
            for to in targets {
                ctx.push(moves, from, to, piece);
            }
        }
    }
}

fn generate_pawn_moves(ctx: &Context<'_>, moves: &mut MoveList) {
    let us = ctx.us;
    let start_rank = match us {
        Color::White => Rank::R2,
        Color::Black => Rank::R7,
    };

    for from in ctx.position.pieces_of(Piece::Pawn, us) {
        let pin_mask = ctx.pin_mask(from);
        let allowed = pin_mask & ctx.evasion;

        if let Some(one) = from.offset(us.pawn_push()).filter(|sq| !ctx.occupied.contains(*sq)) {
            if allowed.contains(one) {
                push_pawn_move(moves, from, one, None, us);
            }
            if from.rank() == start_rank {
                let two = one
                    .offset(us.pawn_push())
                    .filter(|sq| !ctx.occupied.contains(*sq) && allowed.contains(*sq));
                if let Some(two) = two {
                    moves.push(Move::quiet(from, two, Piece::Pawn));
                }
            }
        }

        for to in pawn_attacks(from, us) & ctx.theirs & allowed {
            push_pawn_move(moves, from, to, ctx.position.piece_kind_at(to), us);
        }

        if let Some(ep) = ctx.position.en_passant() {
            if pawn_attacks(from, us).contains(ep) && pin_mask.contains(ep) {
                let victim = Square::new(ep.file(), from.rank());
                let resolves_check = ctx.evasion.contains(ep) || ctx.evasion.contains(victim);
                if resolves_check
                    && ctx.position.pieces_of(Piece::Pawn, ctx.them).contains(victim)
                    && !en_passant_exposes_king(ctx, from, ep, victim)
                {
                    moves.push(Move::new(from, ep, Piece::Pawn, Some(Piece::Pawn), None));
                }
            }
        }
    }
}

fn push_pawn_move(moves: &mut MoveList, from: Square, to: Square, captured: Option<Piece>, us: Color) {
    if to.rank() == us.promotion_rank() {
        for promotion in Piece::PROMOTIONS {
            moves.push(Move::new(from, to, Piece::Pawn, captured, Some(promotion)));
        }
    } else {
        moves.push(Move::new(from, to, Piece::Pawn, captured, None));
    }
}

/// Replays the en passant capture on the occupancy and asks whether an
/// enemy slider now sees the king.
///
/// Both pawns leave their rank at once, which a per-piece pin test misses.
fn en_passant_exposes_king(ctx: &Context<'_>, from: Square, ep: Square, victim: Square) -> bool {
    let occupied = (ctx.occupied & !Bitboard::from_square(from) & !Bitboard::from_square(victim))
        | Bitboard::from_square(ep);
    let position = ctx.position;
    let queens = position.pieces_of(Piece::Queen, ctx.them);
    let straight = position.pieces_of(Piece::Rook, ctx.them) | queens;
    let diagonal = position.pieces_of(Piece::Bishop, ctx.them) | queens;

    (rook_attacks(ctx.king, occupied) & straight).is_not_empty()
        || (bishop_attacks(ctx.king, occupied) & diagonal).is_not_empty()
}

/// Generates castling moves. Only called when the king is not in check.
fn generate_castling_moves(ctx: &Context<'_>, moves: &mut MoveList) {
    let us = ctx.us;
    let back_rank = us.back_rank();
    let castling = ctx.position.castling();
    if ctx.king != Square::new(File::E, back_rank) {
        return;
    }

    let sides = [
        (castling.can_castle_kingside(us), File::H, File::G),
        (castling.can_castle_queenside(us), File::A, File::C),
    ];

    for (allowed, rook_file, king_file) in sides {
        let rook = Square::new(rook_file, back_rank);
        let target = Square::new(king_file, back_rank);
        if !allowed
            || !ctx.position.pieces_of(Piece::Rook, us).contains(rook)
            || (between(ctx.king, rook) & ctx.occupied).is_not_empty()
        {
            continue;
        }
        let transit = between(ctx.king, target) | Bitboard::from_square(target);
        if transit
            .into_iter()
            .all(|sq| !ctx.position.is_square_attacked(sq, ctx.them))
        {
            moves.push(Move::quiet(ctx.king, target, Piece::King));
        }
    }
}

/// Classifies the position for the side to move.
pub fn status(position: &Position) -> GameStatus {
    if !generate_moves(position).is_empty() {
        GameStatus::Ongoing
    } else if position.is_in_check() {
        GameStatus::Checkmate
    } else {
        GameStatus::Stalemate
    }
}

/// Resolves long algebraic notation ("e2e4", "e7e8q") to a legal move.
pub fn find_move(position: &Position, uci: &str) -> Option<Move> {
    let (from, to, promotion) = Move::parse_uci(uci)?;
    generate_moves(position)
        .iter()
        .copied()
        .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn moves_of(fen: &str) -> MoveList {
        generate_moves(&Position::from_fen(fen).unwrap())
    }

    fn has(moves: &MoveList, uci: &str) -> bool {
        moves.iter().any(|m| m.to_uci() == uci)
    }

    #[test]
    fn movelist_push_and_index() {
        let mut list = MoveList::new();
        assert!(list.is_empty());

        let m1 = Move::quiet(sq("e2"), sq("e4"), Piece::Pawn);
        let m2 = Move::quiet(sq("d2"), sq("d4"), Piece::Pawn);
        list.push(m1);
        list.push(m2);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0], m1);
        assert_eq!(list[1], m2);
        assert!(list.contains(m2));
    }

    #[test]
    fn movelist_retain_and_sort() {
        let mut list = MoveList::default();
        list.push(Move::quiet(sq("e2"), sq("e3"), Piece::Pawn));
        list.push(Move::quiet(sq("e2"), sq("e4"), Piece::Pawn));
        list.push(Move::quiet(sq("e3"), sq("e4"), Piece::Pawn));

        list.retain(|m| m.from() == sq("e2"));
        assert_eq!(list.len(), 2);

        list.as_mut_slice().reverse();
        assert_eq!(list[0].to(), sq("e4"));
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let moves = generate_moves(&Position::startpos());
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|m| !m.is_capture()));
    }

    #[test]
    fn castling_both_sides() {
        let moves = moves_of("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert!(has(&moves, "e1g1"));
        assert!(has(&moves, "e1c1"));
        assert!(moves.iter().filter(|m| m.is_castling()).count() == 2);
    }

    #[test]
    fn no_castling_through_attacked_square() {
        // The f2 rook covers f1 but nothing on the queenside.
        let moves = moves_of("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1");
        assert!(!has(&moves, "e1g1"));
        assert!(has(&moves, "e1c1"));
    }

    #[test]
    fn no_castling_out_of_check_or_without_rook() {
        let moves = moves_of("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        assert!(moves.iter().all(|m| !m.is_castling()));

        let moves = moves_of("r3k2r/8/8/8/8/8/8/4K2R w KQkq - 0 1");
        assert!(has(&moves, "e1g1"));
        assert!(!has(&moves, "e1c1"));
    }

    #[test]
    fn queenside_castling_needs_b_file_empty() {
        let moves = moves_of("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert!(!has(&moves, "e1c1"));
    }

    #[test]
    fn en_passant_is_generated() {
        let moves = moves_of("rnbqkbnr/pppp1ppp/8/4pP2/8/8/PPPPP1PP/RNBQKBNR w KQkq e6 0 1");
        let ep = moves.iter().find(|m| m.to_uci() == "f5e6").unwrap();
        assert_eq!(ep.captured(), Some(Piece::Pawn));
    }

    #[test]
    fn en_passant_discovered_check_on_rank() {
        let moves = moves_of("8/8/8/KPp4r/8/8/8/7k w - c6 0 1");
        assert!(!has(&moves, "b5c6"));
        assert!(has(&moves, "b5b6"));
    }

    #[test]
    fn en_passant_captures_checking_pawn() {
        // The d5 pawn checks the e4 king and can be taken en passant.
        let moves = moves_of("8/8/8/3pP3/4K3/8/8/k7 w - d6 0 1");
        assert!(has(&moves, "e5d6"));
    }

    #[test]
    fn promotions_come_in_fours() {
        let moves = moves_of("8/P7/8/8/8/8/8/4K2k w - - 0 1");
        let promotions: Vec<_> = moves.iter().filter(|m| m.is_promotion()).collect();
        assert_eq!(promotions.len(), 4);
        for piece in Piece::PROMOTIONS {
            assert!(promotions.iter().any(|m| m.promotion() == Some(piece)));
        }
    }

    #[test]
    fn capture_promotions_record_the_victim() {
        let moves = moves_of("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let captures = moves
            .iter()
            .filter(|m| m.to_uci().starts_with("a7b8"))
            .count();
        assert_eq!(captures, 4);
        assert!(moves
            .iter()
            .filter(|m| m.to() == sq("b8"))
            .all(|m| m.captured() == Some(Piece::Rook)));
    }

    #[test]
    fn pinned_bishop_cannot_move() {
        let moves = moves_of("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
        assert!(moves.iter().all(|m| m.from() != sq("e2")));
    }

    #[test]
    fn pinned_rook_slides_along_the_pin() {
        let moves = moves_of("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1");
        let rook_moves: Vec<_> = moves.iter().filter(|m| m.from() == sq("e2")).collect();
        assert_eq!(rook_moves.len(), 5);
        assert!(rook_moves.iter().all(|m| m.to().file() == File::E));
    }

    #[test]
    fn single_check_must_be_answered() {
        // Rook on e8 checks; the bishop can block on e5 and the knight on e4.
        let moves = moves_of("k3r3/8/8/8/8/2B5/3N4/4K3 w - - 0 1");
        let mut pos = Position::from_fen("k3r3/8/8/8/8/2B5/3N4/4K3 w - - 0 1").unwrap();
        for &m in moves.iter() {
            pos.make_move(m);
            let king = pos.king_square(Color::White).unwrap();
            assert!(!pos.is_square_attacked(king, Color::Black), "{:?}", m);
            pos.undo_move();
        }
        assert!(has(&moves, "c3e5"));
        assert!(has(&moves, "d2e4"));
        assert!(!has(&moves, "c3b4"));
    }

    #[test]
    fn king_cannot_retreat_along_check_ray() {
        let moves = moves_of("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        assert!(!has(&moves, "e1f1"));
        assert!(has(&moves, "e1e2"));
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        let moves = moves_of("4k3/8/8/8/8/5n2/R7/r3K3 w - - 0 1");
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m.piece() == Piece::King));
        assert!(has(&moves, "e1e2"));
        assert!(has(&moves, "e1f2"));
    }

    #[test]
    fn game_status() {
        assert_eq!(status(&Position::startpos()), GameStatus::Ongoing);
        let mate = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(status(&mate), GameStatus::Checkmate);
        let stalemate = Position::from_fen("k7/8/8/8/8/8/5q2/7K w - - 0 1").unwrap();
        assert_eq!(status(&stalemate), GameStatus::Stalemate);
    }

    #[test]
    fn find_move_resolves_uci() {
        let position = Position::startpos();
        let m = find_move(&position, "g1f3").unwrap();
        assert_eq!(m.piece(), Piece::Knight);
        assert_eq!(find_move(&position, "e2e5"), None);
        assert_eq!(find_move(&position, "nonsense"), None);

        let promo = Position::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        assert_eq!(
            find_move(&promo, "a7a8n").and_then(|m| m.promotion()),
            Some(Piece::Knight)
        );
        assert_eq!(find_move(&promo, "a7a8"), None);
    }
}
