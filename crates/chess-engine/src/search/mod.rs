//! Fixed-depth negamax search with alpha-beta pruning.
//!
//! The search owns no board: it plays moves on the caller's [`Position`]
//! and undoes each one before trying the next, so the position comes back
//! unchanged.

mod evaluation;
mod ordering;

use chess_core::Move;

use crate::{generate_moves, Position};

pub use evaluation::evaluate;
pub use ordering::{order_moves, score_move};

/// Score of being checkmated, from the mated side's perspective (negated).
pub const MATE_SCORE: i32 = 100_000;

/// Bound of the initial search window. Larger than any reachable score.
pub const INFINITY: i32 = 1_000_000;

/// Outcome of a root search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move found, or `None` when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Score of the best move for the side to move, in centipawns.
    pub score: i32,
    /// Interior and leaf nodes visited below the root.
    pub nodes: u64,
}

/// Search state
#[derive(Debug, Default)]
pub struct Searcher {
    nodes: u64,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes visited by the most recent search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Searches `depth` plies and returns the best root move.
    ///
    /// A depth of zero is searched as one ply.
    pub fn search(&mut self, position: &mut Position, depth: u32) -> SearchResult {
        self.nodes = 0;
        let depth = depth.max(1);

        let mut moves = generate_moves(position);
        if moves.is_empty() {
            let score = if position.is_in_check() { -MATE_SCORE } else { 0 };
            return SearchResult {
                best_move: None,
                score,
                nodes: 0,
            };
        }
        order_moves(position, moves.as_mut_slice());

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_move = None;
        let mut best_score = -INFINITY;

        for &m in moves.iter() {
            position.make_move(m);
            let score = -self.alpha_beta(position, depth - 1, -beta, -alpha);
            position.undo_move();

            tracing::trace!(mv = %m, score, "root move");

            if best_move.is_none() || score > best_score {
                best_score = score;
                best_move = Some(m);
            }
            if score > alpha {
                alpha = score;
            }
        }

        tracing::debug!(
            depth,
            score = best_score,
            nodes = self.nodes,
            best = ?best_move.map(|m| m.to_uci()),
            "search complete"
        );

        SearchResult {
            best_move,
            score: best_score,
            nodes: self.nodes,
        }
    }

    fn alpha_beta(&mut self, position: &mut Position, depth: u32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;

        if depth == 0 {
            return evaluate(position);
        }

        let mut moves = generate_moves(position);
        if moves.is_empty() {
            return if position.is_in_check() { -MATE_SCORE } else { 0 };
        }
        order_moves(position, moves.as_mut_slice());

        for &m in moves.iter() {
            position.make_move(m);
            let score = -self.alpha_beta(position, depth - 1, -beta, -alpha);
            position.undo_move();

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

/// Finds the best move at a fixed depth, or `None` if there is no legal move.
pub fn find_best_move(position: &mut Position, depth: u32) -> Option<Move> {
    Searcher::new().search(position, depth).best_move
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_legal_move_is_returned_at_any_depth() {
        // The checking queen must be taken by the king.
        for depth in 1..=4 {
            let mut position = Position::from_fen("7k/8/8/8/8/8/6q1/7K w - - 0 1").unwrap();
            let best = find_best_move(&mut position, depth).unwrap();
            assert_eq!(best.to_uci(), "h1g2");
        }
    }

    #[test]
    fn finds_mate_in_one() {
        let mut position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let result = Searcher::new().search(&mut position, 2);
        assert_eq!(result.best_move.map(|m| m.to_uci()), Some("a1a8".to_string()));
        assert_eq!(result.score, MATE_SCORE);
    }

    #[test]
    fn takes_hanging_queen() {
        let mut position = Position::from_fen("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1").unwrap();
        let result = Searcher::new().search(&mut position, 2);
        assert_eq!(result.best_move.map(|m| m.to_uci()), Some("d1d5".to_string()));
        assert_eq!(result.score, 900);
        assert!(result.nodes > 0);
    }

    #[test]
    fn no_move_when_mated_or_stalemated() {
        let mut mated = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        let result = Searcher::new().search(&mut mated, 3);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -MATE_SCORE);

        let mut stalemate = Position::from_fen("k7/8/8/8/8/8/5q2/7K w - - 0 1").unwrap();
        assert_eq!(find_best_move(&mut stalemate, 3), None);
    }

    #[test]
    fn depth_zero_searches_one_ply() {
        let mut position = Position::from_fen("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1").unwrap();
        assert_eq!(
            find_best_move(&mut position, 0).map(|m| m.to_uci()),
            Some("d1d5".to_string())
        );
    }

    #[test]
    fn search_leaves_position_untouched() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut position = Position::from_fen(fen).unwrap();
        let before = position.clone();
        let mut searcher = Searcher::new();
        let result = searcher.search(&mut position, 3);
        assert!(result.best_move.is_some());
        assert_eq!(searcher.nodes(), result.nodes);
        assert_eq!(position, before);
        assert_eq!(position.history_len(), 0);
    }
}
