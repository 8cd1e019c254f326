//! Line and between tables for pin and check-block masks.
//!
//! For every pair of squares that share a rank, file or diagonal we store
//! the full board line through both of them and the squares strictly
//! between them. Unaligned pairs map to the empty bitboard.

use crate::Bitboard;
use chess_core::Square;
use std::sync::OnceLock;

const DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

struct LineTables {
    line: Vec<Bitboard>,
    between: Vec<Bitboard>,
}

static LINE_TABLES: OnceLock<LineTables> = OnceLock::new();

fn tables() -> &'static LineTables {
    LINE_TABLES.get_or_init(LineTables::new)
}

impl LineTables {
    fn new() -> Self {
        let mut line = vec![Bitboard::EMPTY; 64 * 64];
        let mut between = vec![Bitboard::EMPTY; 64 * 64];

        for a in Square::all() {
            for (dr, df) in DIRECTIONS {
                let full = ray(a, dr, df) | ray(a, -dr, -df) | Bitboard::from_square(a);
                let mut gap = Bitboard::EMPTY;
                for b in walk(a, dr, df) {
                    let slot = pair_index(a, b);
                    line[slot] = full;
                    between[slot] = gap;
                    gap |= Bitboard::from_square(b);
                }
            }
        }

        LineTables { line, between }
    }
}

#[inline]
fn pair_index(a: Square, b: Square) -> usize {
    a.index() as usize * 64 + b.index() as usize
}

fn walk(from: Square, dr: i8, df: i8) -> impl Iterator<Item = Square> {
    let rank = (from.index() / 8) as i8;
    let file = (from.index() % 8) as i8;
    (1..8)
        .map(move |step| (rank + dr * step, file + df * step))
        .take_while(|&(r, f)| (0..8).contains(&r) && (0..8).contains(&f))
        .filter_map(|(r, f)| Square::from_index((r * 8 + f) as u8))
}

fn ray(from: Square, dr: i8, df: i8) -> Bitboard {
    walk(from, dr, df).fold(Bitboard::EMPTY, |acc, sq| acc | Bitboard::from_square(sq))
}

/// The full line through `a` and `b`, both included, edge to edge.
///
/// Empty when the squares are not on a common rank, file or diagonal,
/// or when `a == b`.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard {
    tables().line[pair_index(a, b)]
}

/// Squares strictly between `a` and `b` on their common line.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables().between[pair_index(a, b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn board(squares: &[&str]) -> Bitboard {
        squares
            .iter()
            .fold(Bitboard::EMPTY, |acc, s| acc | Bitboard::from_square(sq(s)))
    }

    #[test]
    fn between_on_a_file() {
        assert_eq!(between(sq("e1"), sq("e5")), board(&["e2", "e3", "e4"]));
        assert_eq!(between(sq("e5"), sq("e1")), board(&["e2", "e3", "e4"]));
        assert!(between(sq("e1"), sq("e2")).is_empty());
    }

    #[test]
    fn between_on_a_diagonal() {
        assert_eq!(between(sq("a1"), sq("d4")), board(&["b2", "c3"]));
        assert_eq!(between(sq("h1"), sq("e4")), board(&["g2", "f3"]));
    }

    #[test]
    fn unaligned_pairs_are_empty() {
        assert!(between(sq("a1"), sq("b3")).is_empty());
        assert!(line(sq("a1"), sq("b3")).is_empty());
        assert!(line(sq("e4"), sq("e4")).is_empty());
    }

    #[test]
    fn line_spans_the_board() {
        let l = line(sq("c3"), sq("e5"));
        assert_eq!(l.count(), 8);
        assert!(l.contains(Square::A1));
        assert!(l.contains(Square::H8));

        let rank = line(sq("b4"), sq("g4"));
        assert_eq!(rank.count(), 8);
        assert!(rank.contains(sq("a4")) && rank.contains(sq("h4")));
    }

    #[test]
    fn line_is_symmetric_and_contains_between() {
        for a in Square::all() {
            for b in Square::all() {
                assert_eq!(line(a, b), line(b, a));
                assert_eq!(between(a, b), between(b, a));
                assert_eq!(between(a, b) & !line(a, b), Bitboard::EMPTY);
                if line(a, b).is_not_empty() {
                    assert!(line(a, b).contains(a) && line(a, b).contains(b));
                }
            }
        }
    }
}
