//! Magic bitboard tables for sliding piece attack generation.
//!
//! Magic bitboards use a perfect hashing technique to map blocker configurations
//! to precomputed attack bitboards in O(1) time:
//!
//! ```text
//! index = ((occupied & mask) * magic) >> shift
//! ```
//!
//! The constants below were produced by [`find_magic`] and are checked by
//! [`verify_magic`] in the test suite. Every square gets its own segment of
//! `2^(64 - shift)` entries in one flat attack vector.

use crate::Bitboard;
use chess_core::Square;
use std::sync::OnceLock;

/// The two sliding movement patterns. Queens combine both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Rook,
    Bishop,
}

impl Slider {
    const fn directions(self) -> [(i8, i8); 4] {
        match self {
            Slider::Rook => [(1, 0), (-1, 0), (0, 1), (0, -1)],
            Slider::Bishop => [(1, 1), (1, -1), (-1, 1), (-1, -1)],
        }
    }

    fn magics(self) -> &'static [u64; 64] {
        match self {
            Slider::Rook => &ROOK_MAGICS,
            Slider::Bishop => &BISHOP_MAGICS,
        }
    }
}

/// Magic entry for a single square.
#[derive(Debug, Clone, Copy, Default)]
pub struct Magic {
    /// Mask of relevant blocker squares (excludes edges).
    pub mask: Bitboard,
    /// The magic number for this square.
    pub magic: u64,
    /// Right shift amount (64 - number of bits in mask).
    pub shift: u8,
    /// Offset into the attack table.
    pub offset: usize,
}

impl Magic {
    /// Computes the table index for a given occupancy.
    #[inline]
    pub fn index(&self, occupied: Bitboard) -> usize {
        let relevant = occupied & self.mask;
        (relevant.0.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Stores all precomputed sliding attack tables.
pub struct AttackTables {
    rook_magics: [Magic; 64],
    rook_attacks: Vec<Bitboard>,
    bishop_magics: [Magic; 64],
    bishop_attacks: Vec<Bitboard>,
}

static ATTACK_TABLES: OnceLock<AttackTables> = OnceLock::new();

/// Gets the global attack tables, initializing if necessary.
pub fn get_attack_tables() -> &'static AttackTables {
    ATTACK_TABLES.get_or_init(AttackTables::new)
}

/// Builds the sliding tables now instead of on the first query.
pub fn init() {
    get_attack_tables();
}

const ROOK_MAGICS: [u64; 64] = [
    0x0080008061400210,
    0x0040100020004009,
    0x1180100380a86000,
    0x48800800c4100080,
    0x0a001020a8842600,
    0x3200060008041001,
    0x8c000cb028040a05,
    0x0100005200208100,
    0x0308800567804000,
    0x49c2002208834104,
    0x2163001300422004,
    0x8042001a0012e140,
    0x06270011000c2800,
    0x1062002200081045,
    0xa10400090208d004,
    0x10c2000086440112,
    0x3d41898001204006,
    0x45c3020041820029,
    0x42c0820018420020,
    0x022901001000a14c,
    0x5811910004080100,
    0x80ca80800a002401,
    0x4908240090072812,
    0x50080a00006e8904,
    0x0840008880094020,
    0x8014200080804000,
    0x7210100180200284,
    0x428c492100300100,
    0xfe2e002200090450,
    0x0b92002a00084411,
    0x0a04052400080230,
    0x010001420004840f,
    0x3108400024800384,
    0x7080e20082004100,
    0xa321410295002000,
    0x4102801000800800,
    0x8005480080800c00,
    0x0202000822000490,
    0xc514101284004128,
    0x0718490942000094,
    0x0240108160c48004,
    0xad46008021020043,
    0x1001012001310042,
    0xcc42210090010048,
    0x1110920032620028,
    0xc3c0020004008080,
    0x90f0b018010c000a,
    0x012810c105960004,
    0x2698490482002a00,
    0x94404080a2010600,
    0xc085024620013100,
    0x1110900048008180,
    0x821c00808d080080,
    0x412e01081004c200,
    0x6080e89a01302400,
    0x500d840881670200,
    0x4000908000402107,
    0x620d012040018415,
    0x300c2000410098d5,
    0x100a00081060c442,
    0x0082008420089082,
    0x108a002c10780502,
    0x2080061009880324,
    0x204004c904002082,
];

const BISHOP_MAGICS: [u64; 64] = [
    0x62e0200408504048,
    0x2ac4846282020380,
    0xc190208483080682,
    0xd8282042c0108029,
    0x1422021000788848,
    0x9003039840000038,
    0x00290d480a401040,
    0x8c020700c8064801,
    0x1114a01899030c00,
    0x0000220802040146,
    0x272e080825007404,
    0xb8ac182481001806,
    0x014a44106872de04,
    0x00424602500580c0,
    0x2404108627202100,
    0x81011c86089004e0,
    0x08c0015d9ca80200,
    0x4420402a521a1601,
    0x085000680ac01022,
    0x816800018200440d,
    0x5c04048080a04848,
    0x6050418201100101,
    0x0251108405080206,
    0x5c4080130400a604,
    0x88e2683642104408,
    0x24482002380d0505,
    0xc0882800901180e4,
    0x32a8080080a20120,
    0xe019080507004000,
    0x040ac2008d011510,
    0x3004044309081204,
    0x18ac029081620101,
    0x1090500504b00400,
    0xc4880210428e0401,
    0x0320d04800300081,
    0x0340a00800d90304,
    0xc482128400aa0020,
    0x060610a200810800,
    0x2418280149198209,
    0xb021160600058140,
    0x5557245040800481,
    0x494788241009825e,
    0x080034006804cc06,
    0x0490102204215801,
    0x4003286300402c01,
    0xd22400848d000202,
    0x169d900083240645,
    0x100e348206900a01,
    0x784d5230142115b1,
    0x9480c414a808621d,
    0x800080a68c106016,
    0x900032e0e0880524,
    0x2244401102120444,
    0x0206085041460400,
    0x1ba008a148008630,
    0x0d141302140900c4,
    0x0126020501a82414,
    0x04aa222a01142045,
    0x112260084cc41016,
    0x88138018282a0800,
    0x240b086810060a00,
    0x129a044104082980,
    0x1521409c682e0059,
    0x10901010410160a0,
];

impl AttackTables {
    /// Creates and initializes all attack tables.
    pub fn new() -> Self {
        let (rook_magics, rook_attacks) = build_slider(Slider::Rook);
        let (bishop_magics, bishop_attacks) = build_slider(Slider::Bishop);
        tracing::debug!(
            rook_entries = rook_attacks.len(),
            bishop_entries = bishop_attacks.len(),
            "built magic attack tables"
        );
        AttackTables {
            rook_magics,
            rook_attacks,
            bishop_magics,
            bishop_attacks,
        }
    }

    /// Returns the magic entry for a slider on a square.
    pub fn magic(&self, slider: Slider, sq: Square) -> &Magic {
        match slider {
            Slider::Rook => &self.rook_magics[sq.index() as usize],
            Slider::Bishop => &self.bishop_magics[sq.index() as usize],
        }
    }

    /// Looks up slider attacks from `sq` for the given occupancy.
    #[inline]
    pub fn attacks(&self, slider: Slider, sq: Square, occupied: Bitboard) -> Bitboard {
        let (magic, table) = match slider {
            Slider::Rook => (&self.rook_magics[sq.index() as usize], &self.rook_attacks),
            Slider::Bishop => (&self.bishop_magics[sq.index() as usize], &self.bishop_attacks),
        };
        table[magic.offset + magic.index(occupied)]
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

fn build_slider(slider: Slider) -> ([Magic; 64], Vec<Bitboard>) {
    let mut magics = [Magic::default(); 64];
    let mut attacks = Vec::new();

    for sq in Square::all() {
        let mask = relevant_mask(slider, sq);
        let bits = mask.count();
        let offset = attacks.len();
        let magic = Magic {
            mask,
            magic: slider.magics()[sq.index() as usize],
            shift: (64 - bits) as u8,
            offset,
        };
        attacks.resize(offset + (1usize << bits), Bitboard::EMPTY);

        for subset in 0..(1usize << bits) {
            let blockers = blockers_from_index(subset, mask);
            attacks[offset + magic.index(blockers)] = slider_attacks_slow(slider, sq, blockers);
        }
        magics[sq.index() as usize] = magic;
    }

    (magics, attacks)
}

/// Returns bishop attacks for a square given occupied squares.
#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    get_attack_tables().attacks(Slider::Bishop, sq, occupied)
}

/// Returns rook attacks for a square given occupied squares.
#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    get_attack_tables().attacks(Slider::Rook, sq, occupied)
}

/// Returns queen attacks (bishop + rook).
#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Squares on the slider's rays from `sq` that can block it.
///
/// Each ray stops one square short of the board edge: a piece on the last
/// square of a ray never hides anything behind it.
pub fn relevant_mask(slider: Slider, sq: Square) -> Bitboard {
    let mut mask = 0u64;
    let rank = (sq.index() / 8) as i8;
    let file = (sq.index() % 8) as i8;

    for (dr, df) in slider.directions() {
        let mut r = rank + dr;
        let mut f = file + df;
        while on_board(r + dr, f + df) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }

    Bitboard(mask)
}

/// Ray-cast attacks, stopping at (and including) the first blocker.
///
/// Used to fill the tables and as the reference when validating magics.
pub fn slider_attacks_slow(slider: Slider, sq: Square, blockers: Bitboard) -> Bitboard {
    let mut attacks = 0u64;
    let rank = (sq.index() / 8) as i8;
    let file = (sq.index() % 8) as i8;

    for (dr, df) in slider.directions() {
        let mut r = rank + dr;
        let mut f = file + df;
        while on_board(r, f) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if blockers.0 & bit != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }

    Bitboard(attacks)
}

#[inline]
fn on_board(rank: i8, file: i8) -> bool {
    (0..8).contains(&rank) && (0..8).contains(&file)
}

/// Spreads the low bits of `index` onto the set squares of `mask`.
///
/// Bit `i` of `index` decides whether the `i`-th lowest square of the mask
/// is occupied, so `0..2^popcount(mask)` enumerates every blocker subset.
pub fn blockers_from_index(index: usize, mask: Bitboard) -> Bitboard {
    let mut blockers = Bitboard::EMPTY;
    for (bit, sq) in mask.into_iter().enumerate() {
        if index & (1 << bit) != 0 {
            blockers |= Bitboard::from_square(sq);
        }
    }
    blockers
}

/// Checks a magic candidate against every blocker subset of the square.
///
/// Two subsets may share an index only when they produce the same attack set.
pub fn verify_magic(slider: Slider, sq: Square, magic: u64) -> bool {
    let mask = relevant_mask(slider, sq);
    let bits = mask.count();
    let entry = Magic {
        mask,
        magic,
        shift: (64 - bits) as u8,
        offset: 0,
    };
    let mut seen: Vec<Option<Bitboard>> = vec![None; 1 << bits];

    for subset in 0..(1usize << bits) {
        let blockers = blockers_from_index(subset, mask);
        let attacks = slider_attacks_slow(slider, sq, blockers);
        let index = entry.index(blockers);
        match seen[index] {
            Some(existing) if existing != attacks => return false,
            Some(_) => {}
            None => seen[index] = Some(attacks),
        }
    }
    true
}

/// Deterministic xorshift64 generator for the magic search.
#[derive(Debug, Clone)]
pub struct MagicRng(u64);

impl MagicRng {
    /// Creates a generator from a non-zero seed.
    pub fn new(seed: u64) -> Self {
        MagicRng(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    /// Next pseudo-random word.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// A candidate with few bits set, which tends to make good magics.
    pub fn sparse_u64(&mut self) -> u64 {
        self.next_u64() & self.next_u64() & self.next_u64()
    }
}

/// Searches for a collision-free magic for one square.
///
/// Runs until a candidate passes [`verify_magic`]. Candidates that cannot
/// spread the mask into the top index bits are rejected early.
pub fn find_magic(slider: Slider, sq: Square, rng: &mut MagicRng) -> u64 {
    let mask = relevant_mask(slider, sq);
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        let candidate = rng.sparse_u64();
        if (mask.0.wrapping_mul(candidate) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }
        if verify_magic(slider, sq, candidate) {
            tracing::trace!(?slider, %sq, attempts, "found magic");
            return candidate;
        }
    }
}
