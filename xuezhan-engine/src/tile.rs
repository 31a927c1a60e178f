//! Tile representation for the 108-tile, three-suit set.
//!
//! Provides the physical-id newtype, the table-derived physical-to-logical
//! rank mapping, suit classification, and the run-start exclusion set used
//! by the grouping engine.

use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of tile suits (wan, tong, tiao).
pub const NUM_SUITS: usize = 3;

/// Ranks per suit (1-9).
pub const RANKS_PER_SUIT: usize = 9;

/// Distinct logical ranks (1-27).
pub const NUM_RANKS: usize = 27;

/// Physical copies of each logical rank.
pub const COPIES_PER_RANK: usize = 4;

/// Total physical tiles in the set.
pub const NUM_TILES: usize = 108;

/// Physical ids covered by one suit (9 ranks x 4 copies).
pub const TILES_PER_SUIT: usize = RANKS_PER_SUIT * COPIES_PER_RANK;

/// Logical ranks that may never start a run: the last two ranks of each
/// suit, so no run window crosses a suit boundary.
pub const RUN_START_EXCLUDED: [u8; 6] = [8, 9, 17, 18, 26, 27];

// ---------------------------------------------------------------------------
// Suit
// ---------------------------------------------------------------------------

/// The three tile suits. Ranks 1-9 are wan, 10-18 tong, 19-27 tiao.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Suit {
    #[default]
    Wan = 0,
    Tong = 1,
    Tiao = 2,
}

impl Suit {
    /// First logical rank of this suit.
    #[inline]
    pub const fn first_rank(self) -> u8 {
        match self {
            Suit::Wan => 1,
            Suit::Tong => 10,
            Suit::Tiao => 19,
        }
    }

    /// Suit owning a logical rank (1-27).
    #[inline]
    pub const fn of_rank(rank: u8) -> Suit {
        match (rank - 1) / RANKS_PER_SUIT as u8 {
            0 => Suit::Wan,
            1 => Suit::Tong,
            _ => Suit::Tiao,
        }
    }
}

impl From<u8> for Suit {
    fn from(val: u8) -> Self {
        match val % NUM_SUITS as u8 {
            0 => Suit::Wan,
            1 => Suit::Tong,
            _ => Suit::Tiao,
        }
    }
}

// ---------------------------------------------------------------------------
// Rank lookup table
// ---------------------------------------------------------------------------

const fn build_rank_table() -> [u8; NUM_TILES] {
    let mut table = [0u8; NUM_TILES];
    let mut idx = 0;
    while idx < NUM_TILES {
        let suit = idx / TILES_PER_SUIT;
        let rank_in_suit = (idx % TILES_PER_SUIT) % RANKS_PER_SUIT;
        table[idx] = (suit * RANKS_PER_SUIT + rank_in_suit) as u8 + 1;
        idx += 1;
    }
    table
}

/// Physical id to logical rank, built by construction over the whole
/// domain. Index with `id - 1`. Each rank appears at four offsets
/// (+0, +9, +18, +27 within its suit's block).
pub static RANK_TABLE: [u8; NUM_TILES] = build_rank_table();

// ---------------------------------------------------------------------------
// Tile newtype
// ---------------------------------------------------------------------------

/// A physical tile id in the range 1-108. Wraps a `u8` for type safety.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile(u8);

impl Tile {
    /// Creates a `Tile` if `id` is in range 1..=108.
    #[inline]
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id <= NUM_TILES as u8 {
            Some(Tile(id))
        } else {
            None
        }
    }

    /// Raw physical id (1-108).
    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Logical rank (1-27); four physical ids share each rank.
    #[inline]
    pub fn rank(self) -> u8 {
        RANK_TABLE[(self.0 - 1) as usize]
    }

    /// Which suit this tile belongs to.
    #[inline]
    pub fn suit(self) -> Suit {
        Suit::of_rank(self.rank())
    }

    /// 1-based number within the suit (1-9).
    #[inline]
    pub fn number(self) -> u8 {
        (self.rank() - 1) % RANKS_PER_SUIT as u8 + 1
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({}={})", self.0, rank_name(self.rank()))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(rank_name(self.rank()))
    }
}

impl serde::Serialize for Tile {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Tile {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u8::deserialize(deserializer)?;
        Tile::new(id).ok_or_else(|| serde::de::Error::custom(format!("physical tile id {id} out of range")))
    }
}

// ---------------------------------------------------------------------------
// Rank helpers
// ---------------------------------------------------------------------------

/// The four physical ids sharing a logical rank, in ascending id order.
/// Returns `None` for a value outside 1-27.
pub fn rank_tiles(rank: u8) -> Option<[Tile; 4]> {
    if !(1..=NUM_RANKS as u8).contains(&rank) {
        return None;
    }
    let suit = (rank - 1) / RANKS_PER_SUIT as u8;
    let rank_in_suit = (rank - 1) % RANKS_PER_SUIT as u8;
    let base = suit as usize * TILES_PER_SUIT + rank_in_suit as usize + 1;
    Some(std::array::from_fn(|copy| {
        Tile((base + copy * RANKS_PER_SUIT) as u8)
    }))
}

/// True if a run may start at `rank`. The last two ranks of each suit are
/// excluded so the window `rank, rank+1, rank+2` stays inside one suit.
#[inline]
pub fn run_may_start_at(rank: u8) -> bool {
    !RUN_START_EXCLUDED.contains(&rank)
}

// ---------------------------------------------------------------------------
// Display / debug helpers
// ---------------------------------------------------------------------------

/// Short names for the logical ranks.
const RANK_NAMES: [&str; NUM_RANKS] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", "1p", "2p", "3p", "4p", "5p", "6p", "7p",
    "8p", "9p", "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s",
];

/// Returns the short name for a logical rank (1-27).
/// Out-of-range values return "??".
#[inline]
pub fn rank_name(rank: u8) -> &'static str {
    rank.checked_sub(1)
        .and_then(|i| RANK_NAMES.get(i as usize))
        .copied()
        .unwrap_or("??")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
