use serde::{Deserialize, Serialize};

use crate::tile::Tile;

/// Number of seats at a table.
pub const NUM_SEATS: usize = 4;

/// Seat winds, used both as display positions and as the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wind {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl From<u8> for Wind {
    fn from(val: u8) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            3 => Wind::North,
            _ => unreachable!(),
        }
    }
}

impl Wind {
    /// The wind that acts next, clockwise around the table.
    #[inline]
    pub fn next(self) -> Wind {
        Wind::from(self as u8 + 1)
    }
}

/// Role a seat holds for the current deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeatRole {
    Dealer,
    #[default]
    NonDealer,
}

/// Per-seat turn state. The dealer opens active; a discard hands the
/// active flag to the next wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnState {
    #[default]
    Waiting,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeldType {
    Run = 0,
    Triplet = 1,
    Quad = 2,
}

/// A grouping extracted from a hand: three consecutive ranks in one suit,
/// three of a rank, or four of a rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub meld_type: MeldType,
    pub tiles: Vec<Tile>,
}

impl Meld {
    pub fn new(meld_type: MeldType, tiles: Vec<Tile>) -> Self {
        Self { meld_type, tiles }
    }

    /// Logical rank of the first tile; for runs, the start rank.
    pub fn rank(&self) -> Option<u8> {
        self.tiles.first().map(|t| t.rank())
    }
}

/// The three meld categories of one hand's grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeldSet {
    pub runs: Vec<Meld>,
    pub triplets: Vec<Meld>,
    pub quads: Vec<Meld>,
}

impl MeldSet {
    pub fn clear(&mut self) {
        self.runs.clear();
        self.triplets.clear();
        self.quads.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() && self.triplets.is_empty() && self.quads.is_empty()
    }

    /// Total tiles consumed across all melds.
    pub fn tile_count(&self) -> usize {
        self.iter_tiles().count()
    }

    /// Every tile referenced by a meld, runs first, then triplets, quads.
    pub fn iter_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.runs
            .iter()
            .chain(self.triplets.iter())
            .chain(self.quads.iter())
            .flat_map(|m| m.tiles.iter().copied())
    }
}
