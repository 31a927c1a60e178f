use rand::prelude::*;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{Tile, NUM_TILES};
use crate::types::NUM_SEATS;

/// Tiles consumed by the opening deal: 14 to the dealer, 13 to each other.
pub const DEAL_TILES: usize = 53;

/// Hand sizes handed out by the opening deal, dealer first.
pub const DEAL_SPLIT: [usize; NUM_SEATS] = [14, 13, 13, 13];

/// The physical deck and its audit trail.
#[derive(Debug, Clone)]
pub struct WallState {
    /// Undealt tiles, next draw at the front.
    pub tiles: Vec<Tile>,
    pub wall_digest: String,
    pub salt: String,
    pub seed: Option<u64>,
    pub deal_index: u64,
}

impl WallState {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            tiles: Vec::new(),
            wall_digest: String::new(),
            salt: String::new(),
            seed,
            deal_index: 0,
        }
    }

    /// The 108 physical ids, each exactly once, in id order.
    pub fn build_deck() -> Vec<Tile> {
        (1..=NUM_TILES as u8).filter_map(Tile::new).collect()
    }

    /// Shuffle a fresh deck into the wall, stamping a salt and a SHA-256
    /// digest of the resulting order for audit.
    pub fn shuffle(&mut self) {
        let mut deck = Self::build_deck();

        let mut rng = if let Some(seed) = self.seed {
            let deal_seed = splitmix64(seed.wrapping_add(self.deal_index));
            StdRng::seed_from_u64(deal_seed)
        } else {
            StdRng::from_entropy()
        };
        self.deal_index = self.deal_index.wrapping_add(1);

        deck.shuffle(&mut rng);
        self.salt = format!("{:016x}", rng.next_u64());

        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        for t in &deck {
            hasher.update([t.id()]);
        }
        self.wall_digest = format!("{:x}", hasher.finalize());

        self.tiles = deck;
    }

    /// Install an externally derived deck (deterministic session seeding).
    pub fn load(&mut self, deck: Vec<Tile>) {
        self.salt.clear();
        let mut hasher = Sha256::new();
        for t in &deck {
            hasher.update([t.id()]);
        }
        self.wall_digest = format!("{:x}", hasher.finalize());
        self.tiles = deck;
    }

    /// Split the wall into the four opening hands: contiguous slices of
    /// 14/13/13/13 off the top, each sorted ascending by logical rank.
    /// Dealing from fewer than 53 tiles is a precondition violation.
    pub fn deal(&mut self) -> EngineResult<[Vec<Tile>; NUM_SEATS]> {
        if self.tiles.len() < DEAL_TILES {
            return Err(EngineError::Deal {
                message: format!(
                    "wall holds {} tiles, dealing needs {}",
                    self.tiles.len(),
                    DEAL_TILES
                ),
            });
        }
        let mut hands: [Vec<Tile>; NUM_SEATS] = std::array::from_fn(|_| Vec::new());
        let mut offset = 0;
        for (slot, &take) in DEAL_SPLIT.iter().enumerate() {
            let mut hand: Vec<Tile> = self.tiles[offset..offset + take].to_vec();
            hand.sort_by_key(|t| (t.rank(), t.id()));
            hands[slot] = hand;
            offset += take;
        }
        self.tiles.drain(..DEAL_TILES);
        Ok(hands)
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
