//! Deterministic RNG seeding and deck generation.
//!
//! A session-level seed derives per-deal deck seeds through a SHA-256 KDF,
//! and a vendored Fisher-Yates shuffle pins the permutation, so a
//! `(seed, deal_index)` pair reproduces a deck bit-for-bit on any platform,
//! any Rust version, any thread count.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use xuezhan_engine::state::WallState;
use xuezhan_engine::tile::Tile;

/// Vendored Fisher-Yates shuffle.
///
/// Does NOT depend on `rand::seq::SliceRandom`, whose internal algorithm
/// may change across rand versions. Vendoring pins the shuffle output for a
/// given RNG state.
pub fn fisher_yates_shuffle<T>(slice: &mut [T], rng: &mut impl Rng) {
    for i in (1..slice.len()).rev() {
        let j = rng.gen_range(0..=i);
        slice.swap(i, j);
    }
}

/// SHA-256 KDF: `session seed || deal index` -> 32-byte deck seed.
pub fn derive_deal_seed(session_seed: &[u8; 32], deal_index: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(session_seed);
    hasher.update(deal_index.to_le_bytes());
    hasher.finalize().into()
}

/// Deterministic 108-tile deck for a specific deal within a session.
pub fn generate_deck(session_seed: &[u8; 32], deal_index: u64) -> Vec<Tile> {
    let seed = derive_deal_seed(session_seed, deal_index);
    let mut rng = ChaCha8Rng::from_seed(seed);
    let mut deck = WallState::build_deck();
    fisher_yates_shuffle(&mut deck, &mut rng);
    deck
}

/// Session RNG handing out decks in deal order.
#[derive(Debug, Clone)]
pub struct SessionRng {
    seed: [u8; 32],
    next_deal: u64,
}

impl SessionRng {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed, next_deal: 0 }
    }

    /// The next deterministic deck in this session's sequence.
    pub fn next_deck(&mut self) -> Vec<Tile> {
        let deck = generate_deck(&self.seed, self.next_deal);
        self.next_deal = self.next_deal.wrapping_add(1);
        deck
    }
}
