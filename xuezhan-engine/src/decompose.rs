//! Hand grouping: quads, then triplets, then runs, then loose tiles.
//!
//! The priority is fixed and the scan is greedy with no backtracking: a rank
//! holding all four copies always leaves as a quad, a remaining rank with
//! three copies always leaves as a triplet, and only then are run windows
//! tried in ascending rank order. The result is not guaranteed to maximize
//! the number of melds; callers depend on this exact order.

use crate::tile::{run_may_start_at, Tile, NUM_RANKS};
use crate::types::{Meld, MeldSet, MeldType};

/// Result of grouping one hand. Meld tiles and `loose` together are exactly
/// the input multiset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub melds: MeldSet,
    pub loose: Vec<Tile>,
}

/// Per-rank occurrence tally over the logical ranks 1-27.
pub fn rank_tally(hand: &[Tile]) -> [u8; NUM_RANKS] {
    let mut tally = [0u8; NUM_RANKS];
    for t in hand {
        tally[(t.rank() - 1) as usize] += 1;
    }
    tally
}

/// Group a hand into quads, triplets, runs, and a loose remainder.
///
/// Idempotent for a fixed tile multiset: re-flattening the melds and loose
/// tiles and grouping again reproduces the same partition.
pub fn decompose(hand: &[Tile]) -> Decomposition {
    // Bucket tiles by rank, preserving hand order within a rank.
    let mut buckets: [Vec<Tile>; NUM_RANKS] = std::array::from_fn(|_| Vec::new());
    for &t in hand {
        buckets[(t.rank() - 1) as usize].push(t);
    }

    let mut melds = MeldSet::default();

    // Quads: every rank holding all four copies.
    for bucket in buckets.iter_mut() {
        if bucket.len() == 4 {
            melds
                .quads
                .push(Meld::new(MeldType::Quad, std::mem::take(bucket)));
        }
    }

    // Triplets from what remains.
    for bucket in buckets.iter_mut() {
        if bucket.len() == 3 {
            melds
                .triplets
                .push(Meld::new(MeldType::Triplet, std::mem::take(bucket)));
        }
    }

    // Runs: ascending greedy scan. A window r, r+1, r+2 is taken while all
    // three ranks still have material; starts inside the last two ranks of
    // a suit are excluded so no run crosses a suit boundary. A consumed
    // tile is never reused.
    for r in 0..NUM_RANKS - 2 {
        let rank = r as u8 + 1;
        if !run_may_start_at(rank) {
            continue;
        }
        while !buckets[r].is_empty() && !buckets[r + 1].is_empty() && !buckets[r + 2].is_empty() {
            let tiles = vec![
                buckets[r].remove(0),
                buckets[r + 1].remove(0),
                buckets[r + 2].remove(0),
            ];
            melds.runs.push(Meld::new(MeldType::Run, tiles));
        }
    }

    // Whatever survives is the straight-display remainder.
    let mut loose: Vec<Tile> = buckets.into_iter().flatten().collect();
    loose.sort_by_key(|t| (t.rank(), t.id()));
    Decomposition { melds, loose }
}
