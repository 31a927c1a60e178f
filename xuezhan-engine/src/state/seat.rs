use crate::decompose::decompose;
use crate::tile::{rank_tiles, Suit, Tile};
use crate::types::{MeldSet, SeatRole, TurnState, Wind};

/// One physical slot at the table.
#[derive(Debug, Clone, Default)]
pub struct SeatState {
    /// Occupant account id; `None` while the slot is vacant.
    pub user_id: Option<String>,
    pub wind: Wind,
    pub role: SeatRole,
    pub turn: TurnState,
    /// The suit this seat has committed to discarding entirely.
    /// Bookkeeping only; nothing enforces the commitment.
    pub avoid_suit: Suit,
    pub ready: bool,
    /// Concealed tiles, ascending by logical rank.
    pub hand: Vec<Tile>,
    /// Live pile, in discard order.
    pub discards: Vec<Tile>,
    /// Permanent record of every discard; never trimmed or re-grouped.
    pub discard_history: Vec<Tile>,
    /// Derived grouping of the hand; refreshed after every mutation.
    pub melds: MeldSet,
    /// Straight-display remainder of the grouping.
    pub loose: Vec<Tile>,
}

impl SeatState {
    pub fn is_occupied(&self) -> bool {
        self.user_id.is_some()
    }

    /// Install a freshly dealt hand, clearing the piles and regrouping.
    pub fn take_deal(&mut self, hand: Vec<Tile>) {
        self.hand = hand;
        self.discards.clear();
        self.discard_history.clear();
        self.regroup();
    }

    /// Re-run the grouping over the current hand.
    pub fn regroup(&mut self) {
        let d = decompose(&self.hand);
        self.melds = d.melds;
        self.loose = d.loose;
    }

    /// Remove the first tile in hand order matching any physical copy of
    /// `rank`. Returns `None` when the rank is absent (or out of range).
    pub fn remove_first_of_rank(&mut self, rank: u8) -> Option<Tile> {
        let candidates = rank_tiles(rank)?;
        let idx = self.hand.iter().position(|t| candidates.contains(t))?;
        Some(self.hand.remove(idx))
    }
}
