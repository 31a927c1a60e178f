//! Room aggregate: wall, four seats, round bookkeeping, and the event
//! journal. Every mutation flows through a `RoomState` value; no seat
//! escapes by shared reference.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde_json::{json, Value};

use crate::errors::{EngineError, EngineResult};
use crate::tile::{Suit, Tile, NUM_RANKS, NUM_TILES};
use crate::types::{SeatRole, TurnState, Wind, NUM_SEATS};

pub mod seat;
pub mod wall;

pub use seat::SeatState;
pub use wall::WallState;

/// Canonical seat tuples handed out by the one-time assignment shuffle.
/// East holds the deal and opens active; the table's avoid commitments
/// cover all three suits.
const SEAT_TUPLES: [(Wind, SeatRole, TurnState, Suit); NUM_SEATS] = [
    (Wind::East, SeatRole::Dealer, TurnState::Active, Suit::Wan),
    (Wind::South, SeatRole::NonDealer, TurnState::Waiting, Suit::Tong),
    (Wind::West, SeatRole::NonDealer, TurnState::Waiting, Suit::Tiao),
    (Wind::North, SeatRole::NonDealer, TurnState::Waiting, Suit::Wan),
];

#[derive(Debug, Clone)]
pub struct RoomState {
    /// Show-facing room identifier.
    pub room_id: String,
    pub running: bool,
    pub wall: WallState,
    pub current_round: u32,
    pub total_rounds: u32,
    pub seats: [SeatState; NUM_SEATS],
    /// Set once by `assign_seats`; winds are never re-randomized.
    pub seats_assigned: bool,
    /// Structured JSON journal, one serialized event per entry.
    pub event_log: Vec<String>,
    pub skip_event_logging: bool,
}

impl RoomState {
    pub fn new(room_id: impl Into<String>, seed: Option<u64>, total_rounds: u32) -> Self {
        Self {
            room_id: room_id.into(),
            running: false,
            wall: WallState::new(seed),
            current_round: 0,
            total_rounds,
            seats: std::array::from_fn(|_| SeatState::default()),
            seats_assigned: false,
            event_log: Vec::new(),
            skip_event_logging: false,
        }
    }

    pub fn push_event(&mut self, event: Value) {
        if self.skip_event_logging {
            return;
        }
        self.event_log.push(event.to_string());
    }

    pub fn occupied_seats(&self) -> usize {
        self.seats.iter().filter(|s| s.is_occupied()).count()
    }

    pub fn seat_of_user(&self, user_id: &str) -> Option<usize> {
        self.seats
            .iter()
            .position(|s| s.user_id.as_deref() == Some(user_id))
    }

    /// Slot currently holding `wind`; `None` before seats are assigned.
    pub fn seat_of_wind(&self, wind: Wind) -> Option<usize> {
        if !self.seats_assigned {
            return None;
        }
        self.seats.iter().position(|s| s.wind == wind)
    }

    /// Claim the first vacant slot for `user_id`. Re-joining the same user
    /// returns the slot they already hold.
    pub fn add_seat(&mut self, user_id: &str) -> EngineResult<usize> {
        if let Some(slot) = self.seat_of_user(user_id) {
            return Ok(slot);
        }
        let slot = self
            .seats
            .iter()
            .position(|s| !s.is_occupied())
            .ok_or_else(|| EngineError::InvalidState {
                message: format!("room {} already seats four players", self.room_id),
            })?;
        self.seats[slot].user_id = Some(user_id.to_string());
        self.seats[slot].ready = true;
        self.push_event(json!({"type": "seat_taken", "slot": slot, "user": user_id}));
        Ok(slot)
    }

    /// One-time random assignment of the wind/role/turn/avoid-suit tuples
    /// to the four slots. Requires a full table; later calls are no-ops.
    pub fn assign_seats(&mut self) -> EngineResult<()> {
        if self.seats_assigned {
            return Ok(());
        }
        if self.occupied_seats() < NUM_SEATS {
            return Err(EngineError::InvalidState {
                message: format!(
                    "room {} has {} of {} seats filled",
                    self.room_id,
                    self.occupied_seats(),
                    NUM_SEATS
                ),
            });
        }

        let mut order: Vec<usize> = (0..NUM_SEATS).collect();
        let mut rng = match self.wall.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        order.shuffle(&mut rng);

        for (slot, &tuple_idx) in order.iter().enumerate() {
            let (wind, role, turn, avoid) = SEAT_TUPLES[tuple_idx];
            let seat = &mut self.seats[slot];
            seat.wind = wind;
            seat.role = role;
            seat.turn = turn;
            seat.avoid_suit = avoid;
        }
        self.seats_assigned = true;

        let winds: Vec<u8> = self.seats.iter().map(|s| s.wind as u8).collect();
        self.push_event(json!({"type": "seats_assigned", "winds": winds}));
        Ok(())
    }

    /// Shuffle and deal the opening hands. The dealer's slot takes the
    /// 14-tile slice; piles and groupings reset; the dealer opens active.
    pub fn deal(&mut self) -> EngineResult<()> {
        self.assign_seats()?;
        self.wall.shuffle();
        let hands = self.wall.deal()?;

        let dealer = self
            .seats
            .iter()
            .position(|s| s.role == SeatRole::Dealer)
            .ok_or_else(|| EngineError::InvalidState {
                message: format!("room {} has no dealer", self.room_id),
            })?;

        let mut hands: Vec<Vec<Tile>> = hands.into_iter().collect();
        if dealer != 0 {
            hands.swap(0, dealer);
        }
        for (slot, hand) in hands.into_iter().enumerate() {
            self.seats[slot].take_deal(hand);
        }

        for seat in &mut self.seats {
            seat.turn = if seat.role == SeatRole::Dealer {
                TurnState::Active
            } else {
                TurnState::Waiting
            };
        }

        self.running = true;
        self.current_round += 1;

        let remaining = self.wall.remaining();
        let digest = self.wall.wall_digest.clone();
        let round = self.current_round;
        self.push_event(json!({"type": "deal", "round": round, "wall": remaining, "digest": digest}));
        Ok(())
    }

    /// Validate and apply a discard of `rank` by `slot`. The seat must hold
    /// the move and a physical copy of the rank; the first matching tile in
    /// hand order moves to both piles, the hand is regrouped, and the
    /// active flag advances clockwise by wind.
    pub fn discard(&mut self, slot: usize, rank: u8) -> EngineResult<Tile> {
        if !self.running {
            return Err(EngineError::InvalidState {
                message: format!("room {} is not running", self.room_id),
            });
        }
        if slot >= NUM_SEATS {
            return Err(EngineError::InvalidState {
                message: format!("no slot {slot}"),
            });
        }
        if self.seats[slot].turn != TurnState::Active {
            return Err(EngineError::NotYourTurn { seat: slot });
        }
        if !(1..=NUM_RANKS as u8).contains(&rank) {
            return Err(EngineError::IllegalDiscard { rank });
        }

        let tile = self.seats[slot]
            .remove_first_of_rank(rank)
            .ok_or(EngineError::IllegalDiscard { rank })?;
        {
            let seat = &mut self.seats[slot];
            seat.discards.push(tile);
            seat.discard_history.push(tile);
            seat.regroup();
        }
        self.advance_turn(slot);
        self.push_event(json!({"type": "discard", "slot": slot, "tile": tile.id(), "rank": rank}));
        Ok(tile)
    }

    /// Move the active flag clockwise by wind after a discard.
    fn advance_turn(&mut self, from_slot: usize) {
        let next_wind = self.seats[from_slot].wind.next();
        self.seats[from_slot].turn = TurnState::Waiting;
        if let Some(next) = self.seat_of_wind(next_wind) {
            self.seats[next].turn = TurnState::Active;
        }
    }

    /// Count every physical id across wall, hands, and live discard piles.
    pub fn tile_census(&self) -> [u8; NUM_TILES] {
        let mut census = [0u8; NUM_TILES];
        let mut mark = |t: &Tile| census[(t.id() - 1) as usize] += 1;
        for t in &self.wall.tiles {
            mark(t);
        }
        for seat in &self.seats {
            for t in &seat.hand {
                mark(t);
            }
            for t in &seat.discards {
                mark(t);
            }
        }
        census
    }

    /// Audit the 108-tile conservation invariant. Only meaningful while
    /// the room runs; before the first deal the wall is empty.
    pub fn audit_conservation(&self) -> EngineResult<()> {
        if !self.running {
            return Ok(());
        }
        let census = self.tile_census();
        for (idx, &count) in census.iter().enumerate() {
            if count != 1 {
                return Err(EngineError::InvalidState {
                    message: format!(
                        "tile {} appears {} times across wall/hands/discards",
                        idx + 1,
                        count
                    ),
                });
            }
        }
        Ok(())
    }
}
