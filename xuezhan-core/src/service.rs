//! Room service: find-or-create, join, start, discard, snapshots.
//!
//! Every mutation is a load -> mutate -> save cycle serialized per room id
//! through a per-room lock, so two commands touching the same room cannot
//! interleave and break the 108-tile conservation invariant. Projections
//! are force-refreshed right after every mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use xuezhan_engine::state::RoomState;
use xuezhan_engine::tile::Tile;
use xuezhan_engine::types::Wind;

use crate::projection::{fetch_projection, SeatProjection};
use crate::store::{AccountStore, ProjectionCache, RoomRecord, RoomStore};

/// Rounds a room plays by default.
const DEFAULT_TOTAL_ROUNDS: u32 = 8;

pub struct RoomService<S, A, C> {
    rooms: S,
    accounts: A,
    cache: C,
    seed: Option<u64>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: RoomStore, A: AccountStore, C: ProjectionCache> RoomService<S, A, C> {
    pub fn new(rooms: S, accounts: A, cache: C) -> Self {
        Self {
            rooms,
            accounts,
            cache,
            seed: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Seed every room this service creates (deterministic shuffles and
    /// seat assignment). Rooms loaded from the store keep their own seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the room or create it on first reference (idempotent).
    fn load_or_create(&self, room_id: &str) -> Result<RoomState> {
        match self.rooms.load(room_id)? {
            Some(record) => Ok(record.into_state()?),
            None => Ok(RoomState::new(room_id, self.seed, DEFAULT_TOTAL_ROUNDS)),
        }
    }

    fn load_existing(&self, room_id: &str) -> Result<RoomState> {
        let record = self
            .rooms
            .load(room_id)?
            .with_context(|| format!("room {room_id} not found"))?;
        Ok(record.into_state()?)
    }

    fn persist(&self, room: &RoomState) -> Result<()> {
        self.rooms.save(&RoomRecord::from_state(room))
    }

    /// Force-refresh every assigned wind's projection after a mutation.
    fn refresh_all_projections(&self, room: &RoomState) {
        if !room.seats_assigned {
            return;
        }
        for seat in &room.seats {
            let _ = fetch_projection(room, seat.wind, &self.accounts, &self.cache, true);
        }
    }

    /// Seat `user_id` in the room, creating the room on first reference.
    /// Returns the slot taken (or already held).
    pub fn join_room(&self, room_id: &str, user_id: &str) -> Result<usize> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().unwrap();

        let mut room = self.load_or_create(room_id)?;
        let slot = room.add_seat(user_id)?;
        self.persist(&room)?;
        Ok(slot)
    }

    /// Assign winds (first start only) and deal the opening hands.
    pub fn start_game(&self, room_id: &str) -> Result<()> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().unwrap();

        let mut room = self.load_existing(room_id)?;
        room.deal()?;
        self.persist(&room)?;
        self.refresh_all_projections(&room);
        Ok(())
    }

    /// Apply a discard for `user_id`. The engine validates turn ownership
    /// and rank presence; rejections surface as `EngineError` values.
    pub fn discard(&self, room_id: &str, user_id: &str, rank: u8) -> Result<Tile> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().unwrap();

        let mut room = self.load_existing(room_id)?;
        let slot = room
            .seat_of_user(user_id)
            .with_context(|| format!("{user_id} holds no seat in {room_id}"))?;
        let tile = room.discard(slot, rank)?;
        self.persist(&room)?;

        // Externally visible state must be fresh right after the mutation.
        let wind = room.seats[slot].wind;
        let _ = fetch_projection(&room, wind, &self.accounts, &self.cache, true);
        Ok(tile)
    }

    /// Per-wind display snapshot; plain reads may be served from cache.
    pub fn seat_snapshot(
        &self,
        room_id: &str,
        wind: Wind,
        force_refresh: bool,
    ) -> Result<SeatProjection> {
        let room = self.load_existing(room_id)?;
        fetch_projection(&room, wind, &self.accounts, &self.cache, force_refresh)
    }

    /// Whole-room snapshot straight from the store.
    pub fn room_snapshot(&self, room_id: &str) -> Result<RoomState> {
        self.load_existing(room_id)
    }
}
