//! Collaborator boundaries: the durable room store, the read-only account
//! store, and the per-wind projection cache. Serialization of room state
//! happens only here, at the record boundary; the engine works on
//! `RoomState` values throughout.
//!
//! The in-memory implementations back tests and single-process use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use xuezhan_engine::errors::EngineError;
use xuezhan_engine::state::{RoomState, SeatState, WallState};
use xuezhan_engine::tile::{Suit, Tile};
use xuezhan_engine::types::{Meld, MeldType, SeatRole, TurnState, Wind, NUM_SEATS};

// ---------------------------------------------------------------------------
// Persisted record schema
// ---------------------------------------------------------------------------

/// Persisted form of a room. Carries the wall contents as well as the
/// remaining count so a room reloads with no ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: String,
    pub running: bool,
    pub wall_remaining: u32,
    pub wall_tiles: Vec<u8>,
    pub wall_digest: String,
    pub wall_salt: String,
    pub seed: Option<u64>,
    pub deal_index: u64,
    pub current_round: u32,
    pub total_rounds: u32,
    pub seats_assigned: bool,
    pub seats: [SeatRecord; NUM_SEATS],
    pub event_log: Vec<String>,
    pub skip_event_logging: bool,
}

/// Persisted form of one physical slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRecord {
    pub user_id: Option<String>,
    pub wind: u8,
    pub dealer: bool,
    pub avoid_suit: u8,
    pub ready: bool,
    pub active: bool,
    pub hand: Vec<u8>,
    pub discards: Vec<u8>,
    pub discard_history: Vec<u8>,
    pub runs: Vec<Vec<u8>>,
    pub triplets: Vec<Vec<u8>>,
    pub quads: Vec<Vec<u8>>,
    pub loose: Vec<u8>,
}

fn encode_tiles(tiles: &[Tile]) -> Vec<u8> {
    tiles.iter().map(|t| t.id()).collect()
}

fn decode_tiles(ids: &[u8]) -> Result<Vec<Tile>, EngineError> {
    ids.iter()
        .map(|&id| {
            Tile::new(id).ok_or_else(|| EngineError::Serialization {
                message: format!("physical tile id {id} out of range"),
            })
        })
        .collect()
}

fn encode_melds(melds: &[Meld]) -> Vec<Vec<u8>> {
    melds.iter().map(|m| encode_tiles(&m.tiles)).collect()
}

fn decode_melds(groups: &[Vec<u8>], meld_type: MeldType) -> Result<Vec<Meld>, EngineError> {
    groups
        .iter()
        .map(|ids| Ok(Meld::new(meld_type, decode_tiles(ids)?)))
        .collect()
}

impl SeatRecord {
    fn from_state(seat: &SeatState) -> Self {
        Self {
            user_id: seat.user_id.clone(),
            wind: seat.wind as u8,
            dealer: seat.role == SeatRole::Dealer,
            avoid_suit: seat.avoid_suit as u8,
            ready: seat.ready,
            active: seat.turn == TurnState::Active,
            hand: encode_tiles(&seat.hand),
            discards: encode_tiles(&seat.discards),
            discard_history: encode_tiles(&seat.discard_history),
            runs: encode_melds(&seat.melds.runs),
            triplets: encode_melds(&seat.melds.triplets),
            quads: encode_melds(&seat.melds.quads),
            loose: encode_tiles(&seat.loose),
        }
    }

    fn into_state(self) -> Result<SeatState, EngineError> {
        let mut seat = SeatState {
            user_id: self.user_id,
            wind: Wind::from(self.wind),
            role: if self.dealer {
                SeatRole::Dealer
            } else {
                SeatRole::NonDealer
            },
            turn: if self.active {
                TurnState::Active
            } else {
                TurnState::Waiting
            },
            avoid_suit: Suit::from(self.avoid_suit),
            ready: self.ready,
            hand: decode_tiles(&self.hand)?,
            discards: decode_tiles(&self.discards)?,
            discard_history: decode_tiles(&self.discard_history)?,
            ..SeatState::default()
        };
        seat.melds.runs = decode_melds(&self.runs, MeldType::Run)?;
        seat.melds.triplets = decode_melds(&self.triplets, MeldType::Triplet)?;
        seat.melds.quads = decode_melds(&self.quads, MeldType::Quad)?;
        seat.loose = decode_tiles(&self.loose)?;
        Ok(seat)
    }
}

impl RoomRecord {
    pub fn from_state(state: &RoomState) -> Self {
        Self {
            room_id: state.room_id.clone(),
            running: state.running,
            wall_remaining: state.wall.remaining() as u32,
            wall_tiles: encode_tiles(&state.wall.tiles),
            wall_digest: state.wall.wall_digest.clone(),
            wall_salt: state.wall.salt.clone(),
            seed: state.wall.seed,
            deal_index: state.wall.deal_index,
            current_round: state.current_round,
            total_rounds: state.total_rounds,
            seats_assigned: state.seats_assigned,
            seats: std::array::from_fn(|i| SeatRecord::from_state(&state.seats[i])),
            event_log: state.event_log.clone(),
            skip_event_logging: state.skip_event_logging,
        }
    }

    pub fn into_state(self) -> Result<RoomState, EngineError> {
        let wall = WallState {
            tiles: decode_tiles(&self.wall_tiles)?,
            wall_digest: self.wall_digest,
            salt: self.wall_salt,
            seed: self.seed,
            deal_index: self.deal_index,
        };
        let [s0, s1, s2, s3] = self.seats;
        let seats = [
            s0.into_state()?,
            s1.into_state()?,
            s2.into_state()?,
            s3.into_state()?,
        ];
        Ok(RoomState {
            room_id: self.room_id,
            running: self.running,
            wall,
            current_round: self.current_round,
            total_rounds: self.total_rounds,
            seats,
            seats_assigned: self.seats_assigned,
            event_log: self.event_log,
            skip_event_logging: self.skip_event_logging,
        })
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Durable room-record store.
pub trait RoomStore: Send + Sync {
    fn load(&self, room_id: &str) -> Result<Option<RoomRecord>>;
    fn save(&self, record: &RoomRecord) -> Result<()>;
}

/// Account profile served by the account collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub avatar_ref: String,
    pub sex: u8,
    pub points: i64,
}

/// Read-only account/profile lookup.
pub trait AccountStore: Send + Sync {
    fn profile(&self, user_id: &str) -> Result<Profile>;
}

/// Key-value cache with TTL for the per-wind projections. Never a source of
/// truth; callers recompute from the room record on a miss.
pub trait ProjectionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Room store shelving JSON-encoded records in a shared map.
#[derive(Default, Clone)]
pub struct MemoryRoomStore {
    rooms: Arc<Mutex<HashMap<String, String>>>,
}

impl RoomStore for MemoryRoomStore {
    fn load(&self, room_id: &str) -> Result<Option<RoomRecord>> {
        let rooms = self.rooms.lock().unwrap();
        match rooms.get(room_id) {
            Some(raw) => Ok(Some(
                serde_json::from_str(raw).context("room record decode")?,
            )),
            None => Ok(None),
        }
    }

    fn save(&self, record: &RoomRecord) -> Result<()> {
        let raw = serde_json::to_string(record).context("room record encode")?;
        self.rooms.lock().unwrap().insert(record.room_id.clone(), raw);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryAccountStore {
    profiles: Arc<Mutex<HashMap<String, Profile>>>,
}

impl MemoryAccountStore {
    pub fn insert(&self, user_id: &str, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(user_id.to_string(), profile);
    }
}

impl AccountStore for MemoryAccountStore {
    fn profile(&self, user_id: &str) -> Result<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .with_context(|| format!("no profile for {user_id}"))
    }
}

#[derive(Default, Clone)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl ProjectionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dealt_room() -> RoomState {
        let mut room = RoomState::new("record-room", Some(5), 8);
        for user in ["a", "b", "c", "d"] {
            room.add_seat(user).unwrap();
        }
        room.deal().unwrap();
        room
    }

    #[test]
    fn record_round_trips_a_running_room() {
        let room = dealt_room();
        let record = RoomRecord::from_state(&room);
        assert_eq!(record.wall_remaining, 55);
        assert_eq!(record.wall_tiles.len(), 55);

        let restored = record.into_state().unwrap();
        assert_eq!(restored.room_id, room.room_id);
        assert_eq!(restored.current_round, room.current_round);
        restored.audit_conservation().unwrap();
        for (a, b) in room.seats.iter().zip(restored.seats.iter()) {
            assert_eq!(a.user_id, b.user_id);
            assert_eq!(a.wind, b.wind);
            assert_eq!(a.hand, b.hand);
            assert_eq!(a.melds, b.melds);
            assert_eq!(a.loose, b.loose);
        }
    }

    #[test]
    fn record_rejects_corrupt_tile_ids() {
        let mut record = RoomRecord::from_state(&dealt_room());
        record.seats[0].hand.push(200);
        let err = record.into_state().unwrap_err();
        assert!(matches!(err, EngineError::Serialization { .. }), "got {err}");
    }

    #[test]
    fn memory_store_finds_saved_rooms() {
        let store = MemoryRoomStore::default();
        assert!(store.load("nowhere").unwrap().is_none());
        let record = RoomRecord::from_state(&dealt_room());
        store.save(&record).unwrap();
        let loaded = store.load("record-room").unwrap().unwrap();
        assert_eq!(loaded.wall_tiles, record.wall_tiles);
    }

    #[test]
    fn cache_entries_expire() {
        let cache = MemoryCache::default();
        cache.set("k", "v".to_string(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k").is_none());

        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn missing_profile_is_an_error() {
        let accounts = MemoryAccountStore::default();
        assert!(accounts.profile("ghost").is_err());
        accounts.insert(
            "real",
            Profile {
                display_name: "Zhao".to_string(),
                avatar_ref: "avatars/7".to_string(),
                sex: 1,
                points: 2400,
            },
        );
        assert_eq!(accounts.profile("real").unwrap().display_name, "Zhao");
    }
}
