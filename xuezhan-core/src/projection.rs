//! Per-wind display projections.
//!
//! A projection is a read-mostly snapshot of one seat combining persisted
//! seat fields with account-store profile data. Snapshots are cached per
//! `(room, wind)` with a short TTL; every mutation refreshes through the
//! `force_refresh` path so externally visible state is never stale. The
//! cache is an accelerator only and is never consulted to decide mutation
//! legality.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use xuezhan_engine::state::RoomState;
use xuezhan_engine::types::{MeldSet, SeatRole, TurnState, Wind};

use crate::store::{AccountStore, Profile, ProjectionCache};

/// How long a cached projection may serve plain reads.
pub const PROJECTION_TTL: Duration = Duration::from_secs(60);

/// Display snapshot of one seat, keyed by wind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatProjection {
    pub wind: Wind,
    pub slot: usize,
    pub user_id: Option<String>,
    pub display_name: String,
    pub avatar_ref: String,
    pub sex: u8,
    pub points: i64,
    pub dealer: bool,
    pub active: bool,
    pub avoid_suit: u8,
    pub ready: bool,
    pub hand: Vec<u8>,
    pub discards: Vec<u8>,
    pub melds: MeldSet,
    pub loose: Vec<u8>,
}

/// Placeholder used when the account collaborator cannot answer.
fn fallback_profile() -> Profile {
    Profile {
        display_name: "player".to_string(),
        avatar_ref: String::new(),
        sex: 0,
        points: 0,
    }
}

pub fn cache_key(room_id: &str, wind: Wind) -> String {
    format!("seat:{room_id}:{}", wind as u8)
}

/// Build a projection for `wind` straight from room state, degrading to a
/// placeholder profile when the account store fails.
pub fn build_projection(
    room: &RoomState,
    wind: Wind,
    accounts: &dyn AccountStore,
) -> Result<SeatProjection> {
    let slot = room.seat_of_wind(wind).ok_or_else(|| {
        anyhow::anyhow!("room {} has no seat assigned to {:?}", room.room_id, wind)
    })?;
    let seat = &room.seats[slot];
    let profile = match &seat.user_id {
        Some(user_id) => accounts.profile(user_id).unwrap_or_else(|_| fallback_profile()),
        None => fallback_profile(),
    };
    Ok(SeatProjection {
        wind,
        slot,
        user_id: seat.user_id.clone(),
        display_name: profile.display_name,
        avatar_ref: profile.avatar_ref,
        sex: profile.sex,
        points: profile.points,
        dealer: seat.role == SeatRole::Dealer,
        active: seat.turn == TurnState::Active,
        avoid_suit: seat.avoid_suit as u8,
        ready: seat.ready,
        hand: seat.hand.iter().map(|t| t.id()).collect(),
        discards: seat.discards.iter().map(|t| t.id()).collect(),
        melds: seat.melds.clone(),
        loose: seat.loose.iter().map(|t| t.id()).collect(),
    })
}

/// Fetch a projection through the cache. `force_refresh` bypasses the
/// cached entry and repopulates it; mutations always force. A cache miss
/// (or an undecodable entry) recomputes from the room state.
pub fn fetch_projection(
    room: &RoomState,
    wind: Wind,
    accounts: &dyn AccountStore,
    cache: &dyn ProjectionCache,
    force_refresh: bool,
) -> Result<SeatProjection> {
    let key = cache_key(&room.room_id, wind);
    if !force_refresh {
        if let Some(raw) = cache.get(&key) {
            if let Ok(projection) = serde_json::from_str(&raw) {
                return Ok(projection);
            }
        }
    }
    let projection = build_projection(room, wind, accounts)?;
    if let Ok(raw) = serde_json::to_string(&projection) {
        cache.set(&key, raw, PROJECTION_TTL);
    }
    Ok(projection)
}
