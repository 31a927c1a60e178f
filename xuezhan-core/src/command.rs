//! Wire-facing command parsing and dispatch.
//!
//! An inbound unit is `{command, roomId, payload}`. The command name
//! resolves into a closed enum so dispatch is an exhaustive match; unknown
//! names get a placeholder reply rather than an error. Engine-side
//! rejections (illegal discard, wrong turn) and malformed payloads come
//! back as error replies in the JSON body, never as transport failures.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use xuezhan_engine::errors::EngineError;
use xuezhan_engine::types::Wind;

use crate::projection::SeatProjection;
use crate::service::RoomService;
use crate::store::{AccountStore, ProjectionCache, RoomStore};

/// Inbound unit from the transport collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(default)]
    pub payload: Value,
}

/// The closed set of commands the engine handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JoinRoom { user_id: String },
    StartGame,
    DiscardTile { user_id: String, rank: u8 },
    SeatSnapshot { wind: Wind, force_refresh: bool },
    RoomSnapshot,
}

impl Command {
    /// Resolve a request into a command. Unknown names come back as
    /// `Ok(None)` so the dispatcher answers with a placeholder.
    pub fn parse(request: &CommandRequest) -> Result<Option<Command>> {
        let cmd = match request.command.as_str() {
            "join_room" => Command::JoinRoom {
                user_id: payload_user(request)?,
            },
            "start_game" => Command::StartGame,
            "discard_tile" => Command::DiscardTile {
                user_id: payload_user(request)?,
                rank: payload_rank(request)?,
            },
            "seat_snapshot" => Command::SeatSnapshot {
                wind: payload_wind(request)?,
                force_refresh: request
                    .payload
                    .get("forceRefresh")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "room_snapshot" => Command::RoomSnapshot,
            _ => return Ok(None),
        };
        Ok(Some(cmd))
    }
}

fn payload_user(request: &CommandRequest) -> Result<String> {
    match request.payload.get("userId").and_then(Value::as_str) {
        Some(user) => Ok(user.to_string()),
        None => bail!("command {} needs payload.userId", request.command),
    }
}

fn payload_rank(request: &CommandRequest) -> Result<u8> {
    // Out-of-range ranks still parse; the engine answers them with an
    // illegal-discard rejection so the client gets structured feedback.
    match request.payload.get("rank").and_then(Value::as_u64) {
        Some(rank) if rank <= u8::MAX as u64 => Ok(rank as u8),
        Some(rank) => bail!("rank {rank} is not a tile rank"),
        None => bail!("command {} needs payload.rank", request.command),
    }
}

fn payload_wind(request: &CommandRequest) -> Result<Wind> {
    match request.payload.get("wind").and_then(Value::as_str) {
        Some("east") => Ok(Wind::East),
        Some("south") => Ok(Wind::South),
        Some("west") => Ok(Wind::West),
        Some("north") => Ok(Wind::North),
        Some(other) => bail!("unknown wind '{other}'"),
        None => bail!("command {} needs payload.wind", request.command),
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct JoinReply {
    message: String,
    slot: usize,
}

#[derive(Debug, Serialize)]
struct StartReply {
    message: String,
    round: u32,
    wall_remaining: usize,
}

#[derive(Debug, Serialize)]
struct DiscardReply {
    message: String,
    tile: u8,
    rank: u8,
}

#[derive(Debug, Serialize)]
struct SeatReply {
    message: String,
    seat: SeatProjection,
}

#[derive(Debug, Serialize)]
struct RoomReply {
    message: String,
    room_id: String,
    running: bool,
    round: u32,
    total_rounds: u32,
    wall_remaining: usize,
}

fn error_reply(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route one inbound request to its handler and serialize the reply.
pub fn dispatch<S, A, C>(service: &RoomService<S, A, C>, raw: &str) -> String
where
    S: RoomStore,
    A: AccountStore,
    C: ProjectionCache,
{
    let request: CommandRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(err) => return error_reply(&format!("malformed request: {err}")),
    };
    let command = match Command::parse(&request) {
        Ok(Some(command)) => command,
        Ok(None) => return error_reply(&format!("command {} not yet handled", request.command)),
        Err(err) => return error_reply(&err.to_string()),
    };
    match run_command(service, &request.room_id, command) {
        Ok(reply) => reply,
        Err(err) => match err.downcast_ref::<EngineError>() {
            Some(engine_err) => error_reply(&engine_err.to_string()),
            None => error_reply(&format!("command {} failed: {err}", request.command)),
        },
    }
}

fn run_command<S, A, C>(
    service: &RoomService<S, A, C>,
    room_id: &str,
    command: Command,
) -> Result<String>
where
    S: RoomStore,
    A: AccountStore,
    C: ProjectionCache,
{
    let reply = match command {
        Command::JoinRoom { user_id } => {
            let slot = service.join_room(room_id, &user_id)?;
            serde_json::to_string(&JoinReply {
                message: "seated".to_string(),
                slot,
            })?
        }
        Command::StartGame => {
            service.start_game(room_id)?;
            let room = service.room_snapshot(room_id)?;
            serde_json::to_string(&StartReply {
                message: "dealt".to_string(),
                round: room.current_round,
                wall_remaining: room.wall.remaining(),
            })?
        }
        Command::DiscardTile { user_id, rank } => {
            let tile = service.discard(room_id, &user_id, rank)?;
            serde_json::to_string(&DiscardReply {
                message: "discarded".to_string(),
                tile: tile.id(),
                rank,
            })?
        }
        Command::SeatSnapshot {
            wind,
            force_refresh,
        } => {
            let seat = service.seat_snapshot(room_id, wind, force_refresh)?;
            serde_json::to_string(&SeatReply {
                message: "seat".to_string(),
                seat,
            })?
        }
        Command::RoomSnapshot => {
            let room = service.room_snapshot(room_id)?;
            serde_json::to_string(&RoomReply {
                message: "room".to_string(),
                room_id: room.room_id.clone(),
                running: room.running,
                round: room.current_round,
                total_rounds: room.total_rounds,
                wall_remaining: room.wall.remaining(),
            })?
        }
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw: &str) -> CommandRequest {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn known_commands_parse() {
        let req = request(r#"{"command":"join_room","roomId":"r1","payload":{"userId":"u1"}}"#);
        assert_eq!(
            Command::parse(&req).unwrap(),
            Some(Command::JoinRoom {
                user_id: "u1".to_string()
            })
        );

        let req = request(r#"{"command":"discard_tile","roomId":"r1","payload":{"userId":"u1","rank":14}}"#);
        assert_eq!(
            Command::parse(&req).unwrap(),
            Some(Command::DiscardTile {
                user_id: "u1".to_string(),
                rank: 14
            })
        );

        let req = request(r#"{"command":"seat_snapshot","roomId":"r1","payload":{"wind":"north","forceRefresh":true}}"#);
        assert_eq!(
            Command::parse(&req).unwrap(),
            Some(Command::SeatSnapshot {
                wind: Wind::North,
                force_refresh: true
            })
        );
    }

    #[test]
    fn unknown_command_is_none() {
        let req = request(r#"{"command":"place_bet","roomId":"r1","payload":{}}"#);
        assert_eq!(Command::parse(&req).unwrap(), None);
    }

    #[test]
    fn missing_payload_fields_fail_parse() {
        let req = request(r#"{"command":"join_room","roomId":"r1","payload":{}}"#);
        assert!(Command::parse(&req).is_err());

        let req = request(r#"{"command":"discard_tile","roomId":"r1","payload":{"userId":"u1"}}"#);
        assert!(Command::parse(&req).is_err());

        let req = request(r#"{"command":"seat_snapshot","roomId":"r1","payload":{"wind":"up"}}"#);
        assert!(Command::parse(&req).is_err());
    }

    #[test]
    fn absent_payload_defaults_to_null() {
        let req = request(r#"{"command":"room_snapshot","roomId":"r1"}"#);
        assert_eq!(Command::parse(&req).unwrap(), Some(Command::RoomSnapshot));
    }
}
