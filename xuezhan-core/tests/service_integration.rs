//! Command-level integration tests: JSON in, JSON out, through the full
//! service stack (store, cache, accounts, engine).

use serde_json::Value;

use xuezhan_core::command::dispatch;
use xuezhan_core::service::RoomService;
use xuezhan_core::store::{MemoryAccountStore, MemoryCache, MemoryRoomStore, Profile};
use xuezhan_engine::types::TurnState;

type Service = RoomService<MemoryRoomStore, MemoryAccountStore, MemoryCache>;

fn service_with_profiles() -> Service {
    let accounts = MemoryAccountStore::default();
    for (user, name) in [("u1", "Mei"), ("u2", "Jun"), ("u3", "Lan")] {
        accounts.insert(
            user,
            Profile {
                display_name: name.to_string(),
                avatar_ref: format!("avatars/{user}"),
                sex: 0,
                points: 1500,
            },
        );
    }
    // u4 deliberately has no profile; projections must degrade.
    RoomService::new(MemoryRoomStore::default(), accounts, MemoryCache::default()).with_seed(42)
}

fn send(svc: &Service, raw: &str) -> Value {
    serde_json::from_str(&dispatch(svc, raw)).expect("replies are JSON")
}

fn seat_and_start(svc: &Service) {
    for user in ["u1", "u2", "u3", "u4"] {
        let reply = send(
            svc,
            &format!(r#"{{"command":"join_room","roomId":"r1","payload":{{"userId":"{user}"}}}}"#),
        );
        assert_eq!(reply["message"], "seated");
    }
    let reply = send(svc, r#"{"command":"start_game","roomId":"r1","payload":{}}"#);
    assert_eq!(reply["message"], "dealt");
    assert_eq!(reply["wall_remaining"], 55);
    assert_eq!(reply["round"], 1);
}

/// The active seat's user id and a rank guaranteed to be in its hand.
fn active_user_and_rank(svc: &Service) -> (String, u8, usize) {
    let room = svc.room_snapshot("r1").unwrap();
    let slot = room
        .seats
        .iter()
        .position(|s| s.turn == TurnState::Active)
        .unwrap();
    let user = room.seats[slot].user_id.clone().unwrap();
    let rank = room.seats[slot].hand[0].rank();
    (user, rank, slot)
}

#[test]
fn full_flow_join_start_discard() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let (user, rank, slot) = active_user_and_rank(&svc);
    let reply = send(
        &svc,
        &format!(
            r#"{{"command":"discard_tile","roomId":"r1","payload":{{"userId":"{user}","rank":{rank}}}}}"#
        ),
    );
    assert_eq!(reply["message"], "discarded");
    assert_eq!(reply["rank"], rank);

    let room = svc.room_snapshot("r1").unwrap();
    assert_eq!(room.seats[slot].discards.len(), 1);
    assert_eq!(room.seats[slot].turn, TurnState::Waiting);
    room.audit_conservation().unwrap();
}

#[test]
fn unknown_command_gets_a_placeholder() {
    let svc = service_with_profiles();
    let reply = send(&svc, r#"{"command":"place_bet","roomId":"r1","payload":{}}"#);
    assert_eq!(reply["message"], "command place_bet not yet handled");
}

#[test]
fn malformed_request_gets_an_error_reply() {
    let svc = service_with_profiles();
    let reply = send(&svc, "{not json");
    let message = reply["message"].as_str().unwrap();
    assert!(message.starts_with("malformed request"), "got {message}");

    let reply = send(&svc, r#"{"command":"join_room","roomId":"r1","payload":{}}"#);
    let message = reply["message"].as_str().unwrap();
    assert!(message.contains("userId"), "got {message}");
}

#[test]
fn illegal_discard_is_reported_not_applied() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let room = svc.room_snapshot("r1").unwrap();
    let slot = room
        .seats
        .iter()
        .position(|s| s.turn == TurnState::Active)
        .unwrap();
    let user = room.seats[slot].user_id.clone().unwrap();
    let tally = xuezhan_engine::decompose::rank_tally(&room.seats[slot].hand);
    let missing = (1..=27u8).find(|&r| tally[r as usize - 1] == 0).unwrap();

    let reply = send(
        &svc,
        &format!(
            r#"{{"command":"discard_tile","roomId":"r1","payload":{{"userId":"{user}","rank":{missing}}}}}"#
        ),
    );
    let message = reply["message"].as_str().unwrap();
    assert!(message.contains("Illegal discard"), "got {message}");

    let reloaded = svc.room_snapshot("r1").unwrap();
    assert!(reloaded.seats[slot].discards.is_empty());
    assert_eq!(reloaded.seats[slot].hand.len(), 14);
}

#[test]
fn off_turn_discard_is_rejected() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let room = svc.room_snapshot("r1").unwrap();
    let waiting = room
        .seats
        .iter()
        .position(|s| s.turn == TurnState::Waiting)
        .unwrap();
    let user = room.seats[waiting].user_id.clone().unwrap();
    let rank = room.seats[waiting].hand[0].rank();

    let reply = send(
        &svc,
        &format!(
            r#"{{"command":"discard_tile","roomId":"r1","payload":{{"userId":"{user}","rank":{rank}}}}}"#
        ),
    );
    let message = reply["message"].as_str().unwrap();
    assert!(message.contains("turn"), "got {message}");
}

#[test]
fn seat_snapshot_serves_profiles_and_degrades() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let known: Vec<String> = vec!["Mei".into(), "Jun".into(), "Lan".into()];
    let mut degraded = 0;
    for wind in ["east", "south", "west", "north"] {
        let reply = send(
            &svc,
            &format!(
                r#"{{"command":"seat_snapshot","roomId":"r1","payload":{{"wind":"{wind}"}}}}"#
            ),
        );
        assert_eq!(reply["message"], "seat");
        let name = reply["seat"]["display_name"].as_str().unwrap();
        if name == "player" {
            degraded += 1;
        } else {
            assert!(known.contains(&name.to_string()), "unexpected name {name}");
        }
    }
    // Exactly the profile-less u4 degrades to the placeholder.
    assert_eq!(degraded, 1);
}

#[test]
fn snapshots_are_fresh_right_after_a_discard() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let (user, rank, slot) = active_user_and_rank(&svc);
    let room = svc.room_snapshot("r1").unwrap();
    let wind = format!("{:?}", room.seats[slot].wind).to_lowercase();

    // Warm the cache with the pre-discard view.
    let before = send(
        &svc,
        &format!(r#"{{"command":"seat_snapshot","roomId":"r1","payload":{{"wind":"{wind}"}}}}"#),
    );
    assert_eq!(before["seat"]["hand"].as_array().unwrap().len(), 14);

    send(
        &svc,
        &format!(
            r#"{{"command":"discard_tile","roomId":"r1","payload":{{"userId":"{user}","rank":{rank}}}}}"#
        ),
    );

    // A plain (cache-served) read already sees the mutation because the
    // discard force-refreshed the projection.
    let after = send(
        &svc,
        &format!(r#"{{"command":"seat_snapshot","roomId":"r1","payload":{{"wind":"{wind}"}}}}"#),
    );
    assert_eq!(after["seat"]["hand"].as_array().unwrap().len(), 13);
    assert_eq!(after["seat"]["discards"].as_array().unwrap().len(), 1);
}

#[test]
fn room_snapshot_reports_counters() {
    let svc = service_with_profiles();
    seat_and_start(&svc);

    let reply = send(&svc, r#"{"command":"room_snapshot","roomId":"r1","payload":{}}"#);
    assert_eq!(reply["message"], "room");
    assert_eq!(reply["room_id"], "r1");
    assert_eq!(reply["running"], true);
    assert_eq!(reply["round"], 1);
    assert_eq!(reply["wall_remaining"], 55);
}

#[test]
fn commands_for_missing_rooms_fail_softly() {
    let svc = service_with_profiles();
    let reply = send(&svc, r#"{"command":"start_game","roomId":"ghost","payload":{}}"#);
    let message = reply["message"].as_str().unwrap();
    assert!(message.contains("failed"), "got {message}");
}
