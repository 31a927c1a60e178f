use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use xuezhan_engine::decompose::decompose;
use xuezhan_engine::state::RoomState;
use xuezhan_engine::types::TurnState;

fn full_room(seed: u64) -> RoomState {
    let mut room = RoomState::new("bench", Some(seed), 8);
    room.skip_event_logging = true;
    for user in ["u1", "u2", "u3", "u4"] {
        room.add_seat(user).unwrap();
    }
    room
}

fn bench_deal(c: &mut Criterion) {
    c.bench_function("shuffle_and_deal", |b| {
        let mut room = full_room(42);
        b.iter(|| {
            room.deal().unwrap();
            room.wall.remaining()
        });
    });
}

fn bench_decompose(c: &mut Criterion) {
    let mut room = full_room(7);
    room.deal().unwrap();
    let hand = room.seats[0].hand.clone();
    c.bench_function("decompose_dealt_hand", |b| b.iter(|| decompose(&hand)));
}

fn bench_discard_cycle(c: &mut Criterion) {
    c.bench_function("discard_full_wind_cycle", |b| {
        b.iter_batched(
            || {
                let mut room = full_room(9);
                room.deal().unwrap();
                room
            },
            |mut room| {
                for _ in 0..4 {
                    let slot = room
                        .seats
                        .iter()
                        .position(|s| s.turn == TurnState::Active)
                        .unwrap();
                    let rank = room.seats[slot].hand[0].rank();
                    room.discard(slot, rank).unwrap();
                }
                room
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_deal, bench_decompose, bench_discard_cycle);
criterion_main!(benches);
