use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use engine_core::{Game, Player};
use games_tictactoe::{State, TicTacToe};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_next_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_next_state");
    group.bench_function("place_center", |b| {
        let game = TicTacToe::new();
        let base_state = game.initial_state();
        b.iter_batched(
            || base_state,
            |state| black_box(game.next_state(&state, 4, Player::One)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_terminal_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_terminal");
    group.bench_function("random_playout", |b| {
        let game = TicTacToe::new();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        b.iter(|| {
            let mut state = game.initial_state();
            let mut player = Player::One;
            loop {
                let moves = state.legal_moves();
                let action = *moves.choose(&mut rng).unwrap();
                state = game.next_state(&state, action, player);
                let (value, done) = game.value_and_terminated(&state, Some(action));
                if done {
                    break black_box(value);
                }
                player = player.opponent();
            }
        });
    });
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("tictactoe_encoding");

    group.bench_function("encode_single", |b| {
        let game = TicTacToe::new();
        let state = State::new().place(4, Player::One);
        b.iter(|| black_box(game.encode(&state)));
    });

    group.bench_function("encode_batch_64", |b| {
        let game = TicTacToe::new();
        let states = vec![State::new(); 64];
        let refs: Vec<&State> = states.iter().collect();
        b.iter(|| black_box(game.encode_batch(&refs)));
    });

    group.finish();
}

criterion_group!(benches, bench_next_state, bench_terminal_check, bench_encode);
criterion_main!(benches);
