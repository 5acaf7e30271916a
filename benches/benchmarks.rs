use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use diana_chess::perft::perft;
use diana_chess::GameState;

const MIDGAME_LAYOUT: &str = "r2k1r/pbp1pp/1pn3/3P2/PP1N1P/R1BK1R w KQkq";

pub fn bench_legal_moves_from_start(c: &mut Criterion) {
    let state = GameState::new();
    c.bench_function("legal moves from start", |b| {
        b.iter(|| black_box(&state).legal_moves())
    });
}

pub fn bench_legal_moves_midgame(c: &mut Criterion) {
    let state = GameState::from_layout(MIDGAME_LAYOUT).unwrap();
    c.bench_function("legal moves midgame", |b| {
        b.iter(|| black_box(&state).legal_moves())
    });
}

pub fn bench_perft_3(c: &mut Criterion) {
    let mut state = GameState::new();
    c.bench_function("perft 3 from start", |b| {
        b.iter(|| perft(&mut state, black_box(3)))
    });
}

pub fn bench_random_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat-sampling");
    group.sample_size(20);
    group.bench_function("random game to the end", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(black_box(42));
            let mut state = GameState::new();
            while state.move_log().len() < 300 {
                let moves = state.get_valid_moves_with(&mut rng);
                let Some(mv) = moves.choose(&mut rng) else {
                    break;
                };
                state.make_move_unchecked(mv);
                if state.is_threefold() || state.is_draw() {
                    break;
                }
            }
            state
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_legal_moves_from_start,
    bench_legal_moves_midgame,
    bench_perft_3,
    bench_random_game,
);
criterion_main!(benches);
