use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use reversi_endgame::bitboard;
use reversi_endgame::count_last_flip::count_last_flip;
use reversi_endgame::flip;
use reversi_endgame::square::Square;
use reversi_endgame::stability;

fn bench_get_moves(c: &mut Criterion) {
    let p = Square::D5.bitboard() | Square::E4.bitboard();
    let o = Square::D4.bitboard() | Square::E5.bitboard();

    c.bench_function("bitboard_get_moves", |b| {
        b.iter(|| bitboard::get_moves(black_box(p), black_box(o)))
    });
}

fn bench_flip(c: &mut Criterion) {
    let p = 0x003C24243C000000u64;
    let o = 0x00C3DBDBC300FF00u64;

    c.bench_function("flip", |b| {
        b.iter(|| flip::flip(black_box(Square::D1), black_box(p), black_box(o)))
    });
}

fn bench_count_last_flip(c: &mut Criterion) {
    let p = 0xFEFFFFFFFFFFFF7Fu64 & !Square::E4.bitboard();

    c.bench_function("count_last_flip", |b| {
        b.iter(|| count_last_flip(black_box(p), black_box(Square::E4)))
    });
}

fn bench_stability(c: &mut Criterion) {
    reversi_endgame::init();
    let p = 0x000000000000FFFFu64;
    let o = 0xFFFF000000000000u64;

    c.bench_function("stability_stable_discs", |b| {
        b.iter(|| stability::get_stable_discs(black_box(p), black_box(o)))
    });
}

criterion_group!(
    benches,
    bench_get_moves,
    bench_flip,
    bench_count_last_flip,
    bench_stability
);
criterion_main!(benches);
