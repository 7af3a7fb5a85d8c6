use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use reversi_endgame::board::Board;
use reversi_endgame::disc::Disc;
use reversi_endgame::search::{Solver, SolverOptions};

fn bench_solve_nine_empties(c: &mut Criterion) {
    let board = Board::from_string(
        "--O--O----OOOOO-XOOOOOOOXXOOXOOOXXXXXOXXXOXXOOXXXXXXOXOXXOOOOOOX",
        Disc::Black,
    )
    .unwrap();

    c.bench_function("solve_9_empties", |b| {
        let mut solver = Solver::new(&SolverOptions { tt_mb_size: 16 });
        b.iter(|| solver.solve(black_box(&board)).score)
    });
}

fn bench_solve_fourteen_empties(c: &mut Criterion) {
    let board = Board::from_string(
        "--XXXXX--OOOXX-O-OOOXXOX-OXOXOXXOXXXOXXX--XOXOXX-XXXOOO--OOOOO--",
        Disc::Black,
    )
    .unwrap();

    let mut group = c.benchmark_group("solve_deep");
    group.sample_size(10);
    group.bench_function("solve_14_empties", |b| {
        let mut solver = Solver::new(&SolverOptions::default());
        b.iter(|| solver.solve(black_box(&board)).score)
    });
    group.finish();
}

criterion_group!(benches, bench_solve_nine_empties, bench_solve_fourteen_empties);
criterion_main!(benches);
