use std::sync::Arc;

use reversi_endgame::board::Board;
use reversi_endgame::disc::Disc;
use reversi_endgame::search::{Solver, SolverOptions};
use reversi_endgame::square::Square;

fn solver() -> Solver {
    Solver::new(&SolverOptions::default())
}

fn board(s: &str, side_to_move: Disc) -> Board {
    Board::from_string(s, side_to_move).unwrap()
}

/// FFO test positions (board string, side to move, exact score). Scores
/// are the published values of the FFO endgame suite.
const FFO: &[(&str, char, i32)] = &[
    // FFO #1, 14 empties
    (
        "--XXXXX--OOOXX-O-OOOXXOX-OXOXOXXOXXXOXXX--XOXOXX-XXXOOO--OOOOO--",
        'X',
        18,
    ),
    // FFO #2, 14 empties
    (
        "-XXXXXX---XOOOO--XOXXOOX-OOOOOOOOOOOXXOOOOOXXOOX--XXOO----XXXXX-",
        'X',
        10,
    ),
    // FFO #5, 13 empties
    (
        "-OOOOO----OXXO-XXXOXOXX-XXOXOXXOXXOOXOOOXXXXOO-OX-XOOO---XXXXX--",
        'X',
        32,
    ),
    // FFO #20, 6 empties
    (
        "XXXOXXXXOXXXXXXXOOXXXXXXOOOXXXXXOOOXXOO-OOOOO---OOOOOOO-OOOOOOO-",
        'X',
        6,
    ),
    // FFO #21, 15 empties
    (
        "OOOOOOOOXOOXXX--XXOOXOO-XOXOOO--XOOOOX--XOOXOO--XOOOOO--XXXX----",
        'O',
        0,
    ),
];

fn ffo_board(idx: usize) -> Board {
    let (s, stm, _) = FFO[idx];
    let disc = if stm == 'X' { Disc::Black } else { Disc::White };
    board(s, disc)
}

#[test]
fn test_ffo_positions_bit_exact() {
    let mut solver = solver();
    for (i, &(s, stm, expected)) in FFO.iter().enumerate() {
        let disc = if stm == 'X' { Disc::Black } else { Disc::White };
        let b = board(s, disc);
        let result = solver.solve(&b);
        assert_eq!(result.score, expected, "FFO case {i} ({s})");
        assert!(result.best_move.is_some(), "FFO case {i} has legal moves");
    }
}

#[test]
fn test_ffo_22_seventeen_empties() {
    // FFO #22, the deepest case in this suite.
    let b = board(
        "--OOOO--X-OOOOO-XXOOXOXXXOXOXXXXXXXOXXXX-XXOXOXX--OXXX-X----X---",
        Disc::White,
    );
    let mut solver = solver();
    assert_eq!(solver.solve(&b).score, 2);
}

#[test]
fn test_symmetry_invariance() {
    // Solving any of the eight symmetric images gives the same score.
    let b = board(
        "--O--O----OOOOO-XOOOOOOOXXOOXOOOXXXXXOXXXOXXOOXXXXXXOXOXXOOOOOOX",
        Disc::Black,
    );
    let mut solver = solver();
    let reference = solver.solve(&b).score;
    assert_eq!(reference, 28);

    for s in 1..8 {
        let image = b.symmetry(s);
        assert_eq!(
            solver.solve(&image).score,
            reference,
            "symmetry {s} changed the score"
        );
    }
}

#[test]
fn test_color_swap_negation() {
    let b = ffo_board(3); // FFO #20
    let mut solver = solver();
    let score = solver.solve(&b).score;
    let swapped_score = solver.solve(&b.switch_players()).score;
    assert_eq!(score, -swapped_score);
}

#[test]
fn test_scores_are_even() {
    // Flips move discs in pairs and leftovers go to the winner, so every
    // exact score is even.
    let mut solver = solver();
    for idx in 0..FFO.len() {
        let score = solver.solve(&ffo_board(idx)).score;
        assert_eq!(score % 2, 0, "FFO case {idx} returned an odd score");
    }
}

#[test]
fn test_full_board_boundaries() {
    let mut solver = solver();
    assert_eq!(solver.solve(&Board::from_bitboards(u64::MAX, 0)).score, 64);
    assert_eq!(solver.solve(&Board::from_bitboards(0, u64::MAX)).score, -64);
}

#[test]
fn test_pass_pass_game_over_rule() {
    let mut solver = solver();

    // Tie: equal discs, neither side can move, empties split.
    let tie = Board::from_bitboards(0xFF, 0xFF00000000000000);
    assert_eq!(solver.solve(&tie).score, 0);

    // The mover leads 16-8 with 40 dead empties: winner takes them.
    let ahead = Board::from_bitboards(0xFFFF, 0xFF00000000000000);
    assert_eq!(solver.solve(&ahead).score, 8 + 40);

    // Mirror image: behind by the same amount.
    assert_eq!(solver.solve(&ahead.switch_players()).score, -48);
}

#[test]
fn test_solved_best_move_is_legal_and_optimal() {
    let b = ffo_board(3); // FFO #20: best move H5
    let mut solver = solver();
    let result = solver.solve(&b);
    let best = result.best_move.expect("position has moves");
    assert!(b.is_legal_move(best));
    assert_eq!(best, Square::H5);

    // Playing the best move leads to a position worth exactly the
    // negated score for the opponent.
    let next = b.make_move(best);
    assert_eq!(solver.solve(&next).score, -result.score);
}

#[test]
fn test_shared_table_concurrent_solves() {
    // Four workers, one shared table, different boards per worker: the
    // core must be callable concurrently and return exact scores.
    let mut seed_solver = solver();
    let table = seed_solver.table();

    let cases: Vec<(Board, i32)> = vec![
        (ffo_board(0), 18),
        (ffo_board(1), 10),
        (ffo_board(3), 6),
        (ffo_board(4), 0),
    ];

    let mut handles = Vec::new();
    for (b, expected) in cases {
        let table = Arc::clone(&table);
        handles.push(std::thread::spawn(move || {
            let mut solver = Solver::with_shared_table(table);
            assert_eq!(solver.solve(&b).score, expected);
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_warm_table_is_consistent() {
    // Re-solving with a warm transposition table and a new generation
    // returns identical results.
    let mut solver = solver();
    let b = ffo_board(0);
    let cold = solver.solve(&b);
    let warm = solver.solve(&b);
    assert_eq!(cold.score, warm.score);
    assert_eq!(cold.best_move, warm.best_move);
    // The warm solve should not search more nodes than the cold one.
    assert!(warm.n_nodes <= cold.n_nodes);
}
