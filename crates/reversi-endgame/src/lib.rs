//! Exact endgame solver for 8x8 Othello/Reversi.
//!
//! Given a position with a limited number of empty squares, the solver
//! returns the final disc difference under optimal play from both sides.
//! The search is a fail-soft null-window alpha-beta with depth-specialised
//! kernels for the last few empties, parity-based move ordering, stability
//! cutoffs, a per-thread endgame cache and a shared transposition table.

pub mod bit;
pub mod bitboard;
pub mod board;
pub mod constants;
pub mod count_last_flip;
pub mod disc;
pub mod empty_list;
pub mod flip;
pub mod hash;
pub mod move_list;
pub mod search;
pub mod square;
pub mod stability;
pub mod transposition_table;
pub mod types;
mod util;

/// Builds the global lookup tables (Zobrist keys, edge stability).
///
/// Called automatically by `search::Solver::new`; safe to call more than
/// once.
pub fn init() {
    hash::init();
    stability::init();
}
