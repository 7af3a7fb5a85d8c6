//! Solver driver over the endgame kernels.

pub mod endgame;
pub mod local_cache;
pub mod search_context;
pub mod spinlock;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::Board;
use crate::constants::SCORE_MAX;
use crate::move_list::MoveList;
use crate::square::Square;
use crate::transposition_table::TranspositionTable;
use crate::types::Score;
use search_context::SearchContext;

/// Construction options for [`Solver`].
pub struct SolverOptions {
    /// Transposition table size in megabytes.
    pub tt_mb_size: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions { tt_mb_size: 64 }
    }
}

/// Result of an exact solve.
#[derive(Debug)]
pub struct SolveResult {
    /// Exact disc difference under optimal play.
    pub score: Score,
    /// An optimal move, or `None` when the side to move must pass.
    pub best_move: Option<Square>,
    /// Nodes searched.
    pub n_nodes: u64,
}

/// An endgame solver owning a transposition table.
///
/// One `Solver` drives one search context at a time; for parallel
/// solving, give each worker thread its own `Solver` sharing a table via
/// [`Solver::with_shared_table`]. Hash generations distinguish
/// successive solves, so the table warms up across calls.
pub struct Solver {
    tt: Arc<TranspositionTable>,
    generation: u8,
    stop: Arc<AtomicBool>,
}

impl Solver {
    pub fn new(options: &SolverOptions) -> Solver {
        crate::init();
        Solver {
            tt: Arc::new(TranspositionTable::new(options.tt_mb_size)),
            generation: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A solver reusing an existing shared table.
    pub fn with_shared_table(tt: Arc<TranspositionTable>) -> Solver {
        crate::init();
        Solver {
            tt,
            generation: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to this solver's table, for sharing with other workers.
    pub fn table(&self) -> Arc<TranspositionTable> {
        self.tt.clone()
    }

    /// Clears the table and restarts the generation counter.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.generation = 0;
    }

    /// Requests cooperative termination of the running solve. The
    /// kernels poll the flag and unwind without storing anything; the
    /// aborted call's result is meaningless.
    pub fn abort(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn next_generation(&mut self) -> u8 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.generation = 1;
        }
        self.generation
    }

    /// Single null-window probe of `(alpha, alpha + 1)`, fail-soft.
    pub fn nws(&mut self, board: &Board, alpha: Score) -> Score {
        let generation = self.next_generation();
        let mut ctx = SearchContext::new(board, generation, self.tt.clone(), self.stop.clone());
        endgame::nws_endgame(&mut ctx, board, alpha)
    }

    /// Solves `board` exactly.
    ///
    /// The exact score is bracketed by fail-soft null-window searches:
    /// each probe turns into a proven lower or upper bound, and the
    /// bracket closes on the exact value. Othello scores are always
    /// even (flips change the difference by two and leftovers go to the
    /// winner), so the window walks the even lattice.
    pub fn solve(&mut self, board: &Board) -> SolveResult {
        self.stop.store(false, Ordering::Relaxed);
        let generation = self.next_generation();
        let mut ctx = SearchContext::new(board, generation, self.tt.clone(), self.stop.clone());

        let mut lo = -SCORE_MAX;
        let mut hi = SCORE_MAX;
        while lo < hi && !ctx.is_stopped() {
            let alpha = ((lo + hi) >> 1) & !1;
            let score = endgame::nws_endgame(&mut ctx, board, alpha);
            if ctx.is_stopped() {
                break;
            }
            if score <= alpha {
                hi = score;
            } else {
                lo = score;
            }
        }

        let score = lo;
        let best_move = if ctx.is_stopped() {
            None
        } else {
            find_best_move(&mut ctx, board, score)
        };

        SolveResult {
            score,
            best_move,
            n_nodes: ctx.n_nodes,
        }
    }
}

/// Picks a move achieving `score`, re-probing each child against the
/// warm hash tables.
fn find_best_move(ctx: &mut SearchContext, board: &Board, score: Score) -> Option<Square> {
    let move_list = MoveList::new(board);
    if move_list.count() == 0 {
        return None;
    }
    if score <= -SCORE_MAX {
        // Everything loses everything; any move is "optimal".
        return move_list.first().map(|m| m.sq);
    }

    for mv in move_list.iter() {
        let next = board.make_move_with_flipped(mv.flipped, mv.sq);
        ctx.update(mv.sq);
        let child = endgame::nws_endgame(ctx, &next, -score);
        ctx.undo(mv.sq);
        if child <= -score {
            return Some(mv.sq);
        }
    }

    move_list.first().map(|m| m.sq)
}
