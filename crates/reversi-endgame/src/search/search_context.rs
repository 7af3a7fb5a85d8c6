use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::Board;
use crate::constants::NO_SELECTIVITY;
use crate::empty_list::EmptyList;
use crate::square::Square;
use crate::transposition_table::TranspositionTable;
use crate::types::Selectivity;

/// Per-thread search state.
///
/// One context belongs to exactly one worker; everything in it is
/// thread-local except the shared transposition table handle and the
/// cooperative stop flag. The empty list is mutated on the way down the
/// tree and restored in reverse order on the way back up.
pub struct SearchContext {
    /// Nodes searched by this context.
    pub n_nodes: u64,
    /// Transposition table generation for entry aging.
    pub generation: u8,
    /// Selectivity recorded with stored results; the endgame solver is
    /// exact, so this stays at `NO_SELECTIVITY`.
    pub selectivity: Selectivity,
    /// Empty squares of the current position, in strategic order.
    pub empty_list: EmptyList,
    /// Shared transposition table.
    pub tt: Arc<TranspositionTable>,
    stop: Arc<AtomicBool>,
}

impl SearchContext {
    /// Creates a context rooted at `board`.
    pub fn new(
        board: &Board,
        generation: u8,
        tt: Arc<TranspositionTable>,
        stop: Arc<AtomicBool>,
    ) -> SearchContext {
        debug_assert!(board.player & board.opponent == 0, "overlapping board");
        SearchContext {
            n_nodes: 0,
            generation,
            selectivity: NO_SELECTIVITY,
            empty_list: EmptyList::new(board),
            tt,
            stop,
        }
    }

    /// Records a move: counts the node and unlinks its square.
    #[inline]
    pub fn update(&mut self, sq: Square) {
        self.increment_nodes();
        self.empty_list.remove(sq);
    }

    /// Undoes a move by restoring its square. Must mirror `update`
    /// calls in exact reverse order.
    #[inline]
    pub fn undo(&mut self, sq: Square) {
        self.empty_list.restore(sq);
    }

    /// Records a pass (a node without a board change).
    #[inline]
    pub fn update_pass(&mut self) {
        self.increment_nodes();
    }

    /// Undoes a pass.
    #[inline]
    pub fn undo_pass(&mut self) {}

    #[inline]
    pub fn increment_nodes(&mut self) {
        self.n_nodes += 1;
    }

    /// Whether an external watchdog has requested termination. Kernels
    /// poll this at entry and return `alpha` unchanged when set; such a
    /// result is never stored in any hash table.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(board: &Board) -> SearchContext {
        SearchContext::new(
            board,
            1,
            Arc::new(TranspositionTable::new(0)),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn test_update_undo() {
        let board = Board::new();
        let mut ctx = context(&board);
        let parity = ctx.empty_list.parity;

        ctx.update(Square::D3);
        assert_eq!(ctx.empty_list.count, 59);
        assert_eq!(ctx.n_nodes, 1);
        assert_ne!(ctx.empty_list.parity, parity);

        ctx.undo(Square::D3);
        assert_eq!(ctx.empty_list.count, 60);
        assert_eq!(ctx.empty_list.parity, parity);
    }

    #[test]
    fn test_stop_flag() {
        let board = Board::new();
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = SearchContext::new(
            &board,
            1,
            Arc::new(TranspositionTable::new(0)),
            stop.clone(),
        );

        assert!(!ctx.is_stopped());
        stop.store(true, Ordering::Relaxed);
        assert!(ctx.is_stopped());
    }
}
