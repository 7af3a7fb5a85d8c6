//! Endgame null-window search kernels.
//!
//! Reference: https://github.com/abulmo/edax-reversi/blob/master/src/endgame.c
//!
//! The solver is layered by empty count. The last four empties run
//! hand-specialised kernels over the empties list with parity ordering;
//! five and six empties run a hash-free shallow search; seven to ten
//! empties add the per-thread endgame cache with solid-opponent key
//! normalization; above that the shared transposition table, move
//! evaluation and enhanced transposition cutoffs take over. Every layer
//! returns an exact fail-soft null-window result: a score at or below
//! alpha is an upper bound, anything above is a lower bound, and the
//! value is exact when the window would have contained it.

use std::cell::RefCell;
use std::cmp::Ordering;

use crate::bitboard;
use crate::board::Board;
use crate::constants::{
    DEPTH_TO_SHALLOW_SEARCH, DEPTH_TO_USE_LOCAL_HASH, MASK_SOLID_DEPTH, SCORE_INF, SCORE_MAX,
};
use crate::count_last_flip::count_last_flip;
use crate::empty_list;
use crate::flip;
use crate::move_list::MoveList;
use crate::search::local_cache::{Bound, LocalCache};
use crate::search::search_context::SearchContext;
use crate::square::Square;
use crate::stability;
use crate::types::{Depth, Score};

/// Squares of the quadrants selected by each 4-bit parity pattern.
const fn quadrant_masks() -> [u64; 16] {
    let mut masks = [0u64; 16];
    let mut pattern = 0;
    while pattern < 16 {
        let mut index = 0;
        while index < 64 {
            if pattern as u8 & empty_list::quadrant_of(index) != 0 {
                masks[pattern] |= 1u64 << index;
            }
            index += 1;
        }
        pattern += 1;
    }
    masks
}

static QUADRANT_MASK: [u64; 16] = quadrant_masks();

/// log2 size of the per-thread endgame cache.
const LOCAL_CACHE_BITS: u32 = 16;

thread_local! {
    static LOCAL_CACHE: RefCell<LocalCache> =
        RefCell::new(LocalCache::new(LOCAL_CACHE_BITS));
}

/// Main entry: solves the null window `(alpha, alpha + 1)` exactly,
/// routing on the number of empty squares.
///
/// Two consecutive calls with the same arguments return the same score,
/// and `nws_endgame(swap(b), -alpha - 1) == -nws_endgame(b, alpha)`.
pub fn nws_endgame(ctx: &mut SearchContext, board: &Board, alpha: Score) -> Score {
    debug_assert!((-SCORE_MAX..SCORE_MAX).contains(&alpha));
    debug_assert!(board.player & board.opponent == 0);
    debug_assert_eq!(board.get_empty_count(), ctx.empty_list.count);

    match ctx.empty_list.count {
        0 => search_solve_0(board),
        1 => {
            let x1 = ctx.empty_list.first();
            solve_1(ctx, board, alpha, x1)
        }
        2 => {
            let x1 = ctx.empty_list.first();
            let x2 = ctx.empty_list.next(x1);
            solve_2(ctx, board, alpha, x1, x2)
        }
        3 => {
            let x1 = ctx.empty_list.first();
            let x2 = ctx.empty_list.next(x1);
            let x3 = ctx.empty_list.next(x2);
            solve_3(ctx, board, alpha, x1, x2, x3)
        }
        4 => {
            let (x1, x2, x3, x4) = sort_empties_at_4(ctx);
            solve_4(ctx, board, alpha, x1, x2, x3, x4)
        }
        n if n <= DEPTH_TO_SHALLOW_SEARCH => shallow_search(ctx, board, alpha),
        n if n <= DEPTH_TO_USE_LOCAL_HASH => null_window_search_local(ctx, board, alpha),
        _ => null_window_search(ctx, board, alpha),
    }
}

/// Final score of a full board.
#[inline(always)]
pub fn search_solve_0(board: &Board) -> Score {
    board.get_player_count() as Score * 2 - SCORE_MAX
}

/// Resolves a position where neither side can move.
#[inline(always)]
pub fn search_solve(ctx: &SearchContext, board: &Board) -> Score {
    board_solve(board, ctx.empty_list.count)
}

/// Final score of a finished game with `n_empties` squares left over.
/// On a tie the empties split evenly (score 0); otherwise they are
/// credited to the winner.
#[inline(always)]
pub fn board_solve(board: &Board, n_empties: u32) -> Score {
    let score = board.get_player_count() as Score * 2 - SCORE_MAX;
    let diff = score + n_empties as Score;

    match diff.cmp(&0) {
        Ordering::Equal => diff,
        Ordering::Greater => diff + n_empties as Score,
        Ordering::Less => score,
    }
}

/// Plays `sq` if the move flips anything. No adjacency pre-test: the
/// flip primitive returns zero for illegal squares and the last-empties
/// kernels probe squares straight off the empties list.
#[inline(always)]
fn play_at(board: &Board, sq: Square) -> Option<Board> {
    let flipped = flip::flip(sq, board.player, board.opponent);
    if flipped == 0 {
        None
    } else {
        Some(board.make_move_with_flipped(flipped, sq))
    }
}

/// Exact score with one empty square left.
///
/// Lazy high-cut form: the stand-pat score assuming the player moves is
/// computed first, and the opponent's reply is only counted when that
/// score beats alpha. `count_last_flip` returns doubled counts, so no
/// `2 *` appears in the arithmetic.
#[inline(always)]
fn solve_1(ctx: &mut SearchContext, board: &Board, alpha: Score, x: Square) -> Score {
    ctx.increment_nodes();
    let mut score = board.get_player_count() as Score * 2 - 64 + 2;
    let mut n_flipped = count_last_flip(board.player, x);
    score += n_flipped;

    if n_flipped == 0 {
        // player passes
        let score2 = score - 2;
        if score <= 0 {
            score = score2;
        }

        if score > alpha {
            n_flipped = count_last_flip(board.opponent, x);
            if n_flipped != 0 {
                score = score2 - n_flipped;
            }
            // both pass: the empty goes to the winner, already folded
            // into score/score2 above
        }
    }

    score
}

/// Exact score with two empty squares left.
#[inline(always)]
fn solve_2(
    ctx: &mut SearchContext,
    board: &Board,
    alpha: Score,
    x1: Square,
    x2: Square,
) -> Score {
    ctx.increment_nodes();
    let beta = alpha + 1;

    // player moves
    if let Some(next) = play_at(board, x1) {
        let best_score = -solve_1(ctx, &next, -beta, x2);
        if best_score > alpha {
            return best_score;
        }
        if let Some(next) = play_at(board, x2) {
            let score = -solve_1(ctx, &next, -beta, x1);
            return score.max(best_score);
        }
        return best_score;
    } else if let Some(next) = play_at(board, x2) {
        return -solve_1(ctx, &next, -beta, x1);
    }

    // opponent moves
    ctx.increment_nodes();
    let pass = board.switch_players();
    if let Some(next) = play_at(&pass, x1) {
        let best_score = solve_1(ctx, &next, alpha, x2);
        if best_score <= alpha {
            return best_score;
        }
        if let Some(next) = play_at(&pass, x2) {
            let score = solve_1(ctx, &next, alpha, x1);
            return score.min(best_score);
        }
        return best_score;
    } else if let Some(next) = play_at(&pass, x2) {
        return solve_1(ctx, &next, alpha, x1);
    }

    // both players pass
    board_solve(board, 2)
}

/// Exact score with three empty squares left.
fn solve_3(
    ctx: &mut SearchContext,
    board: &Board,
    alpha: Score,
    x1: Square,
    x2: Square,
    x3: Square,
) -> Score {
    ctx.increment_nodes();
    let beta = alpha + 1;
    let mut best_score = -SCORE_INF;

    // player moves
    if let Some(next) = play_at(board, x1) {
        best_score = -solve_2(ctx, &next, -beta, x2, x3);
        if best_score > alpha {
            return best_score;
        }
    }

    if let Some(next) = play_at(board, x2) {
        let score = -solve_2(ctx, &next, -beta, x1, x3);
        if score > alpha {
            return score;
        }
        best_score = score.max(best_score);
    }

    if let Some(next) = play_at(board, x3) {
        let score = -solve_2(ctx, &next, -beta, x1, x2);
        return score.max(best_score);
    }

    if best_score != -SCORE_INF {
        return best_score;
    }

    // opponent moves
    ctx.increment_nodes();
    best_score = SCORE_INF;
    let pass = board.switch_players();

    if let Some(next) = play_at(&pass, x1) {
        best_score = solve_2(ctx, &next, alpha, x2, x3);
        if best_score <= alpha {
            return best_score;
        }
    }

    if let Some(next) = play_at(&pass, x2) {
        let score = solve_2(ctx, &next, alpha, x1, x3);
        if score <= alpha {
            return score;
        }
        best_score = score.min(best_score);
    }

    if let Some(next) = play_at(&pass, x3) {
        let score = solve_2(ctx, &next, alpha, x1, x2);
        return score.min(best_score);
    }

    if best_score != SCORE_INF {
        return best_score;
    }

    board_solve(board, 3)
}

/// Exact score with four empty squares left, visited in the order the
/// parity sort produced.
fn solve_4(
    ctx: &mut SearchContext,
    board: &Board,
    alpha: Score,
    x1: Square,
    x2: Square,
    x3: Square,
    x4: Square,
) -> Score {
    let beta = alpha + 1;
    let mut best_score = -SCORE_INF;

    if let Some(next) = play_at(board, x1) {
        best_score = -solve_3(ctx, &next, -beta, x2, x3, x4);
        if best_score > alpha {
            return best_score;
        }
    }

    if let Some(next) = play_at(board, x2) {
        let score = -solve_3(ctx, &next, -beta, x1, x3, x4);
        if score > alpha {
            return score;
        }
        best_score = score.max(best_score);
    }

    if let Some(next) = play_at(board, x3) {
        let score = -solve_3(ctx, &next, -beta, x1, x2, x4);
        if score > alpha {
            return score;
        }
        best_score = score.max(best_score);
    }

    if let Some(next) = play_at(board, x4) {
        let score = -solve_3(ctx, &next, -beta, x1, x2, x3);
        return score.max(best_score);
    }

    if best_score == -SCORE_INF {
        let pass = board.switch_players();
        if pass.has_legal_moves() {
            best_score = -solve_4(ctx, &pass, -beta, x1, x2, x3, x4);
        } else {
            best_score = board_solve(board, 4);
        }
    }

    best_score
}

/// Orders the four remaining empties by quadrant parity: squares in
/// odd quadrants are statistically likelier to be the last move of
/// their quadrant, so they are tried first.
#[inline(always)]
fn sort_empties_at_4(ctx: &SearchContext) -> (Square, Square, Square, Square) {
    let x1 = ctx.empty_list.first();
    let x2 = ctx.empty_list.next(x1);
    let x3 = ctx.empty_list.next(x2);
    let x4 = ctx.empty_list.next(x3);
    let parity = ctx.empty_list.parity;
    let quad1 = empty_list::quadrant(x1);
    let quad2 = empty_list::quadrant(x2);
    let quad3 = empty_list::quadrant(x3);

    if parity & quad1 == 0 {
        if parity & quad2 != 0 {
            if parity & quad3 != 0 {
                (x2, x3, x1, x4)
            } else {
                (x2, x4, x1, x3)
            }
        } else if parity & quad3 != 0 {
            (x3, x4, x1, x2)
        } else {
            (x1, x2, x3, x4)
        }
    } else if parity & quad2 == 0 {
        if parity & quad3 != 0 {
            (x1, x3, x2, x4)
        } else {
            (x1, x4, x2, x3)
        }
    } else {
        (x1, x2, x3, x4)
    }
}

/// Recurses below the shallow search: at four empties a stability check
/// runs before the specialised kernel takes over.
fn shallow_child(ctx: &mut SearchContext, next: &Board, beta: Score) -> Score {
    if ctx.empty_list.count == 4 {
        if let Some(score) = stability::stability_cutoff(next, 4, -beta) {
            -score
        } else {
            let (x1, x2, x3, x4) = sort_empties_at_4(ctx);
            -solve_4(ctx, next, -beta, x1, x2, x3, x4)
        }
    } else {
        -shallow_search(ctx, next, -beta)
    }
}

/// Null-window search for five and six empties: stability cutoff and
/// quadrant-parity ordering over the empties list, no hashing and no
/// move evaluation.
pub fn shallow_search(ctx: &mut SearchContext, board: &Board, alpha: Score) -> Score {
    if ctx.is_stopped() {
        return alpha;
    }

    let n_empties = ctx.empty_list.count;
    let beta = alpha + 1;

    if let Some(score) = stability::stability_cutoff(board, n_empties, alpha) {
        return score;
    }

    let mut moves = board.get_moves();
    if moves == 0 {
        let next = board.switch_players();
        if next.has_legal_moves() {
            ctx.update_pass();
            let score = -shallow_search(ctx, &next, -beta);
            ctx.undo_pass();
            return score;
        }
        return board_solve(board, n_empties);
    }

    let mut best_score = -SCORE_INF;

    // Odd-quadrant moves first, the rest afterwards; within each group
    // the empties list supplies the strategic order.
    let mut priority_moves = moves & QUADRANT_MASK[ctx.empty_list.parity as usize];
    if priority_moves == 0 {
        priority_moves = moves;
    }

    loop {
        moves ^= priority_moves;
        let mut sq = ctx.empty_list.first();
        loop {
            while !bitboard::is_set(priority_moves, sq) {
                sq = ctx.empty_list.next(sq);
            }

            priority_moves &= !sq.bitboard();
            let next = board.make_move(sq);

            ctx.update(sq);
            let score = shallow_child(ctx, &next, beta);
            ctx.undo(sq);

            if score > best_score {
                best_score = score;
                if score >= beta {
                    return score;
                }
            }

            if priority_moves == 0 {
                break;
            }
        }

        priority_moves = moves;
        if priority_moves == 0 {
            break;
        }
    }

    best_score
}

/// Null-window search for seven to ten empties, backed by the
/// per-thread endgame cache.
///
/// The cache key is the board with the solid opponent discs flipped to
/// the player's side; positions that differ only in solid discs then
/// share an entry, with scores offset by twice the solid count.
fn null_window_search_local(ctx: &mut SearchContext, board: &Board, alpha: Score) -> Score {
    if ctx.is_stopped() {
        return alpha;
    }

    let n_empties = ctx.empty_list.count;
    let beta = alpha + 1;

    if let Some(score) = stability::stability_cutoff(board, n_empties, alpha) {
        return score;
    }

    let solid = if n_empties <= MASK_SOLID_DEPTH {
        stability::get_all_full_lines(board.player | board.opponent) & board.opponent
    } else {
        0
    };
    let ofssolid = 2 * solid.count_ones() as Score;
    let key = Board::from_bitboards(board.player ^ solid, board.opponent ^ solid);
    let hash = key.hash();

    let mut cache_move = Square::None;
    let cached = LOCAL_CACHE.with(|cell| cell.borrow().probe(&key, hash, n_empties));
    if let Some(entry) = &cached {
        if entry.should_cut(beta + ofssolid) {
            return entry.score - ofssolid;
        }
        cache_move = entry.best_move;
    }

    let mut move_list = MoveList::new(board);
    if move_list.wipeout().is_some() {
        return SCORE_MAX;
    }
    if move_list.count() == 0 {
        let next = board.switch_players();
        if next.has_legal_moves() {
            ctx.update_pass();
            let score = -null_window_search_local(ctx, &next, -beta);
            ctx.undo_pass();
            return score;
        }
        return board_solve(board, n_empties);
    }

    if move_list.count() > 1 {
        move_list.evaluate_fast(board, [cache_move, Square::None]);
    }

    let mut best_score = -SCORE_INF;
    let mut best_move = Square::None;
    for mv in move_list.best_first_iter() {
        let next = board.make_move_with_flipped(mv.flipped, mv.sq);
        ctx.update(mv.sq);
        let score = if ctx.empty_list.count <= DEPTH_TO_SHALLOW_SEARCH {
            -shallow_search(ctx, &next, -beta)
        } else {
            -null_window_search_local(ctx, &next, -beta)
        };
        ctx.undo(mv.sq);

        if score > best_score {
            best_move = mv.sq;
            best_score = score;
            if score >= beta {
                break;
            }
        }
    }

    if ctx.is_stopped() {
        return alpha;
    }

    LOCAL_CACHE.with(|cell| {
        cell.borrow_mut().store(
            &key,
            hash,
            n_empties,
            best_score + ofssolid,
            Bound::from_nws(best_score, alpha),
            best_move,
        )
    });

    best_score
}

/// Enhanced transposition cutoff: before searching any child, probe the
/// shared table for each of them; a child whose stored upper bound
/// already refutes the window fails this node high immediately.
fn enhanced_transposition_cutoff(
    ctx: &mut SearchContext,
    board: &Board,
    move_list: &MoveList,
    n_empties: Depth,
    alpha: Score,
    hash: u64,
) -> Option<Score> {
    let etc_depth = (n_empties - 1) as u8;
    for mv in move_list.iter() {
        let next = board.make_move_with_flipped(mv.flipped, mv.sq);
        ctx.increment_nodes();

        let next_hash = next.hash();
        if let Some(data) = ctx.tt.probe(&next, next_hash, ctx.generation) {
            if data.depth >= etc_depth && data.selectivity >= ctx.selectivity {
                let score = -(data.upper as Score);
                if score > alpha {
                    ctx.tt.store(
                        board,
                        hash,
                        ctx.generation,
                        n_empties as u8,
                        ctx.selectivity,
                        0,
                        score,
                        SCORE_MAX,
                        mv.sq,
                    );
                    return Some(score);
                }
            }
        }
    }
    None
}

/// Null-window search for eleven or more empties, backed by the shared
/// transposition table.
pub fn null_window_search(ctx: &mut SearchContext, board: &Board, alpha: Score) -> Score {
    if ctx.is_stopped() {
        return alpha;
    }

    let n_empties = ctx.empty_list.count;
    let beta = alpha + 1;

    if let Some(score) = stability::stability_cutoff(board, n_empties, alpha) {
        return score;
    }

    let hash = board.hash();
    ctx.tt.prefetch(hash);

    let mut move_list = MoveList::new(board);
    if move_list.wipeout().is_some() {
        return SCORE_MAX;
    }
    if move_list.count() == 0 {
        let next = board.switch_players();
        if next.has_legal_moves() {
            ctx.update_pass();
            let score = -null_window_search(ctx, &next, -beta);
            ctx.undo_pass();
            return score;
        }
        return board_solve(board, n_empties);
    }

    let mut hash_moves = [Square::None; 2];
    if let Some(data) = ctx.tt.probe(board, hash, ctx.generation) {
        if data.depth as Depth >= n_empties && data.selectivity >= ctx.selectivity {
            let lower = data.lower as Score;
            let upper = data.upper as Score;
            if lower > alpha {
                return lower;
            }
            if upper <= alpha {
                return upper;
            }
        }
        hash_moves = data.moves();
    }

    if let Some(score) =
        enhanced_transposition_cutoff(ctx, board, &move_list, n_empties, alpha, hash)
    {
        return score;
    }

    if move_list.count() > 1 {
        move_list.evaluate_fast(board, hash_moves);
    }

    let nodes_before = ctx.n_nodes;
    let mut best_score = -SCORE_INF;
    let mut best_move = Square::None;
    for mv in move_list.best_first_iter() {
        let next = board.make_move_with_flipped(mv.flipped, mv.sq);
        ctx.update(mv.sq);
        let score = if ctx.empty_list.count <= DEPTH_TO_USE_LOCAL_HASH {
            -null_window_search_local(ctx, &next, -beta)
        } else {
            -null_window_search(ctx, &next, -beta)
        };
        ctx.undo(mv.sq);

        if score > best_score {
            best_move = mv.sq;
            best_score = score;
            if score >= beta {
                break;
            }
        }
    }

    if ctx.is_stopped() {
        return alpha;
    }

    let cost = bit_length(ctx.n_nodes - nodes_before);
    let (lower, upper) = if best_score > alpha {
        (best_score, SCORE_MAX)
    } else {
        (-SCORE_MAX, best_score)
    };
    ctx.tt.store(
        board,
        hash,
        ctx.generation,
        n_empties as u8,
        ctx.selectivity,
        cost,
        lower,
        upper,
        best_move,
    );

    best_score
}

/// Number of significant bits: the cost byte of hash entries.
#[inline]
fn bit_length(x: u64) -> u8 {
    (64 - x.leading_zeros()) as u8
}
