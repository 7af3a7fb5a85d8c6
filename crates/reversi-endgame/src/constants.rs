//! Global constants

use crate::types::{Depth, Score, Selectivity};

/// Maximum possible score (all 64 discs to the side to move).
pub const SCORE_MAX: Score = 64;

/// Minimum possible score.
pub const SCORE_MIN: Score = -64;

/// Sentinel lying outside the score range.
pub const SCORE_INF: Score = 66;

/// Selectivity level of an exact, unpruned search. Endgame results are
/// always stored at this level; probabilistic cuts belong to the midgame
/// engine and use lower values.
pub const NO_SELECTIVITY: Selectivity = 6;

/// Largest empty count handled by the hash-free shallow search.
pub const DEPTH_TO_SHALLOW_SEARCH: Depth = 6;

/// Largest empty count handled with the per-thread endgame cache; above
/// this the shared transposition table is used.
pub const DEPTH_TO_USE_LOCAL_HASH: Depth = 10;

/// Largest empty count at which hash keys are normalized by the solid
/// opponent discs (squares on full lines in all four directions).
pub const MASK_SOLID_DEPTH: Depth = 10;

/// Empty count at which a midgame driver is expected to hand over to the
/// endgame solver. The solver itself accepts any empty count.
pub const DEPTH_MIDGAME_TO_ENDGAME: Depth = 15;
