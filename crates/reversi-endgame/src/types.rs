//! Common type aliases used throughout the solver.

/// Search depth, expressed in empty squares.
pub type Depth = u32;

/// Score as a disc difference.
pub type Score = i32;

/// Selectivity level recorded with transposition table entries.
pub type Selectivity = u8;
