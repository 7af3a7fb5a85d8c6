//! Disc flip calculation for move execution.

use crate::square::Square;

/// Computes the discs flipped by playing `sq` for the player `p` against
/// the opponent `o`.
///
/// Contract relied upon throughout the search: the result is a subset of
/// `o`, never contains `sq` itself, and is zero if and only if the move is
/// not legal. The depth-specialised kernels probe candidate squares with
/// no prior legality test and depend on the zero-for-illegal behaviour.
///
/// Per direction the run of opponent discs next to `sq` is expanded by a
/// masked shift fill and kept only when it is bracketed by a player disc.
#[inline]
pub fn flip(sq: Square, p: u64, o: u64) -> u64 {
    let x = sq.bitboard();

    let o_horizontal = o & 0x7E7E7E7E7E7E7E7E;
    let o_vertical = o & 0x00FFFFFFFFFFFF00;
    let o_diagonal = o & 0x007E7E7E7E7E7E00;

    flip_shl(x, p, o_horizontal, 1)
        | flip_shr(x, p, o_horizontal, 1)
        | flip_shl(x, p, o_vertical, 8)
        | flip_shr(x, p, o_vertical, 8)
        | flip_shl(x, p, o_diagonal, 7)
        | flip_shr(x, p, o_diagonal, 7)
        | flip_shl(x, p, o_diagonal, 9)
        | flip_shr(x, p, o_diagonal, 9)
}

/// Flipped run in the left-shift direction, or 0 without a bracket.
#[inline]
fn flip_shl(x: u64, p: u64, o: u64, dir: u32) -> u64 {
    let mut f = o & (x << dir);
    f |= o & (f << dir);
    f |= o & (f << dir);
    f |= o & (f << dir);
    f |= o & (f << dir);
    f |= o & (f << dir);

    if (f << dir) & p != 0 { f } else { 0 }
}

/// Flipped run in the right-shift direction, or 0 without a bracket.
#[inline]
fn flip_shr(x: u64, p: u64, o: u64, dir: u32) -> u64 {
    let mut f = o & (x >> dir);
    f |= o & (f >> dir);
    f |= o & (f >> dir);
    f |= o & (f >> dir);
    f |= o & (f >> dir);
    f |= o & (f >> dir);

    if (f >> dir) & p != 0 { f } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard;
    use crate::board::Board;
    use crate::disc::Disc;

    #[test]
    fn test_flip_initial_position() {
        let p = Square::D5.bitboard() | Square::E4.bitboard();
        let o = Square::D4.bitboard() | Square::E5.bitboard();
        assert_eq!(flip(Square::C4, p, o), Square::D4.bitboard());
        assert_eq!(flip(Square::D3, p, o), Square::D4.bitboard());
        assert_eq!(flip(Square::E6, p, o), Square::E5.bitboard());
        assert_eq!(flip(Square::F5, p, o), Square::E5.bitboard());
    }

    #[test]
    fn test_flip_illegal_is_zero() {
        let p = Square::D5.bitboard() | Square::E4.bitboard();
        let o = Square::D4.bitboard() | Square::E5.bitboard();
        assert_eq!(flip(Square::A1, p, o), 0);
        assert_eq!(flip(Square::C5, p, o), 0);
        assert_eq!(flip(Square::E3, p, o), 0);
    }

    #[test]
    fn test_flip_long_diagonal() {
        let board = Board::from_string(
            "XXXXXXXOXOOXXXXOXOXXXOXOXOOXOXXOXOXOOOXOXOOOOOXOXOOOXXXO-X-OXOOO",
            Disc::Black,
        )
        .unwrap();
        let flipped = flip(Square::A8, board.player, board.opponent);
        let expected = Square::B7.bitboard()
            | Square::C6.bitboard()
            | Square::D5.bitboard()
            | Square::E4.bitboard()
            | Square::F3.bitboard();
        assert_eq!(flipped, expected);
    }

    #[test]
    fn test_flip_no_wraparound() {
        // Player on A2 and opponent H1: shifting by one without a mask
        // would bracket across the board edge.
        let p = Square::A2.bitboard();
        let o = Square::H1.bitboard();
        assert_eq!(flip(Square::G1, p, o), 0);

        let p = Square::H4.bitboard();
        let o = Square::A4.bitboard();
        assert_eq!(flip(Square::B4, p, o), 0);
    }

    /// The flip contract against the move generator: a square flips
    /// something iff the generator lists it, flips are opponent discs
    /// only, and the played square is never part of the result.
    #[test]
    fn test_flip_matches_get_moves() {
        let boards = [
            (
                Square::D5.bitboard() | Square::E4.bitboard(),
                Square::D4.bitboard() | Square::E5.bitboard(),
            ),
            (0x00003C3C3C000000, 0x0000C3C3C3000000),
            (0x003C24243C000000, 0x00C3DBDBC300FF00),
            (0xF0F0F0F000000000, 0x0F0F0F0F00000000),
        ];

        for (p, o) in boards {
            let moves = bitboard::get_moves(p, o);
            for sq in Square::iter() {
                if sq.bitboard() & (p | o) != 0 {
                    continue;
                }
                let flipped = flip(sq, p, o);
                assert_eq!(
                    flipped != 0,
                    bitboard::is_set(moves, sq),
                    "flip/get_moves disagree on {sq} for p={p:016x} o={o:016x}"
                );
                assert_eq!(flipped & !o, 0, "flip outside opponent discs");
                assert_eq!(flipped & sq.bitboard(), 0, "flip contains move square");
            }
        }
    }
}
