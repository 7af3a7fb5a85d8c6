//! Shared transposition table for the deep endgame kernels.
//!
//! The table is 4-way set-associative. Each bucket carries a short spin
//! lock guarding its four entries; probes and stores both take it, which
//! keeps every read internally consistent and lets entries hold the full
//! 128-bit board key. Exact solving tolerates no key collisions, so the
//! partial-key trick of midgame tables is not used here.
//!
//! Entries store `(lower, upper)` score bounds plus the bookkeeping used
//! by the replacement policy: search depth (= empties), selectivity, a
//! cost byte (log2 of the subtree node count) and a date (generation).
//! The victim within a bucket is the entry with the lowest writable level
//! `(age, cost, selectivity, depth)`, so old and cheap entries are
//! recycled first.

use aligned_vec::{AVec, ConstAlign};
use cfg_if::cfg_if;

use crate::board::Board;
use crate::constants::{SCORE_MAX, SCORE_MIN};
use crate::search::spinlock::RawSpinLock;
use crate::square::Square;
use crate::types::{Score, Selectivity};

/// Entries per bucket.
const BUCKET_SIZE: usize = 4;

/// Payload of a table entry.
#[derive(Clone, Copy, Debug)]
pub struct HashData {
    /// Search depth in empties at which the entry was stored.
    pub depth: u8,
    /// Selectivity level of the stored search.
    pub selectivity: Selectivity,
    /// log2 of the node count that produced the entry.
    pub cost: u8,
    /// Generation stamp; refreshed on every hit.
    pub date: u8,
    /// Proven lower score bound.
    pub lower: i8,
    /// Proven upper score bound.
    pub upper: i8,
    /// Best move and alternate best move (64 = none).
    moves: [u8; 2],
}

impl HashData {
    fn new(
        depth: u8,
        selectivity: Selectivity,
        cost: u8,
        date: u8,
        lower: Score,
        upper: Score,
        best_move: Square,
    ) -> HashData {
        HashData {
            depth,
            selectivity,
            cost,
            date,
            lower: lower as i8,
            upper: upper as i8,
            moves: [best_move as u8, Square::None as u8],
        }
    }

    /// Primary and alternate best moves.
    #[inline]
    pub fn moves(&self) -> [Square; 2] {
        [
            Square::from_u8_unchecked(self.moves[0]),
            Square::from_u8_unchecked(self.moves[1]),
        ]
    }

    /// Replacement priority: older entries first, then cheap, unselective
    /// and shallow ones.
    #[inline]
    fn writable_level(&self, date: u8) -> u32 {
        let age = date.wrapping_sub(self.date);
        (((255 - age) as u32) << 24)
            | ((self.cost as u32) << 16)
            | ((self.selectivity as u32) << 8)
            | self.depth as u32
    }

    /// Merges a fresh search result into an entry holding the same
    /// position.
    fn update(
        &mut self,
        depth: u8,
        selectivity: Selectivity,
        cost: u8,
        date: u8,
        lower: Score,
        upper: Score,
        best_move: Square,
    ) {
        if depth > self.depth || selectivity > self.selectivity {
            // Deeper or wider result supersedes the stored bounds.
            self.lower = lower as i8;
            self.upper = upper as i8;
            self.depth = depth;
            self.selectivity = selectivity;
        } else if depth == self.depth && selectivity == self.selectivity {
            // Same search level: both bounds hold, keep the tighter pair.
            self.lower = self.lower.max(lower as i8);
            self.upper = self.upper.min(upper as i8);
        }
        // A shallower result leaves the stored bounds alone but still
        // refreshes the date and move hints below.

        if best_move != Square::None && best_move as u8 != self.moves[0] {
            self.moves[1] = self.moves[0];
            self.moves[0] = best_move as u8;
        }
        self.cost = self.cost.max(cost);
        self.date = date;
    }
}

#[derive(Clone, Copy)]
struct Entry {
    player: u64,
    opponent: u64,
    data: HashData,
}

impl Entry {
    /// An impossible board (overlapping halves) marks a free slot;
    /// `depth == 0` doubles as the emptiness flag for victim selection.
    const EMPTY: Entry = Entry {
        player: u64::MAX,
        opponent: u64::MAX,
        data: HashData {
            depth: 0,
            selectivity: 0,
            cost: 0,
            date: 0,
            lower: SCORE_MIN as i8,
            upper: SCORE_MAX as i8,
            moves: [Square::None as u8, Square::None as u8],
        },
    };
}

type Bucket = lock_api::Mutex<RawSpinLock, [Entry; BUCKET_SIZE]>;

/// The shared transposition table.
pub struct TranspositionTable {
    buckets: AVec<Bucket, ConstAlign<64>>,
    bucket_count: u64,
}

impl TranspositionTable {
    /// Allocates a table of roughly `mb_size` megabytes (at least one
    /// bucket row). The size is fixed for the table's lifetime.
    pub fn new(mb_size: usize) -> Self {
        let bucket_bytes = std::mem::size_of::<Bucket>();
        let bucket_count = if mb_size == 0 {
            16
        } else {
            ((mb_size as u64 * 1024 * 1024) / bucket_bytes as u64).max(16)
        };

        TranspositionTable {
            buckets: AVec::from_iter(
                64,
                (0..bucket_count).map(|_| Bucket::new([Entry::EMPTY; BUCKET_SIZE])),
            ),
            bucket_count,
        }
    }

    /// Resets every entry.
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            *bucket.lock() = [Entry::EMPTY; BUCKET_SIZE];
        }
    }

    /// Prefetches the bucket of `hash` into cache.
    #[inline]
    pub fn prefetch(&self, hash: u64) {
        cfg_if! {
            if #[cfg(target_arch = "x86_64")] {
                unsafe {
                    let index = self.bucket_index(hash);
                    let addr = self.buckets.as_ptr().add(index) as *const i8;
                    std::arch::x86_64::_mm_prefetch(addr, std::arch::x86_64::_MM_HINT_T0);
                }
            } else {
                let _ = hash;
            }
        }
    }

    /// Looks up `board`. On a hit the entry's date is refreshed and its
    /// payload returned.
    #[inline]
    pub fn probe(&self, board: &Board, hash: u64, date: u8) -> Option<HashData> {
        let bucket = &self.buckets[self.bucket_index(hash)];
        let mut entries = bucket.lock();
        for entry in entries.iter_mut() {
            if entry.player == board.player && entry.opponent == board.opponent {
                entry.data.date = date;
                return Some(entry.data);
            }
        }
        None
    }

    /// Stores a search result for `board`. A slot already holding the
    /// position is updated in place; otherwise the lowest-level entry of
    /// the bucket is replaced.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        board: &Board,
        hash: u64,
        date: u8,
        depth: u8,
        selectivity: Selectivity,
        cost: u8,
        lower: Score,
        upper: Score,
        best_move: Square,
    ) {
        debug_assert!(lower <= upper);
        let bucket = &self.buckets[self.bucket_index(hash)];
        let mut entries = bucket.lock();

        for entry in entries.iter_mut() {
            if entry.player == board.player && entry.opponent == board.opponent {
                entry
                    .data
                    .update(depth, selectivity, cost, date, lower, upper, best_move);
                return;
            }
        }

        let mut victim = 0;
        for i in 1..BUCKET_SIZE {
            if entries[i].data.depth == 0 {
                victim = i;
                break;
            }
            if entries[i].data.writable_level(date) < entries[victim].data.writable_level(date) {
                victim = i;
            }
        }

        entries[victim] = Entry {
            player: board.player,
            opponent: board.opponent,
            data: HashData::new(depth, selectivity, cost, date, lower, upper, best_move),
        };
    }

    /// Maps a hash to its bucket by multiplicative range reduction.
    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        mul_hi64(hash, self.bucket_count) as usize
    }
}

/// High 64 bits of the 128-bit product.
#[inline]
fn mul_hi64(a: u64, b: u64) -> u64 {
    (((a as u128) * (b as u128)) >> 64) as u64
}
