//! Zobrist-style board hashing.
//!
//! The hash of a position is the XOR of 16 contributions, one per board
//! byte (8 player bytes followed by 8 opponent bytes), each looked up in a
//! 256-entry table of random 64-bit keys. The tables are filled once from
//! a fixed-seed generator, so hashes are deterministic across runs and
//! across threads. The keys order moves and index hash tables; nothing
//! here is cryptographic.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed of the key generator. Changing it only permutes hash buckets.
const HASH_SEED: u64 = 0x9E3779B97F4A7C15;

static HASH_BYTE: OnceLock<Box<[[u64; 256]; 16]>> = OnceLock::new();

fn build_tables() -> Box<[[u64; 256]; 16]> {
    let mut rng = StdRng::seed_from_u64(HASH_SEED);
    let mut tables = Box::new([[0u64; 256]; 16]);
    for table in tables.iter_mut() {
        for key in table.iter_mut() {
            *key = rng.random();
        }
    }
    tables
}

/// Fills the key tables. Safe to call more than once.
pub fn init() {
    let _ = HASH_BYTE.get_or_init(build_tables);
}

/// Hashes a `(player, opponent)` bitboard pair.
#[inline]
pub fn board_hash(player: u64, opponent: u64) -> u64 {
    let tables = HASH_BYTE.get_or_init(build_tables);

    let p = player.to_le_bytes();
    let o = opponent.to_le_bytes();
    let mut h = 0;
    for i in 0..8 {
        h ^= crate::uget!(tables; i, p[i] as usize);
        h ^= crate::uget!(tables; i + 8, o[i] as usize);
    }
    h
}
