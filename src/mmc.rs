//! A small process-wide cache of block buffers.
//!
//! The recursive multiply, solve and factorization routines allocate many
//! short-lived temporaries of the same handful of sizes. The cache keeps a
//! bounded number of freed buffers around, keyed by exact length, so the hot
//! recursion mostly recycles instead of hitting the allocator.
//!
//! Buffers returned by [`take`] have unspecified contents; callers initialize
//! what they read. Not required for correctness, only for keeping the
//! Strassen recursion off the allocator.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::{min_blocks, BitBlock};
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Maximum number of cached buffers
const SLOTS: usize = 64;

static POOL: Lazy<Mutex<Vec<Vec<BitBlock>>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Returns a buffer of exactly `len` blocks with unspecified contents
pub fn take(len: usize) -> Vec<BitBlock> {
    let mut pool = POOL.lock().unwrap();
    if let Some(pos) = pool.iter().position(|v| v.len() == len) {
        return pool.swap_remove(pos);
    }
    drop(pool);
    vec![0; len]
}

/// Hands a buffer back to the cache; dropped if the cache is full
pub fn put(buf: Vec<BitBlock>) {
    if buf.is_empty() {
        return;
    }
    let mut pool = POOL.lock().unwrap();
    if pool.len() < SLOTS {
        pool.push(buf);
    }
}

/// Returns a `rows x cols` matrix whose storage comes from the cache.
/// Valid bits are unspecified; callers overwrite before reading.
pub fn take_matrix(rows: usize, cols: usize) -> BitMatrix {
    BitMatrix::from_parts(rows, cols, take(rows * min_blocks(cols)))
}

/// Copies a submatrix of `m` into cache-backed storage
pub fn take_submatrix(m: &BitMatrix, r0: usize, c0: usize, nr: usize, nc: usize) -> BitMatrix {
    let mut t = take_matrix(nr, nc);
    m.extract_into(r0, c0, &mut t);
    t
}

/// Recycles a matrix obtained from [`take_matrix`] (or any matrix with
/// unpadded storage) back into the cache
pub fn recycle(m: BitMatrix) {
    put(m.into_blocks());
}

/// Empties the cache, releasing all held buffers
pub fn clear() {
    POOL.lock().unwrap().clear();
}
