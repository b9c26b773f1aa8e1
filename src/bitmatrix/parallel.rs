//! Data-parallel elimination.
//!
//! The per-pivot update loop is fanned out over disjoint row bands: a mutable
//! window over the whole matrix is split at the pivot row, the pivot row is
//! read from one side of the split, and the other side is divided band by
//! band with `rayon::join`. No row is copied and no unsafe aliasing is
//! involved; the window split is the only sharing primitive needed.

use super::window::BitWindowMut;
use crate::bitmatrix::BitMatrix;
use crate::bitvec::BitRange;

/// Rows per parallel task
const BAND: usize = 64;

pub trait ParallelMatrixOps {
    /// Gaussian elimination with the per-pivot update loop parallelized;
    /// produces the same (reduced) echelon form as [`BitMatrix::gauss`]
    fn par_gauss(&mut self, full: bool);
}

impl ParallelMatrixOps for BitMatrix {
    fn par_gauss(&mut self, full: bool) {
        let (m, n) = (self.rows(), self.cols());
        if m == 0 || n == 0 {
            return;
        }
        let mut pivots = Vec::new();
        for c in 0..n {
            let r = pivots.len();
            if r == m {
                break;
            }
            let Some(p) = (r..m).find(|&i| self.bit(i, c)) else {
                continue;
            };
            self.row_swap(r, p);
            let (top, below) = self.window_mut(0, 0, m, n).split_at_row(r + 1);
            eliminate_bands(below, top.row(r), c);
            pivots.push(c);
        }
        if full {
            for (r, &c) in pivots.iter().enumerate().rev() {
                let (above, rest) = self.window_mut(0, 0, m, n).split_at_row(r);
                eliminate_bands(above, rest.row(0), c);
            }
        }
    }
}

/// Clears column `c` from every row of `w` that carries it, halving the
/// window into disjoint bands and descending in parallel
fn eliminate_bands(mut w: BitWindowMut<'_>, pivot: &BitRange, c: usize) {
    if w.rows() <= BAND {
        for i in 0..w.rows() {
            if w.bit(i, c) {
                w.xor_row(i, pivot, c);
            }
        }
        return;
    }
    let mid = w.rows() / 2;
    let (a, b) = w.split_at_row(mid);
    rayon::join(
        || eliminate_bands(a, pivot, c),
        || eliminate_bands(b, pivot, c),
    );
}
