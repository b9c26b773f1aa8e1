//! Triangular solves with matrix right-hand sides (TRSM).
//!
//! All four variants take a square triangular factor with an implicit unit
//! diagonal (over GF(2) every pivot is 1, so the stored diagonal agrees) and
//! overwrite the right-hand side with the solution. Only the relevant triangle
//! of the factor is read, so a matrix carrying both factors of a decomposition
//! can be passed directly.
//!
//! The recursion halves the triangular dimension at block boundaries and
//! delegates the off-diagonal update to the Strassen/Four-Russians multiply;
//! base cases at or below one block substitute row- or word-wise.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::*;
use crate::{mmc, strassen};

const TRSM_BASE: usize = BLOCKSIZE;

fn assert_left_dims(t: &BitMatrix, b: &BitMatrix) {
    if t.rows() != t.cols() || t.rows() != b.rows() {
        panic!(
            "Triangular solve with incompatible dimensions: {}x{} vs {} rows",
            t.rows(),
            t.cols(),
            b.rows()
        );
    }
}

fn assert_right_dims(t: &BitMatrix, b: &BitMatrix) {
    if t.rows() != t.cols() || t.rows() != b.cols() {
        panic!(
            "Triangular solve with incompatible dimensions: {}x{} vs {} cols",
            t.rows(),
            t.cols(),
            b.cols()
        );
    }
}

/// Splits a triangular dimension at a block boundary
#[inline]
fn half_aligned(dim: usize) -> usize {
    let h = (dim / 2) & !(BLOCKSIZE - 1);
    if h == 0 {
        BLOCKSIZE
    } else {
        h
    }
}

/// Solves `U * X = B` for upper-unit-triangular `U`, storing X in B
pub fn trsm_upper_left(u: &BitMatrix, b: &mut BitMatrix) {
    assert_left_dims(u, b);
    if u.rows() > 0 {
        upper_left_rec(u, b, 0, u.rows());
    }
}

fn upper_left_rec(u: &BitMatrix, b: &mut BitMatrix, off: usize, dim: usize) {
    if dim <= TRSM_BASE {
        // back substitution: row i collects the solved rows below it
        for i in (0..dim.saturating_sub(1)).rev() {
            let bits = u.read_bits(off + i, off + i + 1, dim - 1 - i);
            let mut w = bits;
            while w != 0 {
                let t = w.trailing_zeros() as usize;
                w &= w - 1;
                b.row_add(off + i, off + i + 1 + t);
            }
        }
        return;
    }
    let h = half_aligned(dim);
    upper_left_rec(u, b, off + h, dim - h);
    let u01 = mmc::take_submatrix(u, off, off + h, h, dim - h);
    let x1 = mmc::take_submatrix(b, off + h, 0, dim - h, b.cols());
    let prod = strassen::mul(&u01, &x1, 0);
    b.xor_submatrix(off, 0, &prod);
    mmc::recycle(u01);
    mmc::recycle(x1);
    upper_left_rec(u, b, off, h);
}

/// Solves `L * X = B` for lower-unit-triangular `L`, storing X in B
pub fn trsm_lower_left(l: &BitMatrix, b: &mut BitMatrix) {
    assert_left_dims(l, b);
    if l.rows() > 0 {
        lower_left_rec(l, b, 0, l.rows());
    }
}

fn lower_left_rec(l: &BitMatrix, b: &mut BitMatrix, off: usize, dim: usize) {
    if dim <= TRSM_BASE {
        for i in 1..dim {
            let mut w = l.read_bits(off + i, off, i);
            while w != 0 {
                let t = w.trailing_zeros() as usize;
                w &= w - 1;
                b.row_add(off + i, off + t);
            }
        }
        return;
    }
    let h = half_aligned(dim);
    lower_left_rec(l, b, off, h);
    let l10 = mmc::take_submatrix(l, off + h, off, dim - h, h);
    let x0 = mmc::take_submatrix(b, off, 0, h, b.cols());
    let prod = strassen::mul(&l10, &x0, 0);
    b.xor_submatrix(off + h, 0, &prod);
    mmc::recycle(l10);
    mmc::recycle(x0);
    lower_left_rec(l, b, off + h, dim - h);
}

/// Solves `X * U = B` for upper-unit-triangular `U`, storing X in B
pub fn trsm_upper_right(u: &BitMatrix, b: &mut BitMatrix) {
    assert_right_dims(u, b);
    if u.rows() > 0 {
        upper_right_rec(u, b, 0, u.rows());
    }
}

fn upper_right_rec(u: &BitMatrix, b: &mut BitMatrix, off: usize, dim: usize) {
    if dim <= TRSM_BASE {
        // forward substitution a word at a time
        for row in 0..b.rows() {
            let mut w = b.read_bits(row, off, dim);
            for j in 0..dim {
                if (w >> j) & 1 == 1 && j + 1 < dim {
                    let urow = u.read_bits(off + j, off + j, dim - j) & !1;
                    w ^= urow << j;
                }
            }
            b.write_bits(row, off, dim, w);
        }
        return;
    }
    let h = half_aligned(dim);
    upper_right_rec(u, b, off, h);
    let x0 = mmc::take_submatrix(b, 0, off, b.rows(), h);
    let u01 = mmc::take_submatrix(u, off, off + h, h, dim - h);
    let prod = strassen::mul(&x0, &u01, 0);
    b.xor_submatrix(0, off + h, &prod);
    mmc::recycle(x0);
    mmc::recycle(u01);
    upper_right_rec(u, b, off + h, dim - h);
}

/// Solves `X * L = B` for lower-unit-triangular `L`, storing X in B
pub fn trsm_lower_right(l: &BitMatrix, b: &mut BitMatrix) {
    assert_right_dims(l, b);
    if l.rows() > 0 {
        lower_right_rec(l, b, 0, l.rows());
    }
}

fn lower_right_rec(l: &BitMatrix, b: &mut BitMatrix, off: usize, dim: usize) {
    if dim <= TRSM_BASE {
        for row in 0..b.rows() {
            let mut w = b.read_bits(row, off, dim);
            for j in (1..dim).rev() {
                if (w >> j) & 1 == 1 {
                    w ^= l.read_bits(off + j, off, j);
                }
            }
            b.write_bits(row, off, dim, w);
        }
        return;
    }
    let h = half_aligned(dim);
    lower_right_rec(l, b, off + h, dim - h);
    let x1 = mmc::take_submatrix(b, 0, off + h, b.rows(), dim - h);
    let l10 = mmc::take_submatrix(l, off + h, off, dim - h, h);
    let prod = strassen::mul(&x1, &l10, 0);
    b.xor_submatrix(0, off, &prod);
    mmc::recycle(x1);
    mmc::recycle(l10);
    lower_right_rec(l, b, off, h);
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    /// random strictly-upper + unit diagonal
    fn random_upper_unit(rng: &mut SmallRng, n: usize) -> BitMatrix {
        let mut u = crate::bitmatrix::BitMatrix::random(rng, n, n);
        for i in 0..n {
            for j in 0..=i {
                u.set_bit(i, j, i == j);
            }
        }
        u
    }

    fn random_lower_unit(rng: &mut SmallRng, n: usize) -> BitMatrix {
        random_upper_unit(rng, n).transposed()
    }

    #[test]
    fn upper_left_round_trip() {
        let mut rng = SmallRng::seed_from_u64(61);
        for &(n, cols) in &[(128, 256), (37, 17), (200, 100), (64, 64)] {
            let u = random_upper_unit(&mut rng, n);
            let b = BitMatrix::random(&mut rng, n, cols);
            let mut x = b.clone();
            trsm_upper_left(&u, &mut x);
            assert_eq!(strassen::mul(&u, &x, 0), b, "n={n} cols={cols}");
        }
    }

    #[test]
    fn lower_left_round_trip() {
        let mut rng = SmallRng::seed_from_u64(62);
        for &(n, cols) in &[(128, 96), (65, 130), (33, 5)] {
            let l = random_lower_unit(&mut rng, n);
            let b = BitMatrix::random(&mut rng, n, cols);
            let mut x = b.clone();
            trsm_lower_left(&l, &mut x);
            assert_eq!(strassen::mul(&l, &x, 0), b, "n={n} cols={cols}");
        }
    }

    #[test]
    fn upper_right_round_trip() {
        let mut rng = SmallRng::seed_from_u64(63);
        for &(n, rows) in &[(128, 70), (65, 129), (20, 33)] {
            let u = random_upper_unit(&mut rng, n);
            let b = BitMatrix::random(&mut rng, rows, n);
            let mut x = b.clone();
            trsm_upper_right(&u, &mut x);
            assert_eq!(strassen::mul(&x, &u, 0), b, "n={n} rows={rows}");
        }
    }

    #[test]
    fn lower_right_round_trip() {
        let mut rng = SmallRng::seed_from_u64(64);
        for &(n, rows) in &[(128, 70), (65, 129), (64, 10)] {
            let l = random_lower_unit(&mut rng, n);
            let b = BitMatrix::random(&mut rng, rows, n);
            let mut x = b.clone();
            trsm_lower_right(&l, &mut x);
            assert_eq!(strassen::mul(&x, &l, 0), b, "n={n} rows={rows}");
        }
    }

    #[test]
    fn reads_only_the_triangle() {
        // passing a matrix with junk in the opposite triangle must not matter
        let mut rng = SmallRng::seed_from_u64(65);
        let n = 100;
        let full = BitMatrix::random(&mut rng, n, n);
        let mut u = full.clone();
        for i in 0..n {
            for j in 0..=i {
                u.set_bit(i, j, i == j);
            }
        }
        let b = BitMatrix::random(&mut rng, n, 50);

        let mut x1 = b.clone();
        trsm_upper_left(&u, &mut x1);
        let mut x2 = b.clone();
        trsm_upper_left(&full, &mut x2);
        assert_eq!(x1, x2);
    }
}
