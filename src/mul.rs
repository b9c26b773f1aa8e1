//! Cubic and Method-of-Four-Russians matrix multiplication.
//!
//! [`mul_naive`] accumulates rows of B selected by the set bits of each row of
//! A. [`mul_m4rm`] tiles B into strips of `k` rows, precomputes all 2^k strip
//! combinations with one XOR per table entry via the Gray code walk, and then
//! folds each row of A through the tables `k` bits at a time. Several strips
//! are batched per pass over A so A's rows stay hot in cache.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::*;
use crate::{gray, mmc};
use ref_cast::RefCast;

/// Strips batched into a single pass over the rows of A
const M4RM_NTABLES: usize = 8;

fn assert_mul_dims(c: &BitMatrix, a: &BitMatrix, b: &BitMatrix) {
    if a.cols() != b.rows() {
        panic!(
            "Attempting to multiply matrices of incompatible dimensions: {} != {}",
            a.cols(),
            b.rows()
        );
    }
    if c.rows() != a.rows() || c.cols() != b.cols() {
        panic!(
            "Product matrix has wrong shape: {}x{} != {}x{}",
            c.rows(),
            c.cols(),
            a.rows(),
            b.cols()
        );
    }
}

/// `C = A * B` by the cubic schoolbook method, accumulating rows of B
pub fn mul_naive(a: &BitMatrix, b: &BitMatrix) -> BitMatrix {
    let mut c = BitMatrix::zeros(a.rows(), b.cols());
    addmul_naive(&mut c, a, b);
    c
}

/// `C += A * B` by the cubic schoolbook method
pub fn addmul_naive(c: &mut BitMatrix, a: &BitMatrix, b: &BitMatrix) {
    assert_mul_dims(c, a, b);
    let aw = a.width();
    if aw == 0 {
        return;
    }
    let amask = left_mask(a.cols() % BLOCKSIZE);
    for i in 0..a.rows() {
        for w in 0..aw {
            let mut word = a.row_words(i)[w];
            if w == aw - 1 {
                word &= amask;
            }
            while word != 0 {
                let j = w * BLOCKSIZE + word.trailing_zeros() as usize;
                word &= word - 1;
                *c.row_mut(i) ^= b.row(j);
            }
        }
    }
}

/// `C = A * B` by the Method of Four Russians with table exponent `k`
/// (`k == 0` picks one automatically)
pub fn mul_m4rm(a: &BitMatrix, b: &BitMatrix, k: usize) -> BitMatrix {
    let mut c = BitMatrix::zeros(a.rows(), b.cols());
    addmul_m4rm(&mut c, a, b, k);
    c
}

/// `C += A * B` by the Method of Four Russians
pub fn addmul_m4rm(c: &mut BitMatrix, a: &BitMatrix, b: &BitMatrix, k: usize) {
    assert_mul_dims(c, a, b);
    let (m, l) = (a.rows(), a.cols());
    if m == 0 || l == 0 || b.cols() == 0 {
        return;
    }
    let k = if k == 0 {
        gray::opt_k(a.rows(), a.cols())
    } else {
        k
    }
    .clamp(1, gray::MAX_K)
    .min(l);

    let wc = c.width();
    let mut strips: Vec<(usize, usize)> = Vec::new();
    let mut s = 0;
    while s < l {
        strips.push((s, usize::min(k, l - s)));
        s += k;
    }

    for group in strips.chunks(M4RM_NTABLES) {
        // one Gray-coded combination table per strip in the group
        let tables: Vec<(Vec<BitBlock>, usize, usize)> = group
            .iter()
            .map(|&(start, kt)| {
                let size = 1usize << kt;
                let mut t = mmc::take(size * wc);
                t[..wc].fill(0);
                let gc = gray::code(kt);
                for j in 1..size {
                    let dst = gc.ord[j] * wc;
                    let src = gc.ord[j - 1] * wc;
                    let row = b.row_words(start + gc.inc[j - 1]);
                    for w in 0..wc {
                        t[dst + w] = t[src + w] ^ row[w];
                    }
                }
                (t, start, kt)
            })
            .collect();

        for i in 0..m {
            for (t, start, kt) in &tables {
                let x = a.read_bits(i, *start, *kt) as usize;
                if x != 0 {
                    *c.row_mut(i) ^= BitRange::ref_cast(&t[x * wc..(x + 1) * wc]);
                }
            }
        }

        for (t, _, _) in tables {
            mmc::put(t);
        }
    }
}
