//! PLE / PLUQ factorization: permuted lower-unit-triangular times row echelon.
//!
//! [`pluq`] factors A in place so that, with P applied to the rows and Q to
//! the columns of the input, the result equals L * U: L is the strictly-lower
//! triangle of the first `rank` columns plus an implicit unit diagonal, U is
//! the at-or-above-diagonal part of the first `rank` rows. Q compresses the
//! pivot columns into the leading block; deferred pivots from rank-deficient
//! strips are what make it necessary, so the same kernel serves both the PLE
//! and the PLUQ entry points.
//!
//! The recursion splits the column range at a block-aligned midpoint: factor
//! the left half, solve for the top of the right half with a triangular
//! solve, push the update into the bottom right with the Strassen multiply,
//! factor the updated bottom right, then glue the two pivot runs together
//! with column swaps.
//!
//! The base case eliminates strips of up to [`gray::MAX_K`] pivots: pivots are
//! hunted column by column with strip-local updates below (the eliminated
//! strip bits keep the L multipliers), pivot rows are brought fully current
//! eagerly, and one Gray-table pass then clears the strip from every row
//! below. A column with no pivot below is swapped out of the leading block
//! and the hunt continues.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::*;
use crate::permutation::Permutation;
use crate::{gray, mmc, strassen, trsm};

/// Column count at or below which the recursion uses the strip base case
const PLUQ_CUTOFF: usize = 64;

/// Factors `A` in place as P * L * U * Q with the pivot columns compressed to
/// the front; returns the permutations and the rank.
///
/// `cutoff == 0` picks the default recursion cutoff.
pub fn pluq(a: &mut BitMatrix, cutoff: usize) -> (Permutation, Permutation, usize) {
    let m = a.rows();
    let n = a.cols();
    let mut rowp: Vec<usize> = (0..m).collect();
    let mut colp: Vec<usize> = (0..n).collect();
    let cut = if cutoff == 0 { PLUQ_CUTOFF } else { cutoff };
    let r = if m == 0 || n == 0 {
        0
    } else {
        pluq_rec(a, &mut rowp, &mut colp, 0, 0, n, cut)
    };
    (
        Permutation::from_order(&rowp),
        Permutation::from_order(&colp),
        r,
    )
}

/// Row-echelon factorization of `A` in place; same output layout and
/// permutations as [`pluq`], whose kernel already records the column
/// deferrals of rank-deficient strips in Q.
pub fn ple(a: &mut BitMatrix, cutoff: usize) -> (Permutation, Permutation, usize) {
    pluq(a, cutoff)
}

fn pluq_rec(
    a: &mut BitMatrix,
    rowp: &mut [usize],
    colp: &mut [usize],
    row0: usize,
    col0: usize,
    ncols: usize,
    cutoff: usize,
) -> usize {
    if row0 >= a.rows() || ncols == 0 {
        return 0;
    }
    let n1 = (ncols / 2) & !(BLOCKSIZE - 1);
    if ncols <= cutoff || n1 == 0 {
        return pluq_base(a, rowp, colp, row0, col0, ncols);
    }

    let r1 = pluq_rec(a, rowp, colp, row0, col0, n1, cutoff);

    if r1 > 0 {
        // top right: X = L1^{-1} * A[row0..row0+r1, col0+n1..]
        let l1 = a.submatrix(row0, col0, r1, r1);
        let mut x = a.submatrix(row0, col0 + n1, r1, ncols - n1);
        trsm::trsm_lower_left(&l1, &mut x);
        a.write_submatrix(row0, col0 + n1, &x);

        // bottom right: subtract L2 * X
        let mbot = a.rows() - (row0 + r1);
        if mbot > 0 {
            let l2 = a.submatrix(row0 + r1, col0, mbot, r1);
            let prod = strassen::mul(&l2, &x, 0);
            a.xor_submatrix(row0 + r1, col0 + n1, &prod);
        }
    }

    let r2 = pluq_rec(a, rowp, colp, row0 + r1, col0 + n1, ncols - n1, cutoff);

    // glue the right pivot run onto the left one
    if r1 < n1 {
        for i in 0..r2 {
            a.col_swap(col0 + r1 + i, col0 + n1 + i);
            colp.swap(col0 + r1 + i, col0 + n1 + i);
        }
    }

    r1 + r2
}

fn pluq_base(
    a: &mut BitMatrix,
    rowp: &mut [usize],
    colp: &mut [usize],
    row0: usize,
    col0: usize,
    ncols: usize,
) -> usize {
    let m = a.rows();
    // last block of the column range; the range end is either the matrix edge
    // or block-aligned, so updates never leak into sibling ranges
    let whi = if col0 + ncols == a.cols() {
        a.width()
    } else {
        (col0 + ncols) / BLOCKSIZE
    };

    let mut r = 0; // pivots found
    let mut w = ncols; // live width; dead columns are swapped beyond it
    loop {
        let rows_left = m - (row0 + r);
        if rows_left == 0 || r >= w {
            break;
        }
        let cs = col0 + r;
        let kk = gray::opt_k(rows_left, w - r).min(w - r).min(rows_left);

        let mut found = 0;
        let mut dead_col = None;
        while found < kk {
            let ct = cs + found;
            let prow = row0 + r + found;
            let Some(rp) = (prow..m).find(|&rr| a.bit(rr, ct)) else {
                dead_col = Some(ct);
                break;
            };
            if rp != prow {
                a.row_swap(rp, prow);
                rowp.swap(rp, prow);
            }
            // the new pivot row's bits at the strip's earlier pivot columns
            // are its multipliers; apply them beyond the strip so the row is
            // fully current before it eliminates anything
            if found > 0 {
                let mult = a.read_bits(prow, cs, found);
                for u in 0..found {
                    if (mult >> u) & 1 == 1 {
                        a.row_add_span(prow, row0 + r + u, cs + kk, whi);
                    }
                }
            }
            // strip-local elimination below; clearing bit 0 of the segment
            // keeps each eliminated row's pivot-column bit as its stored
            // multiplier
            let wlen = kk - found;
            let seg = a.read_bits(prow, ct, wlen) & !1;
            for rr in prow + 1..m {
                if a.bit(rr, ct) && seg != 0 {
                    a.xor_bits(rr, ct, wlen, seg);
                }
            }
            found += 1;
        }

        if found > 0 {
            flush_strip(a, row0 + r, cs, found, cs + kk, whi);
            r += found;
        }

        if let Some(ct) = dead_col {
            // no pivot below this column: move it out of the leading block
            let last = col0 + w - 1;
            if ct != last {
                a.col_swap(ct, last);
                colp.swap(ct, last);
            }
            w -= 1;
        }
    }
    r
}

/// Eliminates a strip of `k` pivot rows (starting at `prow0`, pivot columns
/// starting at `cs`) from every row below, with one table lookup per row.
/// The update covers blocks `from_bit / 64 .. whi`; the strip bits themselves
/// are untouched and keep the L multipliers.
fn flush_strip(a: &mut BitMatrix, prow0: usize, cs: usize, k: usize, from_bit: usize, whi: usize) {
    let wlo = from_bit / BLOCKSIZE;
    if wlo >= whi {
        return;
    }
    let tw = whi - wlo;
    let size = 1usize << k;
    let mut t = mmc::take(size * tw);
    t[..tw].fill(0);
    let gc = gray::code(k);
    for j in 1..size {
        let dst = gc.ord[j] * tw;
        let src = gc.ord[j - 1] * tw;
        let row = &a.row_words(prow0 + gc.inc[j - 1])[wlo..whi];
        for i in 0..tw {
            t[dst + i] = t[src + i] ^ row[i];
        }
    }
    for rr in prow0 + k..a.rows() {
        let x = a.read_bits(rr, cs, k) as usize;
        if x != 0 {
            a.xor_table_row(rr, from_bit, &t[x * tw..(x + 1) * tw]);
        }
    }
    mmc::put(t);
}
