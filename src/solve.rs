//! Algorithms derived from the factorization: echelon forms, rank, kernels,
//! inversion and solving.
//!
//! [`echelonize`] is the table-driven elimination: strips of pivots are hunted
//! with plain Gaussian elimination on a few columns, the pivot block is
//! Jordan-reduced, and a Gray-code table then clears the strip from every
//! other row with one lookup per row. No column swaps, so the result is the
//! echelon form of the input itself.
//!
//! The rest ride on [`pluq`](crate::ple::pluq) and the triangular solves.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::*;
use crate::ple::pluq;
use crate::{gray, mmc, strassen, trsm};

/// Brings `A` into row echelon form in place and returns its rank; reduced
/// (Gauss-Jordan) form when `full` is set
pub fn echelonize(a: &mut BitMatrix, full: bool) -> usize {
    let m = a.rows();
    let n = a.cols();
    if m == 0 || n == 0 {
        return 0;
    }
    let mut r = 0;
    let mut c = 0;
    while r < m && c < n {
        let kk = gray::opt_k(m, n).min(n - c).min(m - r);

        // hunt up to kk pivots in the columns c..c+kk; candidates are
        // eliminated lazily against the pivots found so far before testing
        let mut kbar = 0;
        while kbar < kk {
            let ct = c + kbar;
            let mut found = None;
            for i in r + kbar..m {
                for l in 0..kbar {
                    if a.bit(i, c + l) {
                        a.row_add_offset(i, r + l, c + l);
                    }
                }
                if a.bit(i, ct) {
                    found = Some(i);
                    break;
                }
            }
            match found {
                Some(i) => {
                    if i != r + kbar {
                        a.row_swap(i, r + kbar);
                    }
                    kbar += 1;
                }
                None => break,
            }
        }

        if kbar == 0 {
            // every row below is zero in this column: skip it for good
            c += 1;
            continue;
        }

        // Jordan-reduce the pivot block so each pivot row is a unit vector on
        // the strip columns; the table below then maps strip bits directly to
        // the row combination that clears them
        for t in 0..kbar {
            for u in 0..t {
                if a.bit(r + u, c + t) {
                    a.row_add_offset(r + u, r + t, c + t);
                }
            }
        }

        table_pass(a, r, c, kbar, full);

        r += kbar;
        c += kbar;
    }
    r
}

/// Clears the strip of `k` pivot rows at `(prow0, c)` from all rows below
/// (and above, when `full`) with one Gray-table lookup per row
fn table_pass(a: &mut BitMatrix, prow0: usize, c: usize, k: usize, full: bool) {
    let wlo = c / BLOCKSIZE;
    let whi = a.width();
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
        let x = a.read_bits(rr, c, k) as usize;
        if x != 0 {
            a.xor_table_row(rr, c, &t[x * tw..(x + 1) * tw]);
        }
    }
    if full {
        for rr in 0..prow0 {
            let x = a.read_bits(rr, c, k) as usize;
            if x != 0 {
                a.xor_table_row(rr, c, &t[x * tw..(x + 1) * tw]);
            }
        }
    }
    mmc::put(t);
}

/// Rank of `A`, from the factorization of a scratch copy
pub fn rank(a: &BitMatrix) -> usize {
    let mut c = a.clone();
    pluq(&mut c, 0).2
}

/// Basis of the left kernel: a `(rows - rank) x rows` matrix X of full rank
/// with `X * A = 0`, or `None` when the kernel is trivial
pub fn kernel_left(a: &BitMatrix) -> Option<BitMatrix> {
    let m = a.rows();
    let mut b = a.clone();
    let (p, _q, r) = pluq(&mut b, 0);
    if r == m {
        return None;
    }
    let mut x = BitMatrix::zeros(m - r, m);
    if r > 0 {
        // [Y | I] annihilates L when Y * L1 = L2
        let l1 = b.submatrix(0, 0, r, r);
        let mut y = b.submatrix(r, 0, m - r, r);
        trsm::trsm_lower_right(&l1, &mut y);
        x.write_submatrix(0, 0, &y);
    }
    for i in 0..m - r {
        x.set_bit(i, r + i, true);
    }
    // [Y | I] right-multiplied by the row-permutation operator
    p.apply_cols_inv(&mut x);
    Some(x)
}

/// Basis of the right kernel: a `cols x (cols - rank)` matrix K of full rank
/// with `A * K = 0`, built from the identity on the non-pivot columns, or
/// `None` when the kernel is trivial
pub fn kernel_right(a: &BitMatrix) -> Option<BitMatrix> {
    let n = a.cols();
    let mut b = a.clone();
    let (_p, q, r) = pluq(&mut b, 0);
    if r == n {
        return None;
    }
    let mut k = BitMatrix::zeros(n, n - r);
    if r > 0 {
        // [Y1; I] annihilates U when U1 * Y1 = U2
        let u1 = b.submatrix(0, 0, r, r);
        let mut y = b.submatrix(0, r, r, n - r);
        trsm::trsm_upper_left(&u1, &mut y);
        k.write_submatrix(0, 0, &y);
    }
    for i in 0..n - r {
        k.set_bit(r + i, i, true);
    }
    q.apply_rows_inv(&mut k);
    Some(k)
}

/// Inverse of a square matrix via the factorization and two triangular
/// solves; `None` exactly when the matrix is singular
///
/// # Panics
///
/// Panics if the matrix is not square.
pub fn try_inverse(a: &BitMatrix) -> Option<BitMatrix> {
    if a.rows() != a.cols() {
        panic!("Matrix must be square");
    }
    let n = a.rows();
    let mut b = a.clone();
    let (p, q, r) = pluq(&mut b, 0);
    if r < n {
        return None;
    }
    let mut c = BitMatrix::identity(n);
    p.apply_rows(&mut c);
    trsm::trsm_lower_left(&b, &mut c);
    trsm::trsm_upper_left(&b, &mut c);
    q.apply_rows_inv(&mut c);
    Some(c)
}

/// Minimal-support solution X of `X * A = B`, via the factorization of A and
/// two triangular solves; `None` when the system is inconsistent
pub fn solve_left(a: &BitMatrix, b: &BitMatrix) -> Option<BitMatrix> {
    if a.cols() != b.cols() {
        panic!(
            "Attempting to solve X*A = B with incompatible dimensions: {} != {}",
            a.cols(),
            b.cols()
        );
    }
    let k = b.rows();
    let m = a.rows();
    let mut f = a.clone();
    let (p, q, r) = pluq(&mut f, 0);

    let mut bp = b.clone();
    q.apply_cols(&mut bp);
    let mut w = bp.submatrix(0, 0, k, r);
    if r > 0 {
        let f11 = f.submatrix(0, 0, r, r);
        trsm::trsm_upper_right(&f11, &mut w);
        trsm::trsm_lower_right(&f11, &mut w);
    }
    let mut x = BitMatrix::zeros(k, m);
    x.write_submatrix(0, 0, &w);
    // X = [Y | 0] right-multiplied by the row-permutation operator
    p.apply_cols_inv(&mut x);

    if &strassen::mul(&x, a, 0) == b {
        Some(x)
    } else {
        None
    }
}

impl BitMatrix {
    /// Rank of the matrix; see [`rank`]
    #[inline]
    pub fn rank(&self) -> usize {
        rank(self)
    }

    /// In-place (reduced) row echelon form; see [`echelonize`]
    #[inline]
    pub fn echelonize(&mut self, full: bool) -> usize {
        echelonize(self, full)
    }

    /// Decomposition-based inverse; see [`try_inverse`]
    #[inline]
    pub fn try_inverse(&self) -> Option<BitMatrix> {
        try_inverse(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mul::mul_naive;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn echelonize_matches_gauss_jordan() {
        let mut rng = SmallRng::seed_from_u64(81);
        for &(m, n) in &[(8, 20), (40, 70), (100, 100), (130, 65), (64, 200)] {
            let a0 = BitMatrix::random(&mut rng, m, n);
            let mut a = a0.clone();
            let mut g = a0.clone();
            let ra = echelonize(&mut a, true);
            let rg = g.gauss(true);
            assert_eq!(ra, rg, "{m}x{n}");
            // reduced row echelon form is unique
            assert_eq!(a, g, "{m}x{n}");
        }
    }

    #[test]
    fn echelonize_idempotent() {
        let mut rng = SmallRng::seed_from_u64(82);
        let a0 = BitMatrix::random(&mut rng, 90, 150);
        let mut a = a0.clone();
        let r = echelonize(&mut a, true);
        let once = a.clone();
        let r2 = echelonize(&mut a, true);
        assert_eq!(r, r2);
        assert_eq!(a, once);
    }

    #[test]
    fn echelonize_non_full_shape() {
        let mut rng = SmallRng::seed_from_u64(83);
        let a0 = BitMatrix::random(&mut rng, 60, 100);
        let mut a = a0.clone();
        let r = echelonize(&mut a, false);
        assert_eq!(r, a0.rank());
        // staircase: leading columns strictly increase, zero rows at the bottom
        let mut last = None;
        for i in 0..r {
            let lead = (0..100).find(|&j| a.bit(i, j)).unwrap();
            if let Some(l) = last {
                assert!(lead > l, "row {i}");
            }
            for ii in i + 1..60 {
                assert!(!a.bit(ii, lead), "below pivot ({i},{lead})");
            }
            last = Some(lead);
        }
        for i in r..60 {
            assert!((0..100).all(|j| !a.bit(i, j)));
        }
    }

    #[test]
    fn rank_matches_naive_gauss() {
        let mut rng = SmallRng::seed_from_u64(84);
        let a = BitMatrix::random(&mut rng, 1025, 1025);
        let r = a.rank();
        let rg = a.clone().gauss(false);
        assert_eq!(r, rg);
    }

    #[test]
    fn inverse_round_trip() {
        let mut rng = SmallRng::seed_from_u64(85);
        let a = BitMatrix::random_invertible(&mut rng, 64);
        let inv = try_inverse(&a).unwrap();
        let id = BitMatrix::identity(64);
        assert_eq!(mul_naive(&inv, &a), id);
        assert_eq!(mul_naive(&a, &inv), id);
        // agrees with the Gauss-Jordan inverse
        assert_eq!(inv, a.inverse());

        let b = BitMatrix::random_invertible(&mut rng, 150);
        let binv = b.try_inverse().unwrap();
        assert_eq!(&b * &binv, BitMatrix::identity(150));
    }

    #[test]
    fn singular_is_none() {
        let mut rng = SmallRng::seed_from_u64(86);
        // duplicate a row to force rank deficiency
        let mut s = BitMatrix::random(&mut rng, 60, 60);
        let dup = s.row(5).to_vec();
        for j in 0..60 {
            s.set_bit(20, j, dup.bit(j));
        }
        assert!(try_inverse(&s).is_none());
        assert!(s.rank() < 60);
    }

    #[test]
    fn kernel_left_annihilates() {
        let mut rng = SmallRng::seed_from_u64(87);
        let a = BitMatrix::random(&mut rng, 90, 50);
        let r = a.rank();
        let x = kernel_left(&a).unwrap();
        assert_eq!((x.rows(), x.cols()), (90 - r, 90));
        assert!(mul_naive(&x, &a).is_zero());
        assert_eq!(x.rank(), 90 - r);

        // full row rank: trivial left kernel
        let f = BitMatrix::random_invertible(&mut rng, 40);
        assert!(kernel_left(&f).is_none());
    }

    #[test]
    fn kernel_right_annihilates() {
        let mut rng = SmallRng::seed_from_u64(88);
        let a = BitMatrix::random(&mut rng, 50, 90);
        let r = a.rank();
        let k = kernel_right(&a).unwrap();
        assert_eq!((k.rows(), k.cols()), (90, 90 - r));
        assert!(mul_naive(&a, &k).is_zero());
        assert_eq!(k.rank(), 90 - r);

        let f = BitMatrix::random_invertible(&mut rng, 40);
        assert!(kernel_right(&f).is_none());
    }

    #[test]
    fn solve_left_round_trip() {
        let mut rng = SmallRng::seed_from_u64(89);
        let a = BitMatrix::random_invertible(&mut rng, 70);
        let x0 = BitMatrix::random(&mut rng, 12, 70);
        let b = mul_naive(&x0, &a);
        let x = solve_left(&a, &b).unwrap();
        assert_eq!(x, x0);

        // wide system: any solution is fine
        let a = BitMatrix::random(&mut rng, 60, 100);
        let x0 = BitMatrix::random(&mut rng, 9, 60);
        let b = mul_naive(&x0, &a);
        let x = solve_left(&a, &b).unwrap();
        assert_eq!(mul_naive(&x, &a), b);

        // inconsistent system
        let z = BitMatrix::zeros(10, 30);
        let mut b = BitMatrix::zeros(4, 30);
        b.set_bit(1, 2, true);
        assert!(solve_left(&z, &b).is_none());
    }

    #[test]
    fn echelonize_scrambled_excess() {
        let mut rng = SmallRng::seed_from_u64(90);
        let a0 = BitMatrix::random(&mut rng, 70, 131);
        let mut a = a0.clone();
        let mut g = a0.clone();
        g.scramble_excess(&mut rng);
        let ra = echelonize(&mut a, true);
        let rg = echelonize(&mut g, true);
        assert_eq!(ra, rg);
        assert_eq!(a, g);
    }
}
