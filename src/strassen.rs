//! Strassen-Winograd multiplication over GF(2).
//!
//! Seven recursive products and fifteen block XORs per level, layered on the
//! Four-Russians multiply. Quadrant splits are rounded down to block
//! boundaries; the unpaired row/column strips are peeled off and folded in
//! with the table multiply. Every intermediate block lives in the buffer
//! cache, so deep recursions stay off the allocator.

use crate::bitmatrix::BitMatrix;
use crate::bitvec::BLOCKSIZE;
use crate::mmc;
use crate::mul::addmul_m4rm;

/// Default dimension below which the recursion hands over to the table
/// multiply, sized so three blocks of the base case fit in a typical L2 cache
pub fn default_cutoff() -> usize {
    const L2_CACHE: usize = 512 * 1024;
    usize::min(((4 * L2_CACHE) as f64).sqrt() as usize / 2, 2048)
}

/// `C = A * B` by Strassen-Winograd recursion (`cutoff == 0` picks the default)
pub fn mul(a: &BitMatrix, b: &BitMatrix, cutoff: usize) -> BitMatrix {
    if a.cols() != b.rows() {
        panic!(
            "Attempting to multiply matrices of incompatible dimensions: {} != {}",
            a.cols(),
            b.rows()
        );
    }
    let mut c = BitMatrix::zeros(a.rows(), b.cols());
    addmul(&mut c, a, b, cutoff);
    c
}

/// `C += A * B` by Strassen-Winograd recursion
pub fn addmul(c: &mut BitMatrix, a: &BitMatrix, b: &BitMatrix, cutoff: usize) {
    let cutoff = if cutoff == 0 { default_cutoff() } else { cutoff };
    addmul_rec(c, a, b, cutoff);
}

fn xor_pooled(x: &BitMatrix, y: &BitMatrix) -> BitMatrix {
    let mut t = mmc::take_matrix(x.rows(), x.cols());
    for i in 0..x.rows() {
        t.row_mut(i).xor_from(x.row(i), y.row(i));
    }
    t
}

fn mul_pooled(a: &BitMatrix, b: &BitMatrix, cutoff: usize) -> BitMatrix {
    let mut c = mmc::take_matrix(a.rows(), b.cols());
    c.clear();
    addmul_rec(&mut c, a, b, cutoff);
    c
}

fn addmul_rec(c: &mut BitMatrix, a: &BitMatrix, b: &BitMatrix, cutoff: usize) {
    let (m, l, n) = (a.rows(), a.cols(), b.cols());
    let m2 = (m / 2) & !(BLOCKSIZE - 1);
    let l2 = (l / 2) & !(BLOCKSIZE - 1);
    let n2 = (n / 2) & !(BLOCKSIZE - 1);
    if m < cutoff || l < cutoff || n < cutoff || m2 == 0 || l2 == 0 || n2 == 0 {
        addmul_m4rm(c, a, b, 0);
        return;
    }
    let (me, le, ne) = (2 * m2, 2 * l2, 2 * n2);

    let a11 = mmc::take_submatrix(a, 0, 0, m2, l2);
    let a12 = mmc::take_submatrix(a, 0, l2, m2, l2);
    let a21 = mmc::take_submatrix(a, m2, 0, m2, l2);
    let a22 = mmc::take_submatrix(a, m2, l2, m2, l2);
    let b11 = mmc::take_submatrix(b, 0, 0, l2, n2);
    let b12 = mmc::take_submatrix(b, 0, n2, l2, n2);
    let b21 = mmc::take_submatrix(b, l2, 0, l2, n2);
    let b22 = mmc::take_submatrix(b, l2, n2, l2, n2);

    let s1 = xor_pooled(&a21, &a22);
    let s2 = xor_pooled(&s1, &a11);
    let s3 = xor_pooled(&a11, &a21);
    let s4 = xor_pooled(&a12, &s2);
    let t1 = xor_pooled(&b12, &b11);
    let t2 = xor_pooled(&b22, &t1);
    let t3 = xor_pooled(&b22, &b12);
    let t4 = xor_pooled(&t2, &b21);

    let p1 = mul_pooled(&a11, &b11, cutoff);
    let p2 = mul_pooled(&a12, &b21, cutoff);
    let p3 = mul_pooled(&s4, &b22, cutoff);
    let p4 = mul_pooled(&a22, &t4, cutoff);
    let p5 = mul_pooled(&s1, &t1, cutoff);
    let mut p6 = mul_pooled(&s2, &t2, cutoff);
    let mut p7 = mul_pooled(&s3, &t3, cutoff);

    for t in [a11, a12, a21, a22, b11, b12, b21, b22, s1, s2, s3, s4, t1, t2, t3, t4] {
        mmc::recycle(t);
    }

    c.xor_submatrix(0, 0, &p1);
    c.xor_submatrix(0, 0, &p2);
    p6.xor_with(&p1); // P1 + P6
    p7.xor_with(&p6); // P1 + P6 + P7
    c.xor_submatrix(0, n2, &p6);
    c.xor_submatrix(0, n2, &p5);
    c.xor_submatrix(0, n2, &p3);
    c.xor_submatrix(m2, 0, &p7);
    c.xor_submatrix(m2, 0, &p4);
    c.xor_submatrix(m2, n2, &p7);
    c.xor_submatrix(m2, n2, &p5);

    for t in [p1, p2, p3, p4, p5, p6, p7] {
        mmc::recycle(t);
    }

    // peel the unpaired strips with the table multiply
    if le < l {
        let ar = mmc::take_submatrix(a, 0, le, me, l - le);
        let br = mmc::take_submatrix(b, le, 0, l - le, ne);
        let mut p = mmc::take_matrix(me, ne);
        p.clear();
        addmul_m4rm(&mut p, &ar, &br, 0);
        c.xor_submatrix(0, 0, &p);
        mmc::recycle(ar);
        mmc::recycle(br);
        mmc::recycle(p);
    }
    if me < m {
        let ar = mmc::take_submatrix(a, me, 0, m - me, l);
        let mut p = mmc::take_matrix(m - me, n);
        p.clear();
        addmul_m4rm(&mut p, &ar, b, 0);
        c.xor_submatrix(me, 0, &p);
        mmc::recycle(ar);
        mmc::recycle(p);
    }
    if ne < n {
        let ac = mmc::take_submatrix(a, 0, 0, me, l);
        let bc = mmc::take_submatrix(b, 0, ne, l, n - ne);
        let mut p = mmc::take_matrix(me, n - ne);
        p.clear();
        addmul_m4rm(&mut p, &ac, &bc, 0);
        c.xor_submatrix(0, ne, &p);
        mmc::recycle(ac);
        mmc::recycle(bc);
        mmc::recycle(p);
    }
}
