pub mod parallel;
pub mod window;

use crate::bitvec::*;
use rand::Rng;
use std::{
    fmt,
    ops::{BitXor, BitXorAssign, Index, Mul},
};

/// A dense matrix over GF(2), represented as packed rows of [`BitBlock`]s
///
/// The matrix is stored in row-major order. Column `j` of a row lives at bit
/// position `j % BLOCKSIZE` of the row's block `j / BLOCKSIZE`. Consecutive
/// rows are `stride` blocks apart; `stride` is at least `width()` (the number
/// of blocks holding valid columns) and may exceed it after an in-place
/// transpose pads the matrix.
///
/// Bits of a row beyond column `cols` are *don't-care*: they may hold
/// arbitrary values left behind by previous operations. Every routine that
/// inspects them masks with `left_mask(cols % BLOCKSIZE)`, and no routine
/// promises to keep them zero.
#[derive(Clone, Debug)]
pub struct BitMatrix {
    /// the number of logical rows in the matrix
    rows: usize,

    /// the number of logical columns in the matrix
    cols: usize,

    /// blocks between the start of consecutive rows
    stride: usize,

    /// a [`BitVec`] containing the data of the matrix, stored in row-major order
    data: BitVec,
}

impl BitMatrix {
    #[inline]
    pub fn bit(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.rows && j < self.cols);
        self.data.bit(self.stride * BLOCKSIZE * i + j)
    }

    #[inline]
    pub fn set_bit(&mut self, i: usize, j: usize, b: bool) {
        debug_assert!(i < self.rows && j < self.cols);
        self.data.set_bit(self.stride * BLOCKSIZE * i + j, b);
    }

    #[inline]
    pub fn flip_bit(&mut self, i: usize, j: usize) {
        debug_assert!(i < self.rows && j < self.cols);
        self.data.flip_bit(self.stride * BLOCKSIZE * i + j);
    }

    pub fn build(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut m = Self::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                if f(i, j) {
                    m.set_bit(i, j, true);
                }
            }
        }
        m
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        let stride = min_blocks(cols);
        BitMatrix {
            rows,
            cols,
            stride,
            data: BitVec::zeros(rows * stride),
        }
    }

    /// Creates a new `BitMatrix` from a vector of bool vectors, one per row
    pub fn from_bool_vec(data: &Vec<Vec<bool>>) -> Self {
        let rows = data.len();
        let cols = if rows == 0 { 0 } else { data[0].len() };
        Self::build(rows, cols, |i, j| data[i][j])
    }

    pub fn identity(size: usize) -> Self {
        let mut m = Self::zeros(size, size);
        for i in 0..size {
            m.set_bit(i, i, true);
        }
        m
    }

    /// Overwrites the matrix with the identity on its largest square
    /// submatrix and zeros elsewhere
    pub fn set_identity(&mut self) {
        self.clear();
        for i in 0..usize::min(self.rows, self.cols) {
            self.set_bit(i, i, true);
        }
    }

    /// Sets every valid bit (and the padding) to zero
    #[inline]
    pub fn clear(&mut self) {
        self.data.as_mut_slice().fill(0);
    }

    #[inline]
    pub fn random(rng: &mut impl Rng, rows: usize, cols: usize) -> Self {
        if rows == 0 || cols == 0 {
            return Self::zeros(rows, cols);
        }
        let stride = min_blocks(cols);
        let mask = left_mask(cols % BLOCKSIZE);
        let data = (0..rows * stride)
            .map(|i| {
                if i % stride == stride - 1 {
                    mask & rng.random::<BitBlock>()
                } else {
                    rng.random::<BitBlock>()
                }
            })
            .collect();
        BitMatrix {
            rows,
            cols,
            stride,
            data,
        }
    }

    /// Builds a random invertible matrix by applying random row additions to
    /// the identity
    #[inline]
    pub fn random_invertible(rng: &mut impl Rng, size: usize) -> Self {
        let mut m = BitMatrix::identity(size);

        for _ in 0..10 * size * size {
            let r1 = rng.random_range(0..size);
            let mut r2 = rng.random_range(0..size - 1);
            if r2 >= r1 {
                r2 += 1;
            }
            m.row_add(r2, r1);
        }

        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of blocks holding valid columns in each row
    #[inline]
    pub fn width(&self) -> usize {
        min_blocks(self.cols)
    }

    #[inline]
    pub fn row(&self, row: usize) -> &BitRange {
        let b = row * self.stride;
        &self.data[b..b + self.width()]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut BitRange {
        let b = row * self.stride;
        let w = self.width();
        &mut self.data[b..b + w]
    }

    #[inline]
    pub(crate) fn row_words(&self, row: usize) -> &[BitBlock] {
        self.row(row).as_slice()
    }

    /// `row(dst) ^= row(src)`
    #[inline]
    pub fn row_add(&mut self, dst: usize, src: usize) {
        let w = self.width();
        let stride = self.stride;
        self.data.xor_range(src * stride, dst * stride, w);
    }

    /// `row(dst)[coloffset..] ^= row(src)[coloffset..]`
    ///
    /// Columns below `coloffset` of the destination row are untouched.
    #[inline]
    pub fn row_add_offset(&mut self, dst: usize, src: usize, coloffset: usize) {
        let w = self.width();
        self.row_add_span(dst, src, coloffset, w);
    }

    /// Like [`row_add_offset`](Self::row_add_offset), but stops after block
    /// `end_word` of the rows.
    pub(crate) fn row_add_span(&mut self, dst: usize, src: usize, from_bit: usize, end_word: usize) {
        let w0 = from_bit / BLOCKSIZE;
        if w0 >= end_word {
            return;
        }
        let spot = from_bit % BLOCKSIZE;
        let d = dst * self.stride;
        let s = src * self.stride;
        let blocks = self.data.as_mut_slice();
        blocks[d + w0] ^= blocks[s + w0] & (BitBlock::MAX << spot);
        for j in w0 + 1..end_word {
            blocks[d + j] ^= blocks[s + j];
        }
    }

    /// XORs a precombined row segment into `row(row)` starting at `from_bit`.
    /// `src[0]` corresponds to block `from_bit / BLOCKSIZE` of the row; bits of
    /// `src[0]` below `from_bit % BLOCKSIZE` are ignored.
    pub(crate) fn xor_table_row(&mut self, row: usize, from_bit: usize, src: &[BitBlock]) {
        if src.is_empty() {
            return;
        }
        let w0 = from_bit / BLOCKSIZE;
        let spot = from_bit % BLOCKSIZE;
        let base = row * self.stride + w0;
        let blocks = self.data.as_mut_slice();
        blocks[base] ^= src[0] & (BitBlock::MAX << spot);
        for j in 1..src.len() {
            blocks[base + j] ^= src[j];
        }
    }

    #[inline]
    pub fn row_swap(&mut self, rowa: usize, rowb: usize) {
        if rowa == rowb {
            return;
        }
        let w = self.width();
        let stride = self.stride;
        self.data.swap_range(rowa * stride, rowb * stride, w);
    }

    /// Swaps the columns `cola` and `colb`
    pub fn col_swap(&mut self, cola: usize, colb: usize) {
        self.col_swap_in_rows(cola, colb, 0, self.rows);
    }

    /// Swaps the columns `cola` and `colb`, but only in rows
    /// `start_row..stop_row`
    pub fn col_swap_in_rows(&mut self, cola: usize, colb: usize, start_row: usize, stop_row: usize) {
        if cola == colb {
            return;
        }
        // order so that the first column has the larger in-block position
        let (ca, cb) = if cola % BLOCKSIZE < colb % BLOCKSIZE {
            (colb, cola)
        } else {
            (cola, colb)
        };
        let a_word = ca / BLOCKSIZE;
        let b_word = cb / BLOCKSIZE;
        let d = ca % BLOCKSIZE - cb % BLOCKSIZE;
        let bm: BitBlock = 1 << (cb % BLOCKSIZE);
        let blocks = self.data.as_mut_slice();

        if a_word == b_word {
            for i in start_row..stop_row {
                let idx = i * self.stride + a_word;
                let v = blocks[idx];
                let x = ((v >> d) ^ v) & bm;
                blocks[idx] = v ^ (x | (x << d));
            }
        } else {
            for i in start_row..stop_row {
                let base = i * self.stride;
                let mut a = blocks[base + a_word];
                let mut b = blocks[base + b_word];
                let x = ((a >> d) ^ b) & bm;
                b ^= x;
                a ^= x << d;
                blocks[base + a_word] = a;
                blocks[base + b_word] = b;
            }
        }
    }

    /// Reads `n <= 64` bits of row `x` starting at column `y`, packed into the
    /// low `n` bits of the result, lowest column first
    #[inline]
    pub fn read_bits(&self, x: usize, y: usize, n: usize) -> BitBlock {
        debug_assert!(y + n <= self.cols);
        self.row(x).read_bits(y, n)
    }

    /// XORs the low `n` bits of `values` into row `x` starting at column `y`
    #[inline]
    pub fn xor_bits(&mut self, x: usize, y: usize, n: usize, values: BitBlock) {
        debug_assert!(y + n <= self.cols);
        self.row_mut(x).xor_bits(y, n, values);
    }

    /// Writes the low `n` bits of `values` into row `x` starting at column `y`
    #[inline]
    pub fn write_bits(&mut self, x: usize, y: usize, n: usize, values: BitBlock) {
        debug_assert!(y + n <= self.cols);
        self.row_mut(x).write_bits(y, n, values);
    }

    /// Clears `n` bits of row `x` starting at column `y`
    #[inline]
    pub fn clear_bits(&mut self, x: usize, y: usize, n: usize) {
        debug_assert!(y + n <= self.cols);
        self.row_mut(x).clear_bits(y, n);
    }

    /// `self ^= other`, the GF(2) matrix sum
    pub fn xor_with(&mut self, other: &BitMatrix) {
        if self.rows != other.rows || self.cols != other.cols {
            panic!(
                "Attempting to add matrices of incompatible dimensions: {}x{} != {}x{}",
                self.rows, self.cols, other.rows, other.cols
            );
        }
        for i in 0..self.rows {
            *self.row_mut(i) ^= other.row(i);
        }
    }

    /// Checks whether every valid bit is zero
    pub fn is_zero(&self) -> bool {
        let w = self.width();
        if w == 0 {
            return true;
        }
        let mask = left_mask(self.cols % BLOCKSIZE);
        for i in 0..self.rows {
            let row = self.row_words(i);
            for j in 0..w - 1 {
                if row[j] != 0 {
                    return false;
                }
            }
            if row[w - 1] & mask != 0 {
                return false;
            }
        }
        true
    }

    /// Number of ones in the matrix
    pub fn count_ones(&self) -> usize {
        let w = self.width();
        if w == 0 {
            return 0;
        }
        let mask = left_mask(self.cols % BLOCKSIZE);
        let mut c = 0;
        for i in 0..self.rows {
            let row = self.row_words(i);
            for j in 0..w - 1 {
                c += row[j].count_ones() as usize;
            }
            c += (row[w - 1] & mask).count_ones() as usize;
        }
        c
    }

    /// Returns a transposed copy of the matrix
    #[inline]
    pub fn transposed(&self) -> Self {
        let mut dest = Self::zeros(self.cols, self.rows);
        dest.transpose_from(self);
        dest
    }

    /// Copies the transpose of `m` into `self`, which must be `m.cols() x m.rows()`
    fn transpose_from(&mut self, m: &BitMatrix) {
        let mut buffer = [0 as BitBlock; BLOCKSIZE];
        let src_width = m.width();
        let smask = left_mask(m.cols % BLOCKSIZE);
        for bi in 0..src_width {
            for bj in 0..self.width() {
                // destination block (bi, bj) is the transpose of source block (bj, bi)
                for (k, buf) in buffer.iter_mut().enumerate() {
                    let sr = BLOCKSIZE * bj + k;
                    *buf = if sr < m.rows {
                        let mut w = m.data[sr * m.stride + bi];
                        if bi == src_width - 1 {
                            w &= smask;
                        }
                        w
                    } else {
                        0
                    };
                }
                transpose64(&mut buffer);
                for (k, &buf) in buffer.iter().enumerate() {
                    let dr = BLOCKSIZE * bi + k;
                    if dr < self.rows {
                        self.data[dr * self.stride + bj] = buf;
                    }
                }
            }
        }
    }

    /// Pads the storage to a square grid of blocks so the matrix can be
    /// transposed in place. Padding blocks are zeroed; the stride grows to the
    /// padded block count.
    #[inline]
    pub fn pad_to_square(&mut self) {
        let blocks = min_blocks(self.rows).max(self.width());
        let data_rows = if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        };
        if self.stride != blocks || data_rows != blocks * BLOCKSIZE {
            let w = self.width();
            let mut data = Vec::with_capacity(BLOCKSIZE * blocks * blocks);
            for r in 0..BLOCKSIZE * blocks {
                for j in 0..blocks {
                    data.push(if r < self.rows && j < w {
                        self.data[r * self.stride + j]
                    } else {
                        0
                    });
                }
            }
            self.data = data.into();
            self.stride = blocks;
        }
    }

    /// Transposes the matrix in place, padding the storage to a square grid of
    /// blocks first if necessary
    pub fn transpose_inplace(&mut self) {
        self.pad_to_square();
        let blocks = self.stride;
        let mut b0 = [0 as BitBlock; BLOCKSIZE];
        let mut b1 = [0 as BitBlock; BLOCKSIZE];
        for bi in 0..blocks {
            self.load_block(bi, bi, &mut b0);
            transpose64(&mut b0);
            self.store_block(bi, bi, &b0);
            for bj in bi + 1..blocks {
                self.load_block(bi, bj, &mut b0);
                self.load_block(bj, bi, &mut b1);
                transpose64(&mut b0);
                transpose64(&mut b1);
                self.store_block(bj, bi, &b0);
                self.store_block(bi, bj, &b1);
            }
        }
        std::mem::swap(&mut self.rows, &mut self.cols);
    }

    #[inline]
    fn load_block(&self, bi: usize, bj: usize, buf: &mut [BitBlock; BLOCKSIZE]) {
        for (k, b) in buf.iter_mut().enumerate() {
            *b = self.data[(BLOCKSIZE * bi + k) * self.stride + bj];
        }
    }

    #[inline]
    fn store_block(&mut self, bi: usize, bj: usize, buf: &[BitBlock; BLOCKSIZE]) {
        for (k, &b) in buf.iter().enumerate() {
            self.data[(BLOCKSIZE * bi + k) * self.stride + bj] = b;
        }
    }

    /// Brings the matrix into (reduced) row echelon form by plain
    /// one-column-at-a-time elimination, returning the rank
    ///
    /// Quadratic work per pivot; the Gray-table
    /// [`echelonize`](Self::echelonize) is the fast path and is tested
    /// against this.
    #[inline]
    pub fn gauss(&mut self, full: bool) -> usize {
        self.reduce_rows(full).len()
    }

    /// Elimination worker; returns the pivot columns in increasing order
    fn reduce_rows(&mut self, full: bool) -> Vec<usize> {
        let w = self.width();
        let mut pivots = Vec::new();
        for c in 0..self.cols {
            let r = pivots.len();
            if r == self.rows {
                break;
            }
            let Some(p) = (r..self.rows).find(|&i| self.bit(i, c)) else {
                continue;
            };
            self.row_swap(r, p);
            // clear the column in one pass; the pivot row is added from its
            // pivot column on, so earlier pivot columns are never touched
            let start = if full { 0 } else { r + 1 };
            for i in start..self.rows {
                if i != r && self.bit(i, c) {
                    self.row_add_span(i, r, c, w);
                }
            }
            pivots.push(c);
        }
        pivots
    }

    /// Compute the inverse of an invertible matrix by eliminating the
    /// augmented matrix `[A | I]`
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square or not invertible. See
    /// [`try_inverse`](crate::solve::try_inverse) for the decomposition-based
    /// version that reports singularity instead.
    pub fn inverse(&self) -> Self {
        if self.rows() != self.cols() {
            panic!("Matrix must be square");
        }
        let n = self.cols();
        let mut aug = self.concat(&BitMatrix::identity(n));
        let pivots = aug.reduce_rows(true);
        // pivot columns are increasing; a pivot in the identity half means
        // the left half ran out of rank
        if pivots.last().is_some_and(|&c| c >= n) {
            panic!("Matrix is not invertible");
        }
        aug.submatrix(0, n, n, n)
    }

    /// Concatenates `other` to the right of `self`
    pub fn concat(&self, other: &BitMatrix) -> BitMatrix {
        if self.rows != other.rows {
            panic!(
                "Attempting to concatenate matrices with different row counts: {} != {}",
                self.rows, other.rows
            );
        }
        let mut c = BitMatrix::zeros(self.rows, self.cols + other.cols);
        c.write_submatrix(0, 0, self);
        c.write_submatrix(0, self.cols, other);
        c
    }

    /// Stacks `other` below `self`
    pub fn stack(&self, other: &BitMatrix) -> BitMatrix {
        if self.cols != other.cols {
            panic!(
                "Attempting to stack matrices with different column counts: {} != {}",
                self.cols, other.cols
            );
        }
        let mut c = BitMatrix::zeros(self.rows + other.rows, self.cols);
        c.write_submatrix(0, 0, self);
        c.write_submatrix(self.rows, 0, other);
        c
    }

    pub(crate) fn from_parts(rows: usize, cols: usize, data: Vec<BitBlock>) -> Self {
        let stride = min_blocks(cols);
        debug_assert_eq!(data.len(), rows * stride);
        BitMatrix {
            rows,
            cols,
            stride,
            data: data.into(),
        }
    }

    pub(crate) fn into_blocks(self) -> Vec<BitBlock> {
        self.data.into()
    }

    /// Fills the don't-care bits (beyond `cols` in each row, and any padding
    /// rows) with random garbage. Results of all operations must not change.
    #[cfg(test)]
    pub(crate) fn scramble_excess(&mut self, rng: &mut impl Rng) {
        let w = self.width();
        let mask = left_mask(self.cols % BLOCKSIZE);
        for i in 0..self.rows {
            let base = i * self.stride;
            if self.cols % BLOCKSIZE != 0 && w > 0 {
                let idx = base + w - 1;
                let v = self.data[idx];
                self.data[idx] = (v & mask) | (rng.random::<BitBlock>() & !mask);
            }
            for j in w..self.stride {
                self.data[base + j] = rng.random();
            }
        }
        let used = self.rows * self.stride;
        for j in used..self.data.len() {
            self.data[j] = rng.random();
        }
    }
}

/// Transposes a 64x64 bit block held as 64 row words, splitting into
/// half-size blocks and swapping the off-diagonal pair at every scale
fn transpose64(buf: &mut [BitBlock; BLOCKSIZE]) {
    let mut swap_width = BLOCKSIZE;
    let mut low_mask = BitBlock::MAX;
    while swap_width != 1 {
        swap_width >>= 1;
        low_mask ^= low_mask << swap_width;
        let high_mask = !low_mask;

        for block_row in (0..BLOCKSIZE).step_by(swap_width * 2) {
            for row in block_row..block_row + swap_width {
                let b0 = buf[row];
                let b1 = buf[row + swap_width];
                buf[row] = (b0 & low_mask) | ((b1 & low_mask) << swap_width);
                buf[row + swap_width] = (b1 & high_mask) | ((b0 & high_mask) >> swap_width);
            }
        }
    }
}

/// Two matrices are considered equal if they represent the same logical matrix;
/// don't-care bits and padding are ignored
impl PartialEq for BitMatrix {
    fn eq(&self, other: &Self) -> bool {
        if self.rows() != other.rows() || self.cols() != other.cols() {
            return false;
        }
        let w = self.width();
        if w == 0 {
            return true;
        }
        let mask = left_mask(self.cols % BLOCKSIZE);
        for i in 0..self.rows {
            let a = self.row_words(i);
            let b = other.row_words(i);
            for j in 0..w - 1 {
                if a[j] != b[j] {
                    return false;
                }
            }
            if (a[w - 1] ^ b[w - 1]) & mask != 0 {
                return false;
            }
        }
        true
    }
}

impl Eq for BitMatrix {}

impl Index<(usize, usize)> for BitMatrix {
    type Output = bool;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        if self.bit(index.0, index.1) {
            &true
        } else {
            &false
        }
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, " {} ", if self[(i, j)] { 1 } else { 0 })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Mul for &BitMatrix {
    type Output = BitMatrix;
    fn mul(self, rhs: Self) -> Self::Output {
        crate::strassen::mul(self, rhs, 0)
    }
}

impl BitXor for &BitMatrix {
    type Output = BitMatrix;

    fn bitxor(self, rhs: Self) -> Self::Output {
        let mut res = self.clone();
        res.xor_with(rhs);
        res
    }
}

impl BitXorAssign<&BitMatrix> for BitMatrix {
    fn bitxor_assign(&mut self, rhs: &BitMatrix) {
        self.xor_with(rhs);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn identity() {
        let m = BitMatrix::identity(100);
        for i in 0..100 {
            for j in 0..100 {
                assert_eq!(m[(i, j)], i == j);
            }
        }
    }

    #[test]
    fn set_identity_rect() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut m = BitMatrix::random(&mut rng, 3, 5);
        m.set_identity();
        let rows = ["10000", "01000", "00100"];
        for (i, row) in rows.iter().enumerate() {
            for (j, ch) in row.chars().enumerate() {
                assert_eq!(m[(i, j)], ch == '1');
            }
        }
    }

    #[test]
    fn row_and_col_ops() {
        let mut rng = SmallRng::seed_from_u64(3);
        let m0 = BitMatrix::random(&mut rng, 9, 130);

        let mut m = m0.clone();
        m.row_swap(2, 7);
        for j in 0..130 {
            assert_eq!(m.bit(2, j), m0.bit(7, j));
            assert_eq!(m.bit(7, j), m0.bit(2, j));
            assert_eq!(m.bit(4, j), m0.bit(4, j));
        }

        // in-word and cross-word column swaps
        for &(c1, c2) in &[(3, 17), (3, 70), (63, 64), (0, 129), (68, 100)] {
            let mut m = m0.clone();
            m.col_swap(c1, c2);
            for i in 0..9 {
                assert_eq!(m.bit(i, c1), m0.bit(i, c2), "cols {c1} {c2}");
                assert_eq!(m.bit(i, c2), m0.bit(i, c1), "cols {c1} {c2}");
            }
            m.col_swap(c1, c2);
            assert_eq!(m, m0);
        }

        let mut m = m0.clone();
        m.col_swap_in_rows(5, 80, 2, 6);
        for i in 0..9 {
            let swapped = (2..6).contains(&i);
            assert_eq!(m.bit(i, 5), m0.bit(i, if swapped { 80 } else { 5 }));
            assert_eq!(m.bit(i, 80), m0.bit(i, if swapped { 5 } else { 80 }));
        }

        let mut m = m0.clone();
        m.row_add_offset(1, 0, 67);
        for j in 0..130 {
            let expect = if j >= 67 {
                m0.bit(1, j) ^ m0.bit(0, j)
            } else {
                m0.bit(1, j)
            };
            assert_eq!(m.bit(1, j), expect, "col {j}");
        }
    }

    #[test]
    fn read_write_bits_matrix() {
        let mut rng = SmallRng::seed_from_u64(4);
        let m0 = BitMatrix::random(&mut rng, 4, 200);
        let mut m = m0.clone();

        let v = m.read_bits(1, 60, 20);
        for i in 0..20 {
            assert_eq!((v >> i) & 1 == 1, m.bit(1, 60 + i));
        }

        m.write_bits(2, 61, 10, 0b1111100001);
        for i in 0..10 {
            assert_eq!(m.bit(2, 61 + i), 0b1111100001 >> i & 1 == 1);
        }
        assert_eq!(m.bit(2, 60), m0.bit(2, 60));
        assert_eq!(m.bit(2, 71), m0.bit(2, 71));

        m.clear_bits(2, 61, 10);
        assert_eq!(m.read_bits(2, 61, 10), 0);
    }

    #[test]
    fn transpose() {
        let mut rng = SmallRng::seed_from_u64(1);
        for &(r, c) in &[(10, 4), (300, 200), (65, 129), (64, 64), (1, 100)] {
            let m = BitMatrix::random(&mut rng, r, c);
            let n = m.transposed();
            assert_eq!((n.rows(), n.cols()), (c, r));
            for i in 0..m.rows() {
                for j in 0..m.cols() {
                    assert_eq!(m[(i, j)], n[(j, i)], "{r}x{c} at ({i},{j})");
                }
            }
            // involution
            assert_eq!(n.transposed(), m);
        }
    }

    #[test]
    fn pad_to_square() {
        let mut rng = SmallRng::seed_from_u64(1);
        let m = BitMatrix::random(&mut rng, 300, 200);
        let mut n = m.clone();
        n.pad_to_square();
        for i in 0..m.rows() {
            for j in 0..m.cols() {
                assert_eq!(m[(i, j)], n[(i, j)]);
            }
        }
        assert_eq!(m, n);
    }

    #[test]
    fn transpose_inplace() {
        let mut rng = SmallRng::seed_from_u64(1);
        // both orientations, including cols > rows
        for &(r, c) in &[(10, 4), (4, 10), (300, 200), (10, 300), (130, 64)] {
            let m = BitMatrix::random(&mut rng, r, c);
            let mut n = m.clone();
            n.transpose_inplace();
            assert_eq!(n, m.transposed(), "{r}x{c}");
            n.transpose_inplace();
            assert_eq!(m, n, "{r}x{c} round trip");
        }
    }

    #[test]
    fn transpose_scrambled_excess() {
        let mut rng = SmallRng::seed_from_u64(9);
        let m = BitMatrix::random(&mut rng, 77, 130);
        let mut g = m.clone();
        g.scramble_excess(&mut rng);
        assert_eq!(m, g);
        assert_eq!(m.transposed(), g.transposed());
        let mut gi = g.clone();
        gi.transpose_inplace();
        assert_eq!(gi, m.transposed());
        // and scrambling a padded matrix must not change it either
        gi.scramble_excess(&mut rng);
        gi.transpose_inplace();
        assert_eq!(gi, m);
    }

    #[test]
    fn random_gauss_rank() {
        let mut rng = SmallRng::seed_from_u64(1);
        let m0 = BitMatrix::random(&mut rng, 8, 20);
        let mut m = m0.clone();
        let r = m.gauss(true);
        assert!(r <= 8);

        // garbage in the excess bits must not change the result
        let mut g = m0.clone();
        g.scramble_excess(&mut rng);
        let rg = g.gauss(true);
        assert_eq!(r, rg);
        assert_eq!(m, g);
    }

    #[test]
    fn gauss_echelon_shape() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut m = BitMatrix::random(&mut rng, 40, 60);
        let r = m.gauss(true);
        // leading columns strictly increase, and pivot columns are cleared elsewhere
        let mut last = None;
        for i in 0..r {
            let lead = (0..60).find(|&j| m.bit(i, j)).unwrap();
            if let Some(l) = last {
                assert!(lead > l);
            }
            for ii in 0..40 {
                if ii != i {
                    assert!(!m.bit(ii, lead));
                }
            }
            last = Some(lead);
        }
        for i in r..40 {
            assert!((0..60).all(|j| !m.bit(i, j)));
        }
    }

    #[test]
    fn matrix_add() {
        let mut rng = SmallRng::seed_from_u64(6);
        let a = BitMatrix::random(&mut rng, 33, 70);
        let b = BitMatrix::random(&mut rng, 33, 70);
        let c = &a ^ &b;
        for i in 0..33 {
            for j in 0..70 {
                assert_eq!(c.bit(i, j), a.bit(i, j) ^ b.bit(i, j));
            }
        }
        let z = &a ^ &a;
        assert!(z.is_zero());
    }

    #[test]
    fn matrix_mult() {
        let mut rng = SmallRng::seed_from_u64(1);
        let m1 = BitMatrix::random(&mut rng, 80, 100);
        let m2 = BitMatrix::random(&mut rng, 100, 70);
        let m3 = &m1 * &m2;

        for i in 0..m3.rows() {
            for j in 0..m3.cols() {
                let mut b = false;
                for k in 0..m1.cols() {
                    b ^= m1.bit(i, k) & m2.bit(k, j);
                }
                assert_eq!(m3.bit(i, j), b);
            }
        }
    }

    #[test]
    fn matrix_inv() {
        let mut rng = SmallRng::seed_from_u64(1);
        let sz = 100;
        let m = BitMatrix::random_invertible(&mut rng, sz);
        let n = m.inverse();
        let id = BitMatrix::identity(sz);

        assert_eq!(&m * &n, id);
        assert_eq!(&n * &m, id);
    }

    #[test]
    #[should_panic(expected = "Matrix is not invertible")]
    fn inverse_singular_panics() {
        let mut m = BitMatrix::identity(5);
        m.set_bit(2, 2, false);
        let _ = m.inverse();
    }

    #[test]
    fn concat_stack() {
        let mut rng = SmallRng::seed_from_u64(8);
        let a = BitMatrix::random(&mut rng, 10, 33);
        let b = BitMatrix::random(&mut rng, 10, 40);
        let c = a.concat(&b);
        assert_eq!((c.rows(), c.cols()), (10, 73));
        for i in 0..10 {
            for j in 0..33 {
                assert_eq!(c.bit(i, j), a.bit(i, j));
            }
            for j in 0..40 {
                assert_eq!(c.bit(i, 33 + j), b.bit(i, j));
            }
        }

        let d = BitMatrix::random(&mut rng, 7, 33);
        let s = a.stack(&d);
        assert_eq!((s.rows(), s.cols()), (17, 33));
        for j in 0..33 {
            for i in 0..10 {
                assert_eq!(s.bit(i, j), a.bit(i, j));
            }
            for i in 0..7 {
                assert_eq!(s.bit(10 + i, j), d.bit(i, j));
            }
        }
    }

    #[test]
    fn count_and_zero() {
        let mut m = BitMatrix::zeros(5, 70);
        assert!(m.is_zero());
        assert_eq!(m.count_ones(), 0);
        m.set_bit(0, 0, true);
        m.set_bit(4, 69, true);
        assert!(!m.is_zero());
        assert_eq!(m.count_ones(), 2);
    }
}
