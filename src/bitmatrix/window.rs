//! Non-owning rectangular views into a [`BitMatrix`].
//!
//! A [`BitWindow`] borrows its parent shared and may start at any bit-level
//! column offset. A [`BitWindowMut`] borrows the parent's row span exclusively;
//! disjoint mutable windows are obtained by splitting at a row boundary, which
//! is also how the parallel elimination in [`super::parallel`] partitions work.

use super::BitMatrix;
use crate::bitvec::*;
use ref_cast::RefCast;

/// A shared rectangular view into a parent [`BitMatrix`]
#[derive(Clone, Copy)]
pub struct BitWindow<'a> {
    m: &'a BitMatrix,
    r0: usize,
    c0: usize,
    nrows: usize,
    ncols: usize,
}

/// An exclusive rectangular view over a row span of a parent [`BitMatrix`]
///
/// The view holds the raw blocks of the spanned rows; `col0` is the bit offset
/// of the window's first column within each row.
pub struct BitWindowMut<'a> {
    blocks: &'a mut [BitBlock],
    stride: usize,
    col0: usize,
    nrows: usize,
    ncols: usize,
}

impl BitMatrix {
    /// Returns a shared window of shape `nrows x ncols` with top-left corner
    /// `(r0, c0)`
    pub fn window(&self, r0: usize, c0: usize, nrows: usize, ncols: usize) -> BitWindow<'_> {
        assert!(r0 + nrows <= self.rows() && c0 + ncols <= self.cols());
        BitWindow {
            m: self,
            r0,
            c0,
            nrows,
            ncols,
        }
    }

    /// Returns an exclusive window of shape `nrows x ncols` with top-left
    /// corner `(r0, c0)`. Writes through the window land in this matrix.
    pub fn window_mut(
        &mut self,
        r0: usize,
        c0: usize,
        nrows: usize,
        ncols: usize,
    ) -> BitWindowMut<'_> {
        assert!(r0 + nrows <= self.rows() && c0 + ncols <= self.cols());
        let stride = self.stride;
        let w = self.width();
        let blocks = if nrows == 0 {
            &mut []
        } else {
            let start = r0 * stride;
            let end = (r0 + nrows - 1) * stride + w;
            &mut self.data.as_mut_slice()[start..end]
        };
        BitWindowMut {
            blocks,
            stride,
            col0: c0,
            nrows,
            ncols,
        }
    }

    /// Copies the window starting at `(r0, c0)` with the shape of `dst` into `dst`
    pub(crate) fn extract_into(&self, r0: usize, c0: usize, dst: &mut BitMatrix) {
        self.window(r0, c0, dst.rows(), dst.cols()).extract_into(dst);
    }

    /// Returns a copy of the `nrows x ncols` submatrix with top-left corner
    /// `(r0, c0)`
    pub fn submatrix(&self, r0: usize, c0: usize, nrows: usize, ncols: usize) -> BitMatrix {
        let mut s = BitMatrix::zeros(nrows, ncols);
        self.extract_into(r0, c0, &mut s);
        s
    }

    /// Overwrites the region with top-left corner `(r0, c0)` with `src`
    pub fn write_submatrix(&mut self, r0: usize, c0: usize, src: &BitMatrix) {
        self.window_mut(r0, c0, src.rows(), src.cols()).copy_from(src);
    }

    /// XORs `src` into the region with top-left corner `(r0, c0)`
    pub fn xor_submatrix(&mut self, r0: usize, c0: usize, src: &BitMatrix) {
        self.window_mut(r0, c0, src.rows(), src.cols()).xor_from(src);
    }
}

impl<'a> BitWindow<'a> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn bit(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.nrows && j < self.ncols);
        self.m.bit(self.r0 + i, self.c0 + j)
    }

    /// Reads `n <= 64` bits of window row `i` starting at window column `j`
    #[inline]
    pub fn read_bits(&self, i: usize, j: usize, n: usize) -> BitBlock {
        debug_assert!(i < self.nrows && j + n <= self.ncols);
        self.m.read_bits(self.r0 + i, self.c0 + j, n)
    }

    /// Copies the window into an owned matrix
    pub fn to_matrix(&self) -> BitMatrix {
        let mut dst = BitMatrix::zeros(self.nrows, self.ncols);
        self.extract_into(&mut dst);
        dst
    }

    /// Copies the window into `dst`, which must have the window's shape.
    /// Don't-care bits of `dst` may be left with arbitrary values.
    pub(crate) fn extract_into(&self, dst: &mut BitMatrix) {
        debug_assert!(dst.rows() == self.nrows && dst.cols() == self.ncols);
        if self.ncols == 0 {
            return;
        }
        let w = dst.width();
        if self.c0 % BLOCKSIZE == 0 {
            // aligned: straight block copies; the tail block may carry
            // neighboring parent bits, which land in dst's don't-care region
            let w0 = self.c0 / BLOCKSIZE;
            for i in 0..self.nrows {
                let src = self.m.row_words(self.r0 + i);
                let avail = usize::min(w, src.len() - w0);
                let drow = dst.row_mut(i).as_mut_slice();
                drow[..avail].copy_from_slice(&src[w0..w0 + avail]);
            }
        } else {
            // offset path: gather 64-bit chunks
            for i in 0..self.nrows {
                let drow = dst.row_mut(i);
                let mut j = 0;
                while j < self.ncols {
                    let n = usize::min(BLOCKSIZE, self.ncols - j);
                    let v = self.m.read_bits(self.r0 + i, self.c0 + j, n);
                    drow[j / BLOCKSIZE] = v;
                    j += n;
                }
            }
        }
    }
}

impl<'a> BitWindowMut<'a> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.ncols
    }

    /// Blocks of window row `i`, from the row start through the window's last
    /// valid block (bit `col0` is the window's first column)
    #[inline]
    pub(crate) fn row(&self, i: usize) -> &BitRange {
        let b = i * self.stride;
        let w = min_blocks(self.col0 + self.ncols);
        BitRange::ref_cast(&self.blocks[b..b + w])
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut BitRange {
        let b = i * self.stride;
        let w = min_blocks(self.col0 + self.ncols);
        BitRange::ref_cast_mut(&mut self.blocks[b..b + w])
    }

    /// XORs a row `src` (blocks counted from the parent row start, as
    /// returned by [`row`](Self::row)) into window row `i`, starting at
    /// window column `from`
    pub(crate) fn xor_row(&mut self, i: usize, src: &BitRange, from: usize) {
        debug_assert!(from < self.ncols);
        let start = self.col0 + from;
        let w0 = start / BLOCKSIZE;
        let spot = start % BLOCKSIZE;
        let end = min_blocks(self.col0 + self.ncols);
        let b = i * self.stride;
        let row = &mut self.blocks[b + w0..b + end];
        row[0] ^= src[w0] & (BitBlock::MAX << spot);
        for (j, d) in row.iter_mut().enumerate().skip(1) {
            *d ^= src[w0 + j];
        }
    }

    #[inline]
    pub fn bit(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.nrows && j < self.ncols);
        self.row(i).bit(self.col0 + j)
    }

    #[inline]
    pub fn set_bit(&mut self, i: usize, j: usize, b: bool) {
        debug_assert!(i < self.nrows && j < self.ncols);
        let c = self.col0 + j;
        self.row_mut(i).set_bit(c, b);
    }

    /// Reads `n <= 64` bits of window row `i` starting at window column `j`
    #[inline]
    pub fn read_bits(&self, i: usize, j: usize, n: usize) -> BitBlock {
        debug_assert!(j + n <= self.ncols);
        self.row(i).read_bits(self.col0 + j, n)
    }

    /// XORs the low `n` bits of `values` into window row `i` at column `j`
    #[inline]
    pub fn xor_bits(&mut self, i: usize, j: usize, n: usize, values: BitBlock) {
        debug_assert!(j + n <= self.ncols);
        let c = self.col0 + j;
        self.row_mut(i).xor_bits(c, n, values);
    }

    /// Writes the low `n` bits of `values` into window row `i` at column `j`
    #[inline]
    pub fn write_bits(&mut self, i: usize, j: usize, n: usize, values: BitBlock) {
        debug_assert!(j + n <= self.ncols);
        let c = self.col0 + j;
        self.row_mut(i).write_bits(c, n, values);
    }

    /// Splits the window into two disjoint windows at row `mid`
    pub fn split_at_row(self, mid: usize) -> (BitWindowMut<'a>, BitWindowMut<'a>) {
        assert!(mid <= self.nrows);
        let cut = mid * self.stride;
        let cut = usize::min(cut, self.blocks.len());
        let (top, bottom) = self.blocks.split_at_mut(cut);
        (
            BitWindowMut {
                blocks: top,
                stride: self.stride,
                col0: self.col0,
                nrows: mid,
                ncols: self.ncols,
            },
            BitWindowMut {
                blocks: bottom,
                stride: self.stride,
                col0: self.col0,
                nrows: self.nrows - mid,
                ncols: self.ncols,
            },
        )
    }

    /// Overwrites the window with `src`, which must have the window's shape.
    /// Parent bits on either side of the window are preserved.
    pub fn copy_from(&mut self, src: &BitMatrix) {
        assert!(src.rows() == self.nrows && src.cols() == self.ncols);
        if self.ncols == 0 {
            return;
        }
        if self.col0 % BLOCKSIZE == 0 {
            // aligned: whole blocks, with a masked tail block
            let w0 = self.col0 / BLOCKSIZE;
            let full = self.ncols / BLOCKSIZE;
            let tail = self.ncols % BLOCKSIZE;
            let tmask = left_mask(tail);
            for i in 0..self.nrows {
                let srow = src.row_words(i);
                let base = i * self.stride + w0;
                self.blocks[base..base + full].copy_from_slice(&srow[..full]);
                if tail != 0 {
                    let d = &mut self.blocks[base + full];
                    *d = (*d & !tmask) | (srow[full] & tmask);
                }
            }
        } else {
            for i in 0..self.nrows {
                let mut j = 0;
                while j < self.ncols {
                    let n = usize::min(BLOCKSIZE, self.ncols - j);
                    let v = src.read_bits(i, j, n);
                    self.write_bits(i, j, n, v);
                    j += n;
                }
            }
        }
    }

    /// XORs `src` into the window, which must have the window's shape
    pub fn xor_from(&mut self, src: &BitMatrix) {
        assert!(src.rows() == self.nrows && src.cols() == self.ncols);
        if self.ncols == 0 {
            return;
        }
        if self.col0 % BLOCKSIZE == 0 {
            let w0 = self.col0 / BLOCKSIZE;
            let full = self.ncols / BLOCKSIZE;
            let tail = self.ncols % BLOCKSIZE;
            let tmask = left_mask(tail);
            for i in 0..self.nrows {
                let srow = src.row_words(i);
                let base = i * self.stride + w0;
                crate::bitvec::xor_blocks(&mut self.blocks[base..base + full], &srow[..full]);
                if tail != 0 {
                    self.blocks[base + full] ^= srow[full] & tmask;
                }
            }
        } else {
            for i in 0..self.nrows {
                let mut j = 0;
                while j < self.ncols {
                    let n = usize::min(BLOCKSIZE, self.ncols - j);
                    let v = src.read_bits(i, j, n);
                    self.xor_bits(i, j, n, v);
                    j += n;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn window_reads_match_parent() {
        let mut rng = SmallRng::seed_from_u64(11);
        let m = BitMatrix::random(&mut rng, 40, 150);
        for &(r0, c0, nr, nc) in &[(0, 0, 40, 150), (3, 5, 10, 64), (7, 63, 20, 66), (0, 64, 5, 86)]
        {
            let w = m.window(r0, c0, nr, nc);
            for i in 0..nr {
                for j in 0..nc {
                    assert_eq!(w.bit(i, j), m.bit(r0 + i, c0 + j));
                }
            }
            let s = w.to_matrix();
            for i in 0..nr {
                for j in 0..nc {
                    assert_eq!(s.bit(i, j), m.bit(r0 + i, c0 + j));
                }
            }
        }
    }

    #[test]
    fn writes_reflect_in_parent() {
        let mut rng = SmallRng::seed_from_u64(12);
        let m0 = BitMatrix::random(&mut rng, 30, 100);
        let s = BitMatrix::random(&mut rng, 8, 33);

        for &c0 in &[0, 5, 64, 67] {
            let mut m = m0.clone();
            m.write_submatrix(4, c0, &s);
            for i in 0..30 {
                for j in 0..100 {
                    let inside = (4..12).contains(&i) && (c0..c0 + 33).contains(&j);
                    let expect = if inside {
                        s.bit(i - 4, j - c0)
                    } else {
                        m0.bit(i, j)
                    };
                    assert_eq!(m.bit(i, j), expect, "c0 {c0} at ({i},{j})");
                }
            }

            let mut m = m0.clone();
            m.xor_submatrix(4, c0, &s);
            for i in 0..30 {
                for j in 0..100 {
                    let inside = (4..12).contains(&i) && (c0..c0 + 33).contains(&j);
                    let expect = m0.bit(i, j) ^ (inside && s.bit(i - 4, j - c0));
                    assert_eq!(m.bit(i, j), expect, "xor c0 {c0} at ({i},{j})");
                }
            }
        }
    }

    #[test]
    fn submatrix_roundtrip() {
        let mut rng = SmallRng::seed_from_u64(13);
        let m0 = BitMatrix::random(&mut rng, 25, 90);
        let s = m0.submatrix(3, 17, 10, 50);
        let mut m = BitMatrix::zeros(25, 90);
        m.write_submatrix(3, 17, &s);
        for i in 0..10 {
            for j in 0..50 {
                assert_eq!(m.bit(3 + i, 17 + j), m0.bit(3 + i, 17 + j));
            }
        }
    }

    #[test]
    fn split_windows_are_disjoint() {
        let mut m = BitMatrix::zeros(20, 70);
        let w = m.window_mut(0, 3, 20, 60);
        let (mut top, mut bottom) = w.split_at_row(8);
        assert_eq!(top.rows(), 8);
        assert_eq!(bottom.rows(), 12);
        top.set_bit(0, 0, true);
        bottom.set_bit(0, 0, true);
        bottom.write_bits(11, 50, 10, 0x3ff);
        assert!(m.bit(0, 3));
        assert!(m.bit(8, 3));
        for j in 53..63 {
            assert!(m.bit(19, j));
        }
        // nothing else was touched
        assert_eq!(m.count_ones(), 12);
    }

    #[test]
    fn window_boundary_hygiene() {
        // writes through a window sharing a block with its neighbor must not
        // corrupt the neighbor's bits
        let mut rng = SmallRng::seed_from_u64(14);
        let m0 = BitMatrix::random(&mut rng, 10, 128);
        let left = m0.submatrix(0, 0, 10, 61);
        let right = m0.submatrix(0, 61, 10, 67);

        let mut m = m0.clone();
        let s = BitMatrix::random(&mut rng, 10, 67);
        m.write_submatrix(0, 61, &s);
        assert_eq!(m.submatrix(0, 0, 10, 61), left);
        assert_eq!(m.submatrix(0, 61, 10, 67), s);

        let mut m = m0.clone();
        let z = BitMatrix::zeros(10, 61);
        m.write_submatrix(0, 0, &z);
        assert_eq!(m.submatrix(0, 61, 10, 67), right);
    }
}
