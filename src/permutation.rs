//! Row and column permutations as sequences of transpositions.
//!
//! `values[i] = j` (with `j >= i`) means: at step `i`, swap positions `i` and
//! `j`. The forward application walks the steps in ascending order, the
//! inverse application in descending order. This is the shape the
//! factorization routines produce, and composition never has to be
//! materialized.

use crate::bitmatrix::BitMatrix;

/// A permutation stored as a normalized sequence of transpositions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permutation {
    values: Vec<usize>,
}

impl Permutation {
    /// The identity permutation on `length` elements
    pub fn identity(length: usize) -> Self {
        Permutation {
            values: (0..length).collect(),
        }
    }

    /// Builds the transposition sequence that, applied forward to the
    /// arrangement `0, 1, ..`, leaves `order[i]` at position `i`.
    ///
    /// `order` must be a permutation of `0..order.len()`.
    pub fn from_order(order: &[usize]) -> Self {
        let n = order.len();
        let mut cur: Vec<usize> = (0..n).collect(); // cur[pos] = label
        let mut loc: Vec<usize> = (0..n).collect(); // loc[label] = pos
        let mut values = vec![0; n];
        for i in 0..n {
            let j = loc[order[i]];
            debug_assert!(j >= i);
            values[i] = j;
            let li = cur[i];
            cur.swap(i, j);
            loc[order[i]] = i;
            loc[li] = j;
        }
        Permutation { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The transposition target at step `i`
    #[inline]
    pub fn value(&self, i: usize) -> usize {
        self.values[i]
    }

    /// Applies the permutation to the rows of `m`, walking the transpositions
    /// in ascending order
    pub fn apply_rows(&self, m: &mut BitMatrix) {
        debug_assert_eq!(self.len(), m.rows());
        for (i, &j) in self.values.iter().enumerate() {
            if i != j {
                m.row_swap(i, j);
            }
        }
    }

    /// Applies the inverse permutation to the rows of `m`
    pub fn apply_rows_inv(&self, m: &mut BitMatrix) {
        debug_assert_eq!(self.len(), m.rows());
        for (i, &j) in self.values.iter().enumerate().rev() {
            if i != j {
                m.row_swap(i, j);
            }
        }
    }

    /// Applies the permutation to the columns of `m`
    pub fn apply_cols(&self, m: &mut BitMatrix) {
        debug_assert_eq!(self.len(), m.cols());
        for (i, &j) in self.values.iter().enumerate() {
            if i != j {
                m.col_swap(i, j);
            }
        }
    }

    /// Applies the inverse permutation to the columns of `m`
    pub fn apply_cols_inv(&self, m: &mut BitMatrix) {
        debug_assert_eq!(self.len(), m.cols());
        for (i, &j) in self.values.iter().enumerate().rev() {
            if i != j {
                m.col_swap(i, j);
            }
        }
    }
}
