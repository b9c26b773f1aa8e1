//! Matrix serialization.
//!
//! The format is a fixed header followed by the rows: a 4-byte magic, a
//! one-byte version, the dimensions as little-endian `u64`s, then
//! `ceil(cols / 8)` bytes per row with the lowest-index column in the most
//! significant bit of each byte. Trailing bits of the last byte of a row are
//! written as zero and ignored on read.

use crate::bitmatrix::BitMatrix;
use std::io::{Read, Write};
use thiserror::Error;

const MAGIC: [u8; 4] = *b"GF2M";
const VERSION: u8 = 1;

/// Errors produced when reading a serialized matrix
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),

    #[error("dimensions {0}x{1} do not fit in memory")]
    Dimensions(u64, u64),
}

impl BitMatrix {
    /// Serializes the matrix to `w`
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&[VERSION])?;
        w.write_all(&(self.rows() as u64).to_le_bytes())?;
        w.write_all(&(self.cols() as u64).to_le_bytes())?;

        let rb = self.cols().div_ceil(8);
        let mut buf = vec![0u8; rb];
        for i in 0..self.rows() {
            buf.fill(0);
            for j in 0..self.cols() {
                if self.bit(i, j) {
                    buf[j / 8] |= 0x80 >> (j % 8);
                }
            }
            w.write_all(&buf)?;
        }
        Ok(())
    }

    /// Deserializes a matrix from `r`
    pub fn read_from<R: Read>(r: &mut R) -> Result<BitMatrix, ReadError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(ReadError::BadMagic(magic));
        }
        let mut version = [0u8; 1];
        r.read_exact(&mut version)?;
        if version[0] != VERSION {
            return Err(ReadError::UnsupportedVersion(version[0]));
        }
        let mut dim = [0u8; 8];
        r.read_exact(&mut dim)?;
        let nrows = u64::from_le_bytes(dim);
        r.read_exact(&mut dim)?;
        let ncols = u64::from_le_bytes(dim);

        let (rows, cols) = match (usize::try_from(nrows), usize::try_from(ncols)) {
            (Ok(r), Ok(c)) if r.checked_mul(c.div_ceil(8).max(1)).is_some() => (r, c),
            _ => return Err(ReadError::Dimensions(nrows, ncols)),
        };

        let mut m = BitMatrix::zeros(rows, cols);
        let rb = cols.div_ceil(8);
        let mut buf = vec![0u8; rb];
        for i in 0..rows {
            r.read_exact(&mut buf)?;
            for j in 0..cols {
                if buf[j / 8] & (0x80 >> (j % 8)) != 0 {
                    m.set_bit(i, j, true);
                }
            }
        }
        Ok(m)
    }
}
