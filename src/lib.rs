//! `gf2dense` is a Rust library for dense linear algebra over the 2-element
//! finite field. Some features include:
//! - getting and setting individual matrix elements (as `bool`s), plus packed
//!   multi-bit reads and writes with bit-level column offsets
//! - fast row operations using bitwise operations, with a SIMD inner loop
//! - fast in-place and out-of-place matrix transpose via a recursive block
//!   method with a 64x64 in-register kernel
//! - matrix multiplication: cubic, Method of Four Russians (Gray-code
//!   tables), and Strassen-Winograd recursion on top
//! - PLE / PLUQ factorization with a Four-Russians base case, and the
//!   algorithms derived from it: echelon forms, rank, kernels, inversion and
//!   solving
//! - triangular solves (TRSM) in all four orientations
//! - non-owning matrix windows, horizontal and vertical concatenation, and a
//!   simple serialization format
//!
//! The main data structures provided by this crate are:
//! - [`BitVec`]: a vector of bits stored in 64-bit blocks, along with
//!   convenience methods for indexing, slicing, and manipulating bits
//! - [`BitMatrix`]: a two-dimensional matrix based on `BitVec`, which
//!   implements the linear algebraic operations
//! - [`Permutation`]: row/column permutations as transposition sequences, as
//!   produced by the factorizations

#![allow(
    clippy::needless_range_loop,
    clippy::suspicious_arithmetic_impl,
    clippy::uninlined_format_args,
    clippy::bool_assert_comparison,
    clippy::cast_possible_truncation,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::bool_to_int_with_if
)]

pub mod bitmatrix;
pub mod bitvec;
pub mod gray;
pub mod io;
pub mod mmc;
pub mod mul;
pub mod permutation;
pub mod ple;
pub mod solve;
pub mod strassen;
pub mod trsm;

pub use bitmatrix::parallel::ParallelMatrixOps;
pub use bitmatrix::window::{BitWindow, BitWindowMut};
pub use bitmatrix::BitMatrix;
pub use bitvec::{BitBlock, BitRange, BitVec, BLOCKSIZE};
pub use io::ReadError;
pub use mul::{addmul_m4rm, addmul_naive, mul_m4rm, mul_naive};
pub use permutation::Permutation;
pub use ple::{ple, pluq};
pub use solve::{echelonize, kernel_left, kernel_right, rank, solve_left, try_inverse};
pub use trsm::{trsm_lower_left, trsm_lower_right, trsm_upper_left, trsm_upper_right};
