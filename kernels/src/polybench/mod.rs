//! Polyhedral benchmark kernels.

mod gemm;

pub use gemm::{Gemm, GemmShape};
