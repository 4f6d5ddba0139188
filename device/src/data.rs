//! Host-side data initialization and the data-initialization counter.
//!
//! The counter is diagnostic only. It is reset at suite start, bumped by every
//! successful initialization, and never feeds back into generated values, so
//! concurrent updates from independent kernels are harmless.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Real;

static DATA_INIT_COUNT: AtomicU64 = AtomicU64::new(0);

/// Reset the counter (done once at suite start).
pub fn reset_data_init_count() {
    DATA_INIT_COUNT.store(0, Ordering::Relaxed);
}

/// Number of initializations since the last reset.
pub fn data_init_count() -> u64 {
    DATA_INIT_COUNT.load(Ordering::Relaxed)
}

pub(crate) fn inc_data_init_count() {
    DATA_INIT_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Deterministic pattern `factor * (i + 1.1) / (i + 1.12345)`.
///
/// Values stay in a narrow band around `factor`, which keeps weighted checksums
/// well conditioned.
pub fn init_data(len: usize, factor: Real) -> Vec<Real> {
    (0..len)
        .map(|i| {
            let i = i as Real;
            factor * (i + 1.1) / (i + 1.12345)
        })
        .collect()
}

pub fn init_data_const(len: usize, value: Real) -> Vec<Real> {
    vec![value; len]
}

/// Scalar counterpart of [`init_data`].
pub fn init_scalar(factor: Real) -> Real {
    factor * 1.1 / 1.12345
}
