//! Output checksums and their cross-variant comparison.

use std::collections::BTreeMap;

use perfsuite_device::Real;

use crate::variant::VariantId;

/// Relative tolerance used when a kernel does not set its own.
pub const DEFAULT_CHECKSUM_TOLERANCE: f64 = 1e-7;

/// Position-weighted sum `Σ (j+1) · data[j] · scale`.
///
/// Weighting by position makes permuted outputs disagree. The sum is
/// compensated (Neumaier) so that variants reducing in the same order agree to
/// the last few ulps regardless of problem size.
pub fn calc_checksum(data: &[Real], scale: Real) -> f64 {
    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;

    for (j, &value) in data.iter().enumerate() {
        let term = (j as f64 + 1.0) * value * scale;
        let next = sum + term;
        if sum.abs() >= term.abs() {
            compensation += (sum - next) + term;
        } else {
            compensation += (term - next) + sum;
        }
        sum = next;
    }

    sum + compensation
}

/// `|a - b|` relative to the larger magnitude; zero when both are zero.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 { 0.0 } else { (a - b).abs() / scale }
}

pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    relative_difference(a, b) <= tolerance
}

/// Accumulated checksum for one (variant, tuning).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ChecksumSlot {
    pub sum: f64,
    pub updates: usize,
}

impl ChecksumSlot {
    /// Per-pass average; zero if nothing was recorded.
    pub fn mean(&self) -> f64 {
        if self.updates == 0 { 0.0 } else { self.sum / self.updates as f64 }
    }
}

/// Checksums of one kernel, keyed by variant and tuning name.
#[derive(Debug, Default, Clone)]
pub struct ChecksumAccumulator {
    slots: BTreeMap<(VariantId, String), ChecksumSlot>,
}

impl ChecksumAccumulator {
    pub fn accumulate(&mut self, variant: VariantId, tuning: &str, value: f64) {
        let slot = self.slots.entry((variant, tuning.to_string())).or_default();
        slot.sum += value;
        slot.updates += 1;
    }

    pub fn get(&self, variant: VariantId, tuning: &str) -> Option<ChecksumSlot> {
        self.slots.get(&(variant, tuning.to_string())).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
