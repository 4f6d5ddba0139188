//! Named tunings of a variant.

use crate::params::RunParams;
use crate::variant::VariantId;

/// Name of the single tuning of untuned variants.
pub const DEFAULT_TUNING: &str = "default";

/// Block size used when a GPU-launch body runs without a tuning.
pub const DEFAULT_GPU_BLOCK_SIZE: usize = 256;

/// Candidate block sizes a kernel exposes unless it declares its own.
pub const DEFAULT_GPU_BLOCK_SIZES: [usize; 5] = [64, 128, 256, 512, 1024];

/// One named configuration of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tuning {
    name: String,
    block_size: Option<usize>,
}

impl Tuning {
    /// The only tuning of variants without tunable parameters.
    pub fn untuned() -> Self {
        Self { name: DEFAULT_TUNING.to_string(), block_size: None }
    }

    pub fn block(block_size: usize) -> Self {
        Self { name: format!("block_{block_size}"), block_size: Some(block_size) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_size(&self) -> Option<usize> {
        self.block_size
    }
}

impl std::fmt::Display for Tuning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Expands a candidate list into the tunings that pass a filter.
#[derive(Debug, Clone, Copy)]
pub struct TuningEnumerator<'a> {
    candidates: &'a [usize],
}

impl<'a> TuningEnumerator<'a> {
    pub fn new(candidates: &'a [usize]) -> Self {
        Self { candidates }
    }

    /// Candidates accepted by `allowed`, in declaration order, without duplicates.
    pub fn enumerate(&self, allowed: impl Fn(usize) -> bool) -> Vec<Tuning> {
        let mut seen = Vec::with_capacity(self.candidates.len());
        for &size in self.candidates {
            if size > 0 && allowed(size) && !seen.contains(&size) {
                seen.push(size);
            }
        }
        seen.into_iter().map(Tuning::block).collect()
    }
}

/// Tunings to run for `variant`.
///
/// Only the GPU-launch family is tuned; every other variant gets exactly one
/// [`Tuning::untuned`]. An allow-list that excludes every candidate yields no
/// tunings at all.
pub fn tunings_for(variant: VariantId, candidates: &[usize], params: &RunParams) -> Vec<Tuning> {
    if !variant.family().is_tunable() {
        return vec![Tuning::untuned()];
    }
    TuningEnumerator::new(candidates).enumerate(|size| params.is_configuration_allowed(size))
}
