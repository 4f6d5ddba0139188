//! Run parameters.
//!
//! Built explicitly with a bon builder or read from `PERFSUITE_*` environment
//! variables. Unset variables fall back to the builder defaults; malformed ones
//! are reported instead of silently ignored.

use bon::bon;
use perfsuite_device::MemorySpace;

use crate::checksum::DEFAULT_CHECKSUM_TOLERANCE;
use crate::error::{InvalidConfigSnafu, Result};
use crate::variant::{VariantId, VariantSet};

/// Suite-wide configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunParams {
    /// Multiplier applied to each kernel's default problem size.
    pub size_factor: f64,
    /// Multiplier applied to each kernel's default repetition count.
    pub rep_factor: f64,
    /// Timed passes per (kernel, variant, tuning).
    pub npasses: usize,
    /// Allow-list of GPU block sizes. Empty allows every candidate.
    pub gpu_block_sizes: Vec<usize>,
    /// Space holding arrays of GPU-family variants.
    pub gpu_memory_space: MemorySpace,
    /// Kernel names to run. Empty runs all.
    pub kernels: Vec<String>,
    /// Variants to run. `None` runs whatever each kernel supports.
    pub variants: Option<VariantSet>,
    /// Relative checksum tolerance for kernels that do not set their own.
    pub checksum_tolerance: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            size_factor: 1.0,
            rep_factor: 1.0,
            npasses: 1,
            gpu_block_sizes: Vec::new(),
            gpu_memory_space: MemorySpace::Device,
            kernels: Vec::new(),
            variants: None,
            checksum_tolerance: DEFAULT_CHECKSUM_TOLERANCE,
        }
    }
}

#[bon]
impl RunParams {
    /// Create validated run parameters with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = 1.0)] size_factor: f64,
        #[builder(default = 1.0)] rep_factor: f64,
        #[builder(default = 1)] npasses: usize,
        #[builder(default)] gpu_block_sizes: Vec<usize>,
        #[builder(default = MemorySpace::Device)] gpu_memory_space: MemorySpace,
        #[builder(default)] kernels: Vec<String>,
        variants: Option<VariantSet>,
        #[builder(default = DEFAULT_CHECKSUM_TOLERANCE)] checksum_tolerance: f64,
    ) -> Result<Self> {
        snafu::ensure!(
            size_factor.is_finite() && size_factor > 0.0,
            InvalidConfigSnafu { reason: format!("size factor must be positive, got {size_factor}") }
        );
        snafu::ensure!(
            rep_factor.is_finite() && rep_factor > 0.0,
            InvalidConfigSnafu { reason: format!("rep factor must be positive, got {rep_factor}") }
        );
        snafu::ensure!(npasses > 0, InvalidConfigSnafu { reason: "at least one pass is required" });
        snafu::ensure!(
            gpu_block_sizes.iter().all(|&size| size > 0),
            InvalidConfigSnafu { reason: "GPU block sizes must be positive" }
        );
        snafu::ensure!(
            gpu_memory_space.is_device_visible(),
            InvalidConfigSnafu { reason: format!("GPU variants cannot run on {gpu_memory_space} memory") }
        );
        snafu::ensure!(
            checksum_tolerance.is_finite() && checksum_tolerance >= 0.0,
            InvalidConfigSnafu { reason: format!("checksum tolerance must be non-negative, got {checksum_tolerance}") }
        );

        Ok(Self {
            size_factor,
            rep_factor,
            npasses,
            gpu_block_sizes,
            gpu_memory_space,
            kernels,
            variants,
            checksum_tolerance,
        })
    }

    /// Create parameters from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `PERFSUITE_SIZE_FACTOR` - Problem size multiplier (default: 1.0)
    /// * `PERFSUITE_REP_FACTOR` - Repetition multiplier (default: 1.0)
    /// * `PERFSUITE_NPASSES` - Timed passes (default: 1)
    /// * `PERFSUITE_GPU_BLOCK_SIZES` - Comma-separated block-size allow-list
    /// * `PERFSUITE_GPU_MEMORY_SPACE` - `pinned`, `managed` or `device` (default: device)
    /// * `PERFSUITE_KERNELS` - Comma-separated kernel names
    /// * `PERFSUITE_VARIANTS` - Comma-separated variant names, e.g. `Base_Seq,Library_GpuLaunch`
    /// * `PERFSUITE_CHECKSUM_TOLERANCE` - Relative tolerance (default: 1e-7)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let size_factor = parse_var(&lookup, "PERFSUITE_SIZE_FACTOR")?.unwrap_or(1.0);
        let rep_factor = parse_var(&lookup, "PERFSUITE_REP_FACTOR")?.unwrap_or(1.0);
        let npasses = parse_var(&lookup, "PERFSUITE_NPASSES")?.unwrap_or(1);
        let checksum_tolerance =
            parse_var(&lookup, "PERFSUITE_CHECKSUM_TOLERANCE")?.unwrap_or(DEFAULT_CHECKSUM_TOLERANCE);

        let gpu_block_sizes = match lookup("PERFSUITE_GPU_BLOCK_SIZES") {
            Some(list) => split_list(&list)
                .map(|item| {
                    item.parse().map_err(|_| {
                        InvalidConfigSnafu { reason: format!("PERFSUITE_GPU_BLOCK_SIZES: '{item}' is not a block size") }
                            .build()
                    })
                })
                .collect::<Result<Vec<usize>>>()?,
            None => Vec::new(),
        };

        let gpu_memory_space = match lookup("PERFSUITE_GPU_MEMORY_SPACE") {
            Some(tag) => MemorySpace::parse(&tag)?,
            None => MemorySpace::Device,
        };

        let kernels: Vec<String> = lookup("PERFSUITE_KERNELS")
            .map(|list| split_list(&list).map(str::to_string).collect())
            .unwrap_or_default();

        let variants = match lookup("PERFSUITE_VARIANTS") {
            Some(list) => Some(
                split_list(&list)
                    .map(|name| {
                        VariantId::parse(name).ok_or_else(|| {
                            InvalidConfigSnafu { reason: format!("PERFSUITE_VARIANTS: unknown variant '{name}'") }
                                .build()
                        })
                    })
                    .collect::<Result<VariantSet>>()?,
            ),
            None => None,
        };

        Self::builder()
            .size_factor(size_factor)
            .rep_factor(rep_factor)
            .npasses(npasses)
            .gpu_block_sizes(gpu_block_sizes)
            .gpu_memory_space(gpu_memory_space)
            .kernels(kernels)
            .maybe_variants(variants)
            .checksum_tolerance(checksum_tolerance)
            .build()
    }

    /// Whether a GPU block size passes the allow-list.
    pub fn is_configuration_allowed(&self, block_size: usize) -> bool {
        self.gpu_block_sizes.is_empty() || self.gpu_block_sizes.contains(&block_size)
    }

    /// Size of the allow-list; zero means unrestricted.
    pub fn num_allowed_configurations(&self) -> usize {
        self.gpu_block_sizes.len()
    }

    pub fn is_kernel_selected(&self, name: &str) -> bool {
        self.kernels.is_empty() || self.kernels.iter().any(|selected| selected == name)
    }

    /// Problem size for a kernel whose default is `default_size`.
    pub fn target_size(&self, default_size: usize) -> usize {
        scale(default_size, self.size_factor)
    }

    /// Repetitions for a kernel whose default is `default_reps`.
    pub fn run_reps(&self, default_reps: usize) -> usize {
        scale(default_reps, self.rep_factor)
    }
}

fn scale(base: usize, factor: f64) -> usize {
    ((base as f64) * factor).round().max(1.0) as usize
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => InvalidConfigSnafu { reason: format!("{key}: cannot parse '{raw}'") }.fail(),
        },
        None => Ok(None),
    }
}
