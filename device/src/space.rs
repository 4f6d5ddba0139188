//! Memory-space tags.

use std::str::FromStr;

use aligned_vec::CACHELINE_ALIGN;

use crate::error::{InvalidSpaceSnafu, Result};

/// Page size used for page-locked host allocations.
pub const PAGE_ALIGN: usize = 4096;

/// Category of storage an array lives in.
///
/// Host and pinned memory are plain host memory (pinned is page-locked in a real
/// driver). Managed memory migrates on demand and is visible on both sides.
/// Device memory is only reachable from device code; the host sees it through
/// explicit transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemorySpace {
    Host,
    Pinned,
    #[strum(to_string = "Managed", serialize = "unified")]
    Managed,
    Device,
}

impl MemorySpace {
    /// Parse a space tag (`"host"`, `"pinned"`, `"managed"`/`"unified"`, `"device"`).
    pub fn parse(tag: &str) -> Result<Self> {
        Self::from_str(tag.trim()).map_err(|_| InvalidSpaceSnafu { tag }.build())
    }

    /// Whether host code may read and write arrays in this space directly.
    pub const fn is_host_accessible(&self) -> bool {
        !matches!(self, Self::Device)
    }

    /// Whether device code works on arrays in this space.
    pub const fn is_device_visible(&self) -> bool {
        !matches!(self, Self::Host)
    }

    /// Byte alignment of allocations in this space.
    pub const fn alignment(&self) -> usize {
        match self {
            Self::Pinned => PAGE_ALIGN,
            Self::Host | Self::Managed | Self::Device => CACHELINE_ALIGN,
        }
    }
}
