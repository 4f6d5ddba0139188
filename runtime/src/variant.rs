//! Execution families, implementation styles and the variants they form.
//!
//! A variant is one (family, style) pair. The flat [`VariantId`] enum exists so
//! variants can live in an [`EnumSet`] and print under their conventional
//! `Style_Family` names.

use enumset::EnumSet;

/// Execution model a variant runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionFamily {
    /// Single-threaded loop.
    Seq,
    /// Shared-memory worker pool.
    Threads,
    /// Flat grid of fixed-size blocks; tunable block size.
    GpuLaunch,
    /// Team-based offload with a fixed team count.
    GpuOffload,
}

impl ExecutionFamily {
    /// Runs against device-visible memory.
    pub fn is_gpu(self) -> bool {
        matches!(self, Self::GpuLaunch | Self::GpuOffload)
    }

    /// Exposes block-size tunings.
    pub fn is_tunable(self) -> bool {
        matches!(self, Self::GpuLaunch)
    }
}

/// How a variant's loop body is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImplStyle {
    /// Hand-written loop with the body inline.
    Base,
    /// Body passed through a type-erased closure.
    Lambda,
    /// Body handed to an execution-policy abstraction.
    Library,
}

#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::VariantArray, strum::IntoStaticStr)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantId {
    #[strum(serialize = "Base_Seq")]
    BaseSeq,
    #[strum(serialize = "Lambda_Seq")]
    LambdaSeq,
    #[strum(serialize = "Library_Seq")]
    LibrarySeq,
    #[strum(serialize = "Base_Threads")]
    BaseThreads,
    #[strum(serialize = "Lambda_Threads")]
    LambdaThreads,
    #[strum(serialize = "Library_Threads")]
    LibraryThreads,
    #[strum(serialize = "Base_GpuLaunch")]
    BaseGpuLaunch,
    #[strum(serialize = "Lambda_GpuLaunch")]
    LambdaGpuLaunch,
    #[strum(serialize = "Library_GpuLaunch")]
    LibraryGpuLaunch,
    #[strum(serialize = "Base_GpuOffload")]
    BaseGpuOffload,
    #[strum(serialize = "Lambda_GpuOffload")]
    LambdaGpuOffload,
    #[strum(serialize = "Library_GpuOffload")]
    LibraryGpuOffload,
}

/// Set of variants, e.g. the ones a kernel implements.
pub type VariantSet = EnumSet<VariantId>;

impl VariantId {
    pub fn new(style: ImplStyle, family: ExecutionFamily) -> Self {
        use ExecutionFamily::*;
        use ImplStyle::*;

        match (style, family) {
            (Base, Seq) => Self::BaseSeq,
            (Lambda, Seq) => Self::LambdaSeq,
            (Library, Seq) => Self::LibrarySeq,
            (Base, Threads) => Self::BaseThreads,
            (Lambda, Threads) => Self::LambdaThreads,
            (Library, Threads) => Self::LibraryThreads,
            (Base, GpuLaunch) => Self::BaseGpuLaunch,
            (Lambda, GpuLaunch) => Self::LambdaGpuLaunch,
            (Library, GpuLaunch) => Self::LibraryGpuLaunch,
            (Base, GpuOffload) => Self::BaseGpuOffload,
            (Lambda, GpuOffload) => Self::LambdaGpuOffload,
            (Library, GpuOffload) => Self::LibraryGpuOffload,
        }
    }

    pub fn family(self) -> ExecutionFamily {
        match self {
            Self::BaseSeq | Self::LambdaSeq | Self::LibrarySeq => ExecutionFamily::Seq,
            Self::BaseThreads | Self::LambdaThreads | Self::LibraryThreads => ExecutionFamily::Threads,
            Self::BaseGpuLaunch | Self::LambdaGpuLaunch | Self::LibraryGpuLaunch => ExecutionFamily::GpuLaunch,
            Self::BaseGpuOffload | Self::LambdaGpuOffload | Self::LibraryGpuOffload => ExecutionFamily::GpuOffload,
        }
    }

    pub fn style(self) -> ImplStyle {
        match self {
            Self::BaseSeq | Self::BaseThreads | Self::BaseGpuLaunch | Self::BaseGpuOffload => ImplStyle::Base,
            Self::LambdaSeq | Self::LambdaThreads | Self::LambdaGpuLaunch | Self::LambdaGpuOffload => ImplStyle::Lambda,
            Self::LibrarySeq | Self::LibraryThreads | Self::LibraryGpuLaunch | Self::LibraryGpuOffload => {
                ImplStyle::Library
            }
        }
    }

    /// Parse a variant name, e.g. `Base_Seq`.
    pub fn parse(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }
}

/// Every (style, family) pair drawn from `styles` × `families`.
pub fn variant_set(styles: &[ImplStyle], families: &[ExecutionFamily]) -> VariantSet {
    styles
        .iter()
        .flat_map(|&style| families.iter().map(move |&family| VariantId::new(style, family)))
        .collect()
}
