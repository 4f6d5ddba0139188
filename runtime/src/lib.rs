//! Benchmark runtime: variants, tunings, kernel lifecycle and suite driver.
//!
//! # Execution
//!
//! The `exec` module runs element-wise kernel bodies under every execution
//! family (sequential, worker pool, emulated GPU launch and offload) in three
//! implementation styles.
//!
//! # Lifecycle
//!
//! `kernel` defines the hooks a benchmark kernel implements and the state
//! machine that orders them; `suite` walks kernels × variants × tunings and
//! collects a [`SuiteReport`].

pub mod checksum;
pub mod error;
pub mod exec;
pub mod kernel;
pub mod params;
pub mod report;
pub mod suite;
pub mod timer;
pub mod tuning;
pub mod variant;


pub use checksum::{
    ChecksumAccumulator, ChecksumSlot, DEFAULT_CHECKSUM_TOLERANCE, calc_checksum, relative_difference,
    within_tolerance,
};
pub use error::*;
pub use exec::{Dispatch, ExecPolicy, GpuExec, LaunchConfig, OFFLOAD_TEAMS, OffloadExec, SeqExec, Step, ThreadExec, forall};
pub use kernel::{
    DataContext, KernelBody, KernelInfo, KernelInstance, LifecycleState, Operation, RunContext, RunOutcome,
    memory_space_for,
};
pub use params::RunParams;
pub use report::{ChecksumCheck, CollectingSink, Diagnostic, ReportSink, ResultRecord, SkipReason, SuiteReport};
pub use suite::SuiteRunner;
pub use timer::{Timer, TimingStats};
pub use tuning::{DEFAULT_GPU_BLOCK_SIZE, DEFAULT_GPU_BLOCK_SIZES, DEFAULT_TUNING, Tuning, TuningEnumerator, tunings_for};
pub use variant::{ExecutionFamily, ImplStyle, VariantId, VariantSet, variant_set};
