//! Error types for the benchmark runtime.

use snafu::Snafu;

use crate::kernel::{LifecycleState, Operation};
use crate::variant::VariantId;

/// Result type for runtime operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while driving kernels.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Lifecycle operation called out of order.
    #[snafu(display("{operation} on kernel '{kernel}' is not allowed in state {state}"))]
    Lifecycle { kernel: String, operation: Operation, state: LifecycleState },

    /// Timer misuse.
    #[snafu(display("Timer error: {reason}"))]
    Timer { reason: String },

    /// Memory-space failure.
    #[snafu(display("Memory space error: {source}"))]
    Device { source: perfsuite_device::Error },

    /// Kernel body asked for data it never allocated.
    #[snafu(display("Kernel '{kernel}' has no data; set-up has not run"))]
    MissingData { kernel: String },

    /// Arrays still live after a kernel tore down its data.
    #[snafu(display("Kernel '{kernel}' ({variant}) left {live} array(s) allocated after tear-down"))]
    ResourceLeak { kernel: String, variant: VariantId, live: usize },

    /// Invalid run configuration.
    #[snafu(display("Invalid configuration: {reason}"))]
    InvalidConfig { reason: String },

    /// Fatal failure while running one kernel; halts the suite.
    #[snafu(display("Kernel '{kernel}' failed during {operation} of {variant}: {source}"))]
    KernelFailure {
        kernel: String,
        variant: VariantId,
        operation: Operation,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },
}

impl From<perfsuite_device::Error> for Error {
    fn from(source: perfsuite_device::Error) -> Self {
        Error::Device { source }
    }
}
