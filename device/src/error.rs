use snafu::Snafu;

use crate::MemorySpace;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Memory-space tag does not name any known space.
    #[snafu(display("invalid memory space: {tag}"))]
    InvalidSpace { tag: String },

    /// Host code tried to touch a device-only array without a transfer.
    #[snafu(display("{space} memory is not host accessible"))]
    NotHostAccessible { space: MemorySpace },

    #[snafu(display("allocation of {len} elements exceeds the addressable size"))]
    AllocationTooLarge { len: usize },

    /// Allocator refused the request (out of memory, injected failure, ...).
    #[snafu(display("{space} allocation of {len} elements failed: {reason}"))]
    AllocationFailed { space: MemorySpace, len: usize, reason: String },
}
