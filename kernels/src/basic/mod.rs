//! Simple streaming and initialization loops.

pub(crate) mod daxpy;
mod init_view1d;
mod init_view1d_offset;
mod nested_init;

pub use daxpy::Daxpy;
pub use init_view1d::InitView1d;
pub use init_view1d_offset::InitView1dOffset;
pub use nested_init::NestedInit;
