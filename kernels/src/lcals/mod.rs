//! Livermore compiler analysis loops.

mod eos;
pub(crate) mod hydro_1d;

pub use eos::Eos;
pub use hydro_1d::Hydro1d;
