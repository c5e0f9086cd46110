//! Types hosts interact with: errors and cast dispatch results.
mod cast;
mod errors;

pub use cast::{CastDispatch, CastReport, CasterInfo, InterruptTarget};
pub use errors::{Result, RuntimeError};
