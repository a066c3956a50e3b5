//! Domain model for memtrace
//!
//! Core types shared by the decoder, the analysis state and the reports:
//! - Newtype addresses so offsets and sizes cannot be confused with them
//! - Shared, immutable backtraces
//! - Structured errors

pub mod errors;
pub mod types;

pub use types::{Address, Backtrace};

pub use errors::{DecodeError, ModuleMapError};
