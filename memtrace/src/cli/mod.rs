//! Command-line argument parsing and configuration

pub mod args;
pub mod modes;

pub use args::{Args, SymbolizerKind};
pub use modes::parse_modes;
