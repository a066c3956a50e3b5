//! # Backtrace Symbolization
//!
//! Turns the raw return addresses recorded in the trace into function names
//! and source locations.
//!
//! ## Address Translation Flow
//!
//! ```text
//! 1. Backtrace frame from the trace
//!    0x8f012345
//!
//! 2. Find the module range containing it (first match, in trace order)
//!    usb-hcd: 0x8f000000 - 0x8f040000
//!    (no match → "kernel", address unchanged)
//!
//! 3. Make it module-relative
//!    offset = 0x8f012345 - 0x8f000000 = 0x12345
//!
//! 4. Map the module to its debug artifact
//!    usb-hcd → build/modules/usb-hcd.ko
//!
//! 5. If the artifact exists, symbolicate (artifact, offset)
//!    → Ehci::doDequeue (src/modules/drivers/common/usb-hcd/Ehci.cc:612)
//! ```
//!
//! ## Module Structure
//!
//! - **`module_ranges`**: Module address ranges announced by the trace
//! - **`artifacts`**: Module name → debug artifact path
//! - **`symbolizer`**: In-process DWARF symbolication (`addr2line`, `gimli`, `object` crates)
//! - **`addr2line_command`**: Symbolication through the external `addr2line` tool
//!
//! The symbolicator is a [`Symbolicate`] trait object so reports can be
//! rendered against a deterministic fake in tests.

pub mod addr2line_command;
pub mod artifacts;
pub mod module_ranges;
pub mod symbolizer;

use anyhow::Result;
use std::path::Path;

pub use addr2line_command::Addr2lineCommand;
pub use artifacts::ArtifactMap;
pub use module_ranges::{ModuleOffset, ModuleRange, ModuleRangeIndex, KERNEL_MODULE};
pub use symbolizer::{DwarfSymbolicator, Symbolizer};

/// Resolves an offset within a debug artifact to a printable location
pub trait Symbolicate {
    /// Describe `offset` in `artifact`, typically as `function (file:line)`
    ///
    /// # Errors
    /// Returns an error if the artifact cannot be used or the lookup fails
    fn symbolicate(&self, artifact: &Path, offset: u64) -> Result<String>;
}
