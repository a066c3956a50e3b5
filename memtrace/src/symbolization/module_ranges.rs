//! Module address ranges captured in the trace
//!
//! Every loaded module announces the address range it occupies. Backtrace
//! addresses are made relative to the module they fall in so they can be
//! looked up in that module's debug artifact.

use log::debug;
use serde::Serialize;

use crate::domain::Address;

/// Pseudo-module for addresses outside every announced range
///
/// The kernel image is linked at its load address, so its addresses are
/// used as-is.
pub const KERNEL_MODULE: &str = "kernel";

/// Address range `[start, end)` occupied by a named module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRange {
    pub name: String,
    pub start: Address,
    pub end: Address,
}

impl ModuleRange {
    /// Check if an address falls within this range
    #[must_use]
    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// An address expressed relative to the module containing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleOffset<'a> {
    pub module: &'a str,
    pub offset: u64,
}

/// Module ranges in the order the trace announced them
///
/// Ranges are neither deduplicated nor checked for overlap. Lookup is a
/// linear first-match scan, so when ranges do overlap the earliest wins.
#[derive(Debug, Default)]
pub struct ModuleRangeIndex {
    ranges: Vec<ModuleRange>,
}

impl ModuleRangeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_range(&mut self, name: impl Into<String>, start: Address, end: Address) {
        let name = name.into();
        debug!("Module {name}: 0x{start:x} - 0x{end:x}");
        self.ranges.push(ModuleRange { name, start, end });
    }

    /// Resolve an address to its module and the offset into it
    ///
    /// Falls back to [`KERNEL_MODULE`] with the address unchanged.
    #[must_use]
    pub fn resolve(&self, addr: Address) -> ModuleOffset<'_> {
        self.ranges
            .iter()
            .find(|range| range.contains(addr))
            .and_then(|range| {
                let offset = addr.offset_from(range.start)?;
                Some(ModuleOffset { module: &range.name, offset })
            })
            .unwrap_or(ModuleOffset { module: KERNEL_MODULE, offset: addr.get() })
    }

    #[must_use]
    pub fn ranges(&self) -> &[ModuleRange] {
        &self.ranges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
