//! Decoded record types

use memtrace_common::PointerWidth;

use crate::domain::Address;

/// One complete record from the trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Heap allocation of `size` bytes at `address`
    Alloc { address: Address, size: u64, backtrace: Vec<Address> },

    /// Heap free of `address`
    Free { address: Address },

    /// Page allocation, only produced when page records are enabled
    PageAlloc { address: Address, size: u64, backtrace: Vec<Address> },

    /// Page free, only produced when page records are enabled
    PageFree { address: Address },

    /// A module occupying `[start, end)`
    ModuleMeta { name: String, start: Address, end: Address },
}

/// Settings that must match the producer of the trace
///
/// Nothing in the stream describes these, so a mismatch decodes garbage
/// rather than failing cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Width of every pointer-sized field
    pub pointer_width: PointerWidth,

    /// Whether page records reach downstream consumers
    ///
    /// When disabled their bytes are still consumed so the stream stays
    /// aligned, but the records are dropped.
    pub page_records: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { pointer_width: PointerWidth::Wide, page_records: true }
    }
}
