//! # Shared Wire Format (Allocator ↔ Analyzer)
//!
//! Defines the constants of the allocation-trace log shared between the
//! instrumented allocator that emits it and the userspace analyzer that
//! decodes it. The stream carries no header, no version and no width marker:
//! both sides must agree on everything in this crate ahead of time.
//!
//! ## Record Layout
//!
//! Every record starts with a single tag byte:
//!
//! ```text
//! 'A' ptr size bt[0] .. bt[n-1] 0     heap allocation
//! 'F' ptr                             heap free
//! 'P' ptr size bt[0] .. bt[n-1] 0     page allocation
//! 'X' ptr                             page free
//! 'M' name[64] start end              module address range
//! ```
//!
//! `ptr`, `size`, backtrace entries, `start` and `end` are little-endian
//! unsigned integers of [`PointerWidth`] bytes. Backtraces end at the first
//! zero entry, which is not part of the backtrace.
//!
//! ## Key Types
//!
//! - [`RecordTag`] - Discriminator byte of each record
//! - [`PointerWidth`] - Width of every pointer-sized field

#![no_std]

// ============================================================================
// Record Tags
// ============================================================================

/// **Heap allocation**: address, size, zero-terminated backtrace
pub const TAG_ALLOC: u8 = b'A';

/// **Heap free**: address only
pub const TAG_FREE: u8 = b'F';

/// **Page allocation**: same layout as [`TAG_ALLOC`]
///
/// Only emitted by producers built with page tracing.
pub const TAG_PAGE_ALLOC: u8 = b'P';

/// **Page free**: same layout as [`TAG_FREE`]
pub const TAG_PAGE_FREE: u8 = b'X';

/// **Module metadata**: NUL-padded name, start address, end address
///
/// Emitted whenever a module is loaded so that backtrace addresses can be
/// made relative to the module they belong to.
pub const TAG_MODULE_META: u8 = b'M';

// ============================================================================
// Field Sizes and Defaults
// ============================================================================

/// Width of the NUL-padded module name buffer in a [`TAG_MODULE_META`] record
pub const MODULE_NAME_LEN: usize = 64;

/// Allocations at or above this many bytes are flagged as oversized
///
/// Blocks this large usually belong in page allocations rather than on
/// the heap.
pub const DEFAULT_TOO_LARGE_THRESHOLD: u64 = 0x1000;

/// Discriminator of a record in the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    Alloc,
    Free,
    PageAlloc,
    PageFree,
    ModuleMeta,
}

impl RecordTag {
    /// Map a tag byte to its record kind, `None` for unknown bytes
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TAG_ALLOC => Some(Self::Alloc),
            TAG_FREE => Some(Self::Free),
            TAG_PAGE_ALLOC => Some(Self::PageAlloc),
            TAG_PAGE_FREE => Some(Self::PageFree),
            TAG_MODULE_META => Some(Self::ModuleMeta),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Alloc => TAG_ALLOC,
            Self::Free => TAG_FREE,
            Self::PageAlloc => TAG_PAGE_ALLOC,
            Self::PageFree => TAG_PAGE_FREE,
            Self::ModuleMeta => TAG_MODULE_META,
        }
    }
}

/// Width of pointer-sized fields in the trace
///
/// Fixed by the producer's build. Older 32-bit captures use [`PointerWidth::Narrow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerWidth {
    /// 4-byte fields (legacy 32-bit producers)
    Narrow,
    /// 8-byte fields
    #[default]
    Wide,
}

impl PointerWidth {
    /// Number of bytes in one pointer-sized field
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Narrow => 4,
            Self::Wide => 8,
        }
    }

    /// Build from a byte count, accepting only 4 and 8
    #[must_use]
    pub const fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            4 => Some(Self::Narrow),
            8 => Some(Self::Wide),
            _ => None,
        }
    }
}
