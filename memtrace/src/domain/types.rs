//! Newtypes for values read from the trace

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// An address captured by the instrumented allocator
///
/// Displayed as bare lowercase hex, the way the reports print blocks and
/// unresolved frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Distance from `base` to this address, `None` if `base` lies above it
    #[must_use]
    pub const fn offset_from(self, base: Address) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Return addresses captured at allocation time, innermost first
///
/// Shared between the ledger, the size histogram and the oversized set,
/// so it is reference counted rather than copied.
pub type Backtrace = Arc<[Address]>;
