//! Live allocation tracking

use std::collections::BTreeMap;

use crate::domain::{Address, Backtrace};

/// An allocation that has not been freed (yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveAllocation {
    pub size: u64,
    pub backtrace: Backtrace,
}

/// Currently-live allocations keyed by address
///
/// Kept in address order so reports come out the same on every run.
#[derive(Debug, Default)]
pub struct AllocationLedger {
    live: BTreeMap<Address, LiveAllocation>,
}

/// Read-only view of the ledger for reporting
#[derive(Debug, Clone, Copy)]
pub struct LedgerSnapshot<'a> {
    pub entries: &'a BTreeMap<Address, LiveAllocation>,
    /// Wider than a single size: corrupt traces can hold sizes near `u64::MAX`
    pub total_bytes: u128,
}

impl AllocationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the live entry for `address`, replacing any existing one
    ///
    /// Tracing may start after an address was freed, so a second allocation
    /// at a live address is normal. Returns the replaced entry.
    pub fn record(
        &mut self,
        address: Address,
        size: u64,
        backtrace: Backtrace,
    ) -> Option<LiveAllocation> {
        self.live.insert(address, LiveAllocation { size, backtrace })
    }

    /// Remove the entry for `address` if present
    ///
    /// Returns whether the address was live. Frees of unknown addresses
    /// (allocated before tracing began, or freed twice) are expected.
    pub fn release(&mut self, address: Address) -> bool {
        self.live.remove(&address).is_some()
    }

    #[must_use]
    pub fn get(&self, address: Address) -> Option<&LiveAllocation> {
        self.live.get(&address)
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot<'_> {
        LedgerSnapshot { entries: &self.live, total_bytes: self.total_bytes() }
    }

    /// Sum of the sizes of all live allocations
    #[must_use]
    pub fn total_bytes(&self) -> u128 {
        self.live.values().map(|alloc| u128::from(alloc.size)).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
