//! Common call sites among unfreed allocations
//!
//! Groups live allocations by their immediate caller, the frame just above
//! the allocator entry point, to show which code paths leave the most
//! memory behind.

use std::collections::HashMap;

use super::ledger::AllocationLedger;
use crate::domain::{Address, Backtrace};

/// Default number of caller groups to report
pub const DEFAULT_MAX_ROWS: usize = 10;

/// Ranking direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most allocations first
    #[default]
    Descending,
    /// Fewest allocations first
    Ascending,
}

/// Live allocations sharing an immediate caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerGroup {
    pub caller: Address,
    pub count: u64,
    pub total_bytes: u128,
    /// Backtrace of the lowest-addressed allocation in the group
    pub backtrace: Backtrace,
}

/// The frame that identifies an allocation's call site
///
/// Frame 0 is the allocator's own entry point, so frame 1 is preferred.
fn call_site(backtrace: &[Address]) -> Option<Address> {
    backtrace.get(1).or_else(|| backtrace.first()).copied()
}

/// Rank caller groups of the live allocations, keeping at most `limit`
///
/// Allocations without a backtrace are skipped. Groups with equal counts
/// stay in order of their first allocation's address.
#[must_use]
pub fn common_callers(ledger: &AllocationLedger, order: SortOrder, limit: usize) -> Vec<CallerGroup> {
    let mut groups: Vec<CallerGroup> = Vec::new();
    let mut by_caller: HashMap<Address, usize> = HashMap::new();

    for alloc in ledger.snapshot().entries.values() {
        let Some(caller) = call_site(&alloc.backtrace) else {
            continue;
        };

        if let Some(&idx) = by_caller.get(&caller) {
            groups[idx].count += 1;
            groups[idx].total_bytes += u128::from(alloc.size);
        } else {
            by_caller.insert(caller, groups.len());
            groups.push(CallerGroup {
                caller,
                count: 1,
                total_bytes: u128::from(alloc.size),
                backtrace: Backtrace::clone(&alloc.backtrace),
            });
        }
    }

    match order {
        SortOrder::Descending => groups.sort_by(|a, b| b.count.cmp(&a.count)),
        SortOrder::Ascending => groups.sort_by_key(|group| group.count),
    }
    groups.truncate(limit);
    groups
}
