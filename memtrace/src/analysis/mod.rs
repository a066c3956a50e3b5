//! Analysis of decoded trace records
//!
//! This module holds all state accumulated while decoding, separated from
//! the presentation in [`crate::report`]:
//!
//! - **`analyzer`**: Decoding/reporting phases, record routing
//! - **`ledger`**: Live allocations by address
//! - **`statistics`**: Counters, size histogram, oversized blocks
//! - **`callers`**: Unfreed allocations grouped by call site

pub mod analyzer;
pub mod callers;
pub mod ledger;
pub mod statistics;

pub use analyzer::{Analysis, Analyzer, RunEnd, RunOutcome, RunState};
pub use callers::{common_callers, CallerGroup, SortOrder, DEFAULT_MAX_ROWS};
pub use ledger::{AllocationLedger, LedgerSnapshot, LiveAllocation};
pub use statistics::{AggregateStats, OversizedBlock, SizeBucket, RANKED_SIZES};
