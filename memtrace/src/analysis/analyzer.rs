//! Trace analyzer: drives the decoder and owns all accumulated state
//!
//! The run has two phases. While *decoding*, an [`Analyzer`] routes every
//! record into the ledger, the statistics and the module index. Consuming
//! the decoder turns it into an [`Analysis`], which is read-only: the
//! reporting phase cannot mutate what was decoded.
//!
//! ```text
//!              clean end / truncation
//!  Analyzer ──────────────────────────▶ Analysis (Reporting)
//!     │
//!     │ unknown tag / read error
//!     └───────────────────────────────▶ Analysis (Failed, state kept)
//! ```

use log::{debug, info, warn};
use std::io::Read;

use super::ledger::AllocationLedger;
use super::statistics::AggregateStats;
use crate::decoder::{Record, RecordDecoder, StreamEnd};
use crate::domain::{Address, Backtrace, DecodeError};
use crate::symbolization::ModuleRangeIndex;

/// Phase of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Decoding,
    Reporting,
    Failed,
}

/// Why decoding stopped
#[derive(Debug)]
pub enum RunEnd {
    Clean,
    /// The trace was cut short inside the record at `offset`
    Truncated { offset: u64 },
    Failed(DecodeError),
}

/// Result of driving a decoder to the end
#[derive(Debug)]
pub struct RunOutcome {
    pub end: RunEnd,
    pub records_decoded: u64,
}

impl RunOutcome {
    /// A truncated trace still counts as a successful run
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self.end, RunEnd::Failed(_))
    }
}

/// Decoding-phase state
#[derive(Debug)]
pub struct Analyzer {
    ledger: AllocationLedger,
    stats: AggregateStats,
    modules: ModuleRangeIndex,
    metadata_count: u64,
}

impl Analyzer {
    /// Fresh state; allocations of `threshold` bytes or more count as oversized
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            ledger: AllocationLedger::new(),
            stats: AggregateStats::new(threshold),
            modules: ModuleRangeIndex::new(),
            metadata_count: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::Decoding
    }

    /// Route one record into the ledger, statistics or module index
    pub fn apply(&mut self, record: Record) {
        match record {
            Record::Alloc { address, size, backtrace }
            | Record::PageAlloc { address, size, backtrace } => {
                self.allocate(address, size, backtrace.into());
            }
            Record::Free { address } | Record::PageFree { address } => {
                if !self.ledger.release(address) {
                    debug!("Free of untracked address 0x{address:x}");
                }
                self.stats.observe_free();
            }
            Record::ModuleMeta { name, start, end } => {
                self.modules.add_range(name, start, end);
                self.metadata_count += 1;
            }
        }
    }

    fn allocate(&mut self, address: Address, size: u64, backtrace: Backtrace) {
        self.stats.observe(address, size, &backtrace);
        if let Some(previous) = self.ledger.record(address, size, backtrace) {
            debug!(
                "Address 0x{address:x} allocated again while live (was {} bytes)",
                previous.size
            );
        }
    }

    /// Drive `decoder` to the end and move into the reporting phase
    ///
    /// Never fails: a fatal decode error is recorded in the outcome and
    /// everything decoded before it is kept.
    pub fn consume<R: Read>(mut self, mut decoder: RecordDecoder<R>) -> Analysis {
        let end = loop {
            match decoder.next_record() {
                Ok(Some(record)) => self.apply(record),
                Ok(None) => match decoder.stream_end() {
                    Some(StreamEnd::Truncated { offset }) => break RunEnd::Truncated { offset },
                    Some(StreamEnd::Clean) | None => break RunEnd::Clean,
                },
                Err(e) => {
                    warn!("Decoding stopped: {e}");
                    break RunEnd::Failed(e);
                }
            }
        };

        let outcome = RunOutcome { end, records_decoded: decoder.records_decoded() };
        info!(
            "Decoded {} records ({} bytes): {} allocations, {} frees, {} modules",
            outcome.records_decoded,
            decoder.offset(),
            self.stats.total_allocations(),
            self.stats.total_frees(),
            self.metadata_count
        );

        Analysis {
            ledger: self.ledger,
            stats: self.stats,
            modules: self.modules,
            metadata_count: self.metadata_count,
            outcome,
        }
    }
}

/// Reporting-phase state: everything the decoder produced, read-only
#[derive(Debug)]
pub struct Analysis {
    ledger: AllocationLedger,
    stats: AggregateStats,
    modules: ModuleRangeIndex,
    metadata_count: u64,
    outcome: RunOutcome,
}

impl Analysis {
    #[must_use]
    pub fn state(&self) -> RunState {
        if self.outcome.is_success() {
            RunState::Reporting
        } else {
            RunState::Failed
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &AllocationLedger {
        &self.ledger
    }

    #[must_use]
    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    #[must_use]
    pub fn modules(&self) -> &ModuleRangeIndex {
        &self.modules
    }

    /// Number of module metadata records seen
    #[must_use]
    pub fn metadata_count(&self) -> u64 {
        self.metadata_count
    }

    #[must_use]
    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }
}
