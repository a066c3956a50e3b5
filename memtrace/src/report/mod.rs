//! # Text Reports
//!
//! Read-only views over a finished [`Analysis`]:
//!
//! - **summary**: totals of allocations, frees and module metadata
//! - **unfreed**: every live allocation and the bytes they hold
//! - **size distribution**: histogram by size, plus the most and least
//!   frequent sizes
//! - **too big**: every block that was ever at or above the threshold
//! - **callers**: unfreed allocations grouped by call site
//!
//! All output goes to a caller-supplied writer so reports can be captured
//! in tests.

pub mod backtrace;

use std::io::{self, Write};

use crate::analysis::{common_callers, Analysis, SortOrder, DEFAULT_MAX_ROWS, RANKED_SIZES};
use crate::domain::Address;
pub use backtrace::{BacktraceRenderer, FRAME_PREFIX};

/// Smallest share of allocations shown when only significant sizes are requested
pub const SIGNIFICANT_PERCENT: f64 = 1.0;

/// Which reports to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSelection {
    pub unfreed: bool,
    pub counts: bool,
    pub too_big: bool,
    pub callers: bool,
    /// Hide sizes below [`SIGNIFICANT_PERCENT`] in the size distribution
    pub significant_only: bool,
    pub backtraces: bool,
}

impl Default for ReportSelection {
    fn default() -> Self {
        Self {
            unfreed: false,
            counts: false,
            too_big: false,
            callers: false,
            significant_only: false,
            backtraces: true,
        }
    }
}

/// Writes reports for one analysis
pub struct Reporter<'a> {
    analysis: &'a Analysis,
    /// `None` when backtraces are suppressed
    renderer: Option<BacktraceRenderer<'a>>,
    caller_order: SortOrder,
    max_rows: usize,
}

impl<'a> Reporter<'a> {
    pub fn new(analysis: &'a Analysis, renderer: Option<BacktraceRenderer<'a>>) -> Self {
        Self { analysis, renderer, caller_order: SortOrder::default(), max_rows: DEFAULT_MAX_ROWS }
    }

    /// Ranking and row limit for the callers report
    #[must_use]
    pub fn with_callers(mut self, order: SortOrder, max_rows: usize) -> Self {
        self.caller_order = order;
        self.max_rows = max_rows;
        self
    }

    /// Summary line followed by every selected report
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_selected<W: Write>(&self, out: &mut W, selection: &ReportSelection) -> io::Result<()> {
        self.write_summary(out)?;

        if selection.unfreed {
            self.write_unfreed(out)?;
        }
        if selection.counts {
            self.write_size_distribution(out, selection.significant_only)?;
        }
        if selection.too_big {
            self.write_too_big(out)?;
        }
        if selection.callers {
            self.write_callers(out)?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let stats = self.analysis.stats();
        writeln!(
            out,
            "Loaded {} allocations and {} frees, and {} metadata items",
            stats.total_allocations(),
            stats.total_frees(),
            self.analysis.metadata_count()
        )
    }

    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_unfreed<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Unfreed Blocks")?;

        let snapshot = self.analysis.ledger().snapshot();
        for (address, alloc) in snapshot.entries {
            writeln!(out, "Unfreed {address} of size {}:", alloc.size)?;
            self.backtrace(out, &alloc.backtrace)?;
        }

        writeln!(out, "Total {} bytes left unfreed.", snapshot.total_bytes)
    }

    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_size_distribution<W: Write>(
        &self,
        out: &mut W,
        significant_only: bool,
    ) -> io::Result<()> {
        let stats = self.analysis.stats();
        writeln!(out, "Size Distribution")?;

        for (size, bucket) in stats.histogram() {
            let percent = stats.percentage(bucket.count);
            if significant_only && percent < SIGNIFICANT_PERCENT {
                continue;
            }

            writeln!(out, "{size:>12}:\t{}\t({percent:.6}%)", bucket.count)?;
            self.backtrace(out, &bucket.exemplar)?;
        }
        writeln!(out)?;

        writeln!(out, "Top {RANKED_SIZES} sizes by count")?;
        for (size, bucket) in stats.most_frequent(RANKED_SIZES) {
            writeln!(out, "{size:>12}:\t{}", bucket.count)?;
        }
        writeln!(out)?;

        writeln!(out, "Bottom {RANKED_SIZES} sizes by count")?;
        for (size, bucket) in stats.least_frequent(RANKED_SIZES) {
            writeln!(out, "{size:>12}:\t{}", bucket.count)?;
        }
        writeln!(out)
    }

    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_too_big<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let stats = self.analysis.stats();
        writeln!(out, "Too Big Blocks")?;

        for (address, block) in stats.oversized() {
            writeln!(
                out,
                "Block {address} should perhaps not be on the heap (it is {} bytes, larger than threshold {}):",
                block.size,
                stats.threshold()
            )?;
            self.backtrace(out, &block.backtrace)?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn write_callers<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Common Callers")?;

        for group in common_callers(self.analysis.ledger(), self.caller_order, self.max_rows) {
            writeln!(
                out,
                "With {} entries, a total of {} bytes:",
                group.count, group.total_bytes
            )?;
            self.backtrace(out, &group.backtrace)?;
        }
        Ok(())
    }

    fn backtrace<W: Write>(&self, out: &mut W, backtrace: &[Address]) -> io::Result<()> {
        match &self.renderer {
            Some(renderer) => renderer.render(out, backtrace),
            None => Ok(()),
        }
    }
}
