use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::analysis::{Analysis, RunEnd};
use crate::domain::Address;
use crate::symbolization::ModuleRange;

/// Exported document
#[derive(Debug, Serialize)]
struct AnalysisDocument<'a> {
    /// "complete", "truncated" or "failed"
    status: &'static str,
    /// Decoder error message for failed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Offset of the incomplete record for truncated runs
    #[serde(skip_serializing_if = "Option::is_none")]
    truncated_at: Option<u64>,
    records_decoded: u64,
    total_allocations: u64,
    total_frees: u64,
    metadata_items: u64,
    oversized_threshold: u64,
    unfreed_bytes: u128,
    unfreed: Vec<BlockEntry<'a>>,
    sizes: Vec<SizeEntry<'a>>,
    oversized: Vec<BlockEntry<'a>>,
    modules: &'a [ModuleRange],
}

#[derive(Debug, Serialize)]
struct BlockEntry<'a> {
    address: Address,
    size: u64,
    backtrace: &'a [Address],
}

#[derive(Debug, Serialize)]
struct SizeEntry<'a> {
    size: u64,
    count: u64,
    percent: f64,
    backtrace: &'a [Address],
}

/// Writes an [`Analysis`] as JSON
///
/// Addresses are exported raw; symbolication only happens in the text reports.
pub struct JsonExporter<'a> {
    analysis: &'a Analysis,
}

impl<'a> JsonExporter<'a> {
    #[must_use]
    pub fn new(analysis: &'a Analysis) -> Self {
        Self { analysis }
    }

    /// Export to any writer (file, stdout, buffer, etc.)
    ///
    /// # Example
    /// ```
    /// use memtrace::analysis::Analyzer;
    /// use memtrace::decoder::{DecoderConfig, RecordDecoder};
    /// use memtrace::export::JsonExporter;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let bytes: &[u8] = &[];
    /// let analysis = Analyzer::new(4096).consume(RecordDecoder::new(bytes, DecoderConfig::default()));
    ///
    /// let mut buffer = Vec::new();
    /// JsonExporter::new(&analysis).export(&mut buffer)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.document())
            .context("Failed to write analysis JSON")
    }

    fn document(&self) -> AnalysisDocument<'a> {
        let analysis = self.analysis;
        let stats = analysis.stats();
        let outcome = analysis.outcome();

        let (status, error, truncated_at) = match &outcome.end {
            RunEnd::Clean => ("complete", None, None),
            RunEnd::Truncated { offset } => ("truncated", None, Some(*offset)),
            RunEnd::Failed(e) => ("failed", Some(e.to_string()), None),
        };

        let snapshot = analysis.ledger().snapshot();
        let unfreed = snapshot
            .entries
            .iter()
            .map(|(&address, alloc)| BlockEntry {
                address,
                size: alloc.size,
                backtrace: &alloc.backtrace,
            })
            .collect();

        let sizes = stats
            .histogram()
            .iter()
            .map(|(&size, bucket)| SizeEntry {
                size,
                count: bucket.count,
                percent: stats.percentage(bucket.count),
                backtrace: &bucket.exemplar,
            })
            .collect();

        let oversized = stats
            .oversized()
            .iter()
            .map(|(&address, block)| BlockEntry {
                address,
                size: block.size,
                backtrace: &block.backtrace,
            })
            .collect();

        AnalysisDocument {
            status,
            error,
            truncated_at,
            records_decoded: outcome.records_decoded,
            total_allocations: stats.total_allocations(),
            total_frees: stats.total_frees(),
            metadata_items: analysis.metadata_count(),
            oversized_threshold: stats.threshold(),
            unfreed_bytes: snapshot.total_bytes,
            unfreed,
            sizes,
            oversized,
            modules: analysis.modules().ranges(),
        }
    }
}
