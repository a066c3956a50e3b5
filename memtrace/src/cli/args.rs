//! CLI argument definitions

use clap::{Parser, ValueEnum};
use memtrace_common::{PointerWidth, DEFAULT_TOO_LARGE_THRESHOLD};
use std::path::PathBuf;

use crate::analysis::{SortOrder, DEFAULT_MAX_ROWS};
use crate::decoder::DecoderConfig;
use crate::report::ReportSelection;

use super::modes::parse_modes;

/// How backtrace frames are turned into source locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SymbolizerKind {
    /// Read DWARF from the debug artifacts in-process
    #[default]
    Dwarf,
    /// Run the external `addr2line` tool once per frame
    Addr2line,
}

#[derive(Parser, Debug)]
#[command(
    name = "memtrace",
    about = "Analyze allocation traces captured from an instrumented allocator",
    after_help = "\
MODES:
    unfreed       List allocations that were never freed
    counts        Size distribution of all allocations
    toobig        Blocks at or above the oversized threshold
    callers       Unfreed allocations grouped by call site
    oneandover    Only show sizes with at least 1% of allocations in `counts`
    nobacktrace   Do not print backtraces

    Other words are ignored. Words starting with '-' are read as options;
    put them after `--` to pass them as modes.

EXAMPLES:
    memtrace memtrace.bin unfreed                     Leaked blocks with backtraces
    memtrace memtrace.bin counts oneandover           Common allocation sizes
    memtrace --pointer-width 4 old.bin toobig         Trace from a 32-bit build"
)]
pub struct Args {
    /// Trace file captured from the allocator
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Reports to produce (see MODES)
    #[arg(value_name = "MODES")]
    pub modes: Vec<String>,

    /// Width of pointer fields in the trace, in bytes (must match the producer)
    #[arg(long, value_name = "BYTES", default_value = "8", value_parser = parse_pointer_width)]
    pub pointer_width: PointerWidth,

    /// Drop page allocation records instead of counting them
    #[arg(long)]
    pub no_page_records: bool,

    /// Allocations of at least this many bytes are reported as too big
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_TOO_LARGE_THRESHOLD)]
    pub threshold: u64,

    /// Build directory holding the debug artifacts
    #[arg(long, value_name = "DIR", default_value = "build")]
    pub build_dir: PathBuf,

    /// JSON file mapping module names to debug artifacts
    #[arg(long, value_name = "FILE")]
    pub module_map: Option<PathBuf>,

    /// Symbolication backend
    #[arg(long, value_enum, default_value_t = SymbolizerKind::Dwarf)]
    pub symbolizer: SymbolizerKind,

    /// Maximum groups in the callers report
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Show the callers with the fewest allocations first
    #[arg(long)]
    pub reverse: bool,

    /// Also write the analysis as JSON
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig { pointer_width: self.pointer_width, page_records: !self.no_page_records }
    }

    #[must_use]
    pub fn report_selection(&self) -> ReportSelection {
        parse_modes(&self.modes)
    }

    #[must_use]
    pub fn caller_order(&self) -> SortOrder {
        if self.reverse {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

fn parse_pointer_width(value: &str) -> Result<PointerWidth, String> {
    value
        .parse::<usize>()
        .ok()
        .and_then(PointerWidth::from_bytes)
        .ok_or_else(|| format!("pointer width must be 4 or 8, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["memtrace", "trace.bin"]).unwrap();

        assert_eq!(args.trace, PathBuf::from("trace.bin"));
        assert_eq!(args.decoder_config(), DecoderConfig::default());
        assert_eq!(args.threshold, 4096);
        assert_eq!(args.build_dir, PathBuf::from("build"));
        assert_eq!(args.symbolizer, SymbolizerKind::Dwarf);
        assert_eq!(args.max_rows, 10);
        assert_eq!(args.caller_order(), SortOrder::Descending);
        assert_eq!(args.report_selection(), ReportSelection::default());
    }

    #[test]
    fn test_modes_and_options_interleave() {
        let args = Args::try_parse_from([
            "memtrace",
            "trace.bin",
            "unfreed",
            "--pointer-width",
            "4",
            "nobacktrace",
            "--no-page-records",
            "--symbolizer",
            "addr2line",
        ])
        .unwrap();

        assert_eq!(args.modes, vec!["unfreed", "nobacktrace"]);
        assert_eq!(
            args.decoder_config(),
            DecoderConfig { pointer_width: PointerWidth::Narrow, page_records: false }
        );
        assert_eq!(args.symbolizer, SymbolizerKind::Addr2line);
        let selection = args.report_selection();
        assert!(selection.unfreed && !selection.backtraces);
    }

    #[test]
    fn test_rejects_other_pointer_widths() {
        assert!(Args::try_parse_from(["memtrace", "--pointer-width", "2", "t.bin"]).is_err());
        assert!(Args::try_parse_from(["memtrace", "--pointer-width", "x", "t.bin"]).is_err());
    }

    #[test]
    fn test_hyphen_words_need_separator() {
        assert!(Args::try_parse_from(["memtrace", "t.bin", "unfreed", "-v"]).is_err());

        let args = Args::try_parse_from(["memtrace", "t.bin", "unfreed", "--", "-v"]).unwrap();
        assert_eq!(args.modes, vec!["unfreed", "-v"]);
        assert_eq!(
            args.report_selection(),
            ReportSelection { unfreed: true, ..ReportSelection::default() }
        );
    }

    #[test]
    fn test_trace_is_required() {
        assert!(Args::try_parse_from(["memtrace"]).is_err());
    }
}
