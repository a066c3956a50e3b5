//! # memtrace - Main Entry Point
//!
//! Decodes a trace file, prints the summary and every selected report, and
//! optionally exports the analysis as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use memtrace::analysis::{Analysis, Analyzer, RunEnd};
use memtrace::cli::{Args, SymbolizerKind};
use memtrace::decoder::RecordDecoder;
use memtrace::export::JsonExporter;
use memtrace::preflight::{check_debug_artifacts, check_trace_file};
use memtrace::report::{BacktraceRenderer, Reporter};
use memtrace::symbolization::{
    Addr2lineCommand, ArtifactMap, DwarfSymbolicator, Symbolicate, KERNEL_MODULE,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_ERROR,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

/// Returns `Ok(false)` when decoding stopped on a malformed record; the
/// reports for everything before it have been written by then.
fn run() -> Result<bool> {
    let args = Args::parse();

    check_trace_file(&args.trace)?;

    let file = File::open(&args.trace)
        .with_context(|| format!("Failed to open trace: {}", args.trace.display()))?;
    let decoder = RecordDecoder::new(BufReader::new(file), args.decoder_config());
    info!("Decoding {} ({:?})", args.trace.display(), args.decoder_config());

    let analysis = Analyzer::new(args.threshold).consume(decoder);

    let mut artifacts = ArtifactMap::new(&args.build_dir);
    if let Some(ref module_map) = args.module_map {
        artifacts.load_overrides(module_map)?;
    }

    let selection = args.report_selection();
    let symbolicator: Box<dyn Symbolicate> = match args.symbolizer {
        SymbolizerKind::Dwarf => Box::new(DwarfSymbolicator::new()),
        SymbolizerKind::Addr2line => Box::new(Addr2lineCommand::default()),
    };

    if selection.backtraces && args.symbolizer == SymbolizerKind::Dwarf && !args.quiet {
        let paths = artifact_paths(&analysis, &artifacts);
        check_debug_artifacts(paths.iter().map(|(module, path)| (module.as_str(), path.as_path())));
    }

    let renderer = selection
        .backtraces
        .then(|| BacktraceRenderer::new(analysis.modules(), &artifacts, symbolicator.as_ref()));
    let reporter = Reporter::new(&analysis, renderer).with_callers(args.caller_order(), args.max_rows);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    reporter.write_selected(&mut out, &selection).context("Failed to write report")?;
    out.flush().context("Failed to write report")?;
    drop(out);

    if let Some(ref path) = args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file: {}", path.display()))?;
        JsonExporter::new(&analysis).export(BufWriter::new(file))?;
        if !args.quiet {
            eprintln!("Analysis written to {}", path.display());
        }
    }

    match &analysis.outcome().end {
        RunEnd::Clean => Ok(true),
        RunEnd::Truncated { offset } => {
            if !args.quiet {
                eprintln!("warning: trace is truncated, incomplete record at offset {offset}");
            }
            Ok(true)
        }
        RunEnd::Failed(e) => {
            warn!("Reports cover only the records before offset {}", e.offset());
            eprintln!("error: {e}");
            Ok(false)
        }
    }
}

/// The kernel artifact plus one per module announced in the trace
fn artifact_paths(analysis: &Analysis, artifacts: &ArtifactMap) -> Vec<(String, PathBuf)> {
    let mut names: Vec<&str> = vec![KERNEL_MODULE];
    for range in analysis.modules().ranges() {
        if !names.contains(&range.name.as_str()) {
            names.push(&range.name);
        }
    }
    names.into_iter().map(|name| (name.to_string(), artifacts.path_for(name))).collect()
}
