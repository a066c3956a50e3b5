//! Pre-flight checks for memtrace
//!
//! Validates inputs before decoding starts, with clear, actionable error
//! messages when something is off.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::path::Path;

/// What a debug artifact offers for symbolication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInfo {
    /// DWARF `.debug_info` present: functions, files and lines
    Dwarf,
    /// Only a symbol table: function names, no source locations
    SymbolsOnly,
    /// Stripped: addresses only
    Stripped,
    /// Not an object file this tool can parse
    Unreadable,
}

/// Check that the trace exists and is a regular file
///
/// # Errors
/// Returns an error naming the path if it is missing or not a file
pub fn check_trace_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "Trace not found: {}\n\n\
             Make sure the path is correct and the trace was copied off the target.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             TRACE must point to the captured trace file, not a directory.",
            path.display()
        );
    }
    Ok(())
}

/// Inspect the sections of a debug artifact
///
/// # Errors
/// Returns an error if the artifact cannot be read
pub fn inspect_debug_info(artifact: &Path) -> Result<DebugInfo> {
    let file_data = std::fs::read(artifact)
        .with_context(|| format!("Failed to read debug artifact: {}", artifact.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        return Ok(DebugInfo::Unreadable);
    };

    let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);

    Ok(match (has_debug_info, has_symtab) {
        (true, _) => DebugInfo::Dwarf,
        (false, true) => DebugInfo::SymbolsOnly,
        (false, false) => DebugInfo::Stripped,
    })
}

/// Warn about present artifacts that cannot give source locations
///
/// Missing artifacts are skipped; backtraces print raw addresses for them.
pub fn check_debug_artifacts<'a>(artifacts: impl IntoIterator<Item = (&'a str, &'a Path)>) {
    for (module, artifact) in artifacts {
        if !artifact.exists() {
            continue;
        }

        match inspect_debug_info(artifact) {
            Ok(DebugInfo::Dwarf) => {}
            Ok(DebugInfo::SymbolsOnly) => eprintln!(
                "warning: {module}: no DWARF debug info in {}, source locations unavailable",
                artifact.display()
            ),
            Ok(DebugInfo::Stripped) => eprintln!(
                "warning: {module}: {} is stripped, backtraces will show addresses only",
                artifact.display()
            ),
            Ok(DebugInfo::Unreadable) => eprintln!(
                "warning: {module}: {} is not a recognised object file",
                artifact.display()
            ),
            Err(e) => eprintln!("warning: {module}: {e:#}"),
        }
    }
}
