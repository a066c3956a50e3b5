//! Symbolication through the binutils `addr2line` tool

use anyhow::{bail, Context, Result};
use log::debug;
use std::path::Path;
use std::process::Command;

use super::Symbolicate;

/// Runs `addr2line -p -C -f` once per frame
///
/// Each call blocks until the tool exits. There is no timeout and no retry,
/// so a hung `addr2line` stalls the report.
#[derive(Debug, Clone)]
pub struct Addr2lineCommand {
    program: String,
}

impl Addr2lineCommand {
    /// Use a specific `addr2line` executable, e.g. a cross toolchain's
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for Addr2lineCommand {
    fn default() -> Self {
        Self::new("addr2line")
    }
}

impl Symbolicate for Addr2lineCommand {
    fn symbolicate(&self, artifact: &Path, offset: u64) -> Result<String> {
        debug!("{} -e {} 0x{offset:x}", self.program, artifact.display());

        let output = Command::new(&self.program)
            .args(["-p", "-C", "-f", "-e"])
            .arg(artifact)
            .arg(format!("0x{offset:x}"))
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}
