//! Backtrace rendering
//!
//! Resolves each frame to its module, then either symbolicates it against
//! the module's debug artifact or, when the artifact is missing, prints the
//! raw address with the module it belongs to.

use log::{debug, warn};
use std::io::{self, Write};

use crate::domain::Address;
use crate::symbolization::{ArtifactMap, ModuleOffset, ModuleRangeIndex, Symbolicate};

/// Indentation for every rendered frame
pub const FRAME_PREFIX: &str = "\t";

/// Renders backtraces one frame per line
pub struct BacktraceRenderer<'a> {
    modules: &'a ModuleRangeIndex,
    artifacts: &'a ArtifactMap,
    symbolicator: &'a dyn Symbolicate,
}

impl<'a> BacktraceRenderer<'a> {
    pub fn new(
        modules: &'a ModuleRangeIndex,
        artifacts: &'a ArtifactMap,
        symbolicator: &'a dyn Symbolicate,
    ) -> Self {
        Self { modules, artifacts, symbolicator }
    }

    /// Write every frame of `backtrace`, followed by an empty line
    ///
    /// The symbolicator is called once per frame whose artifact exists.
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails
    pub fn render<W: Write + ?Sized>(&self, out: &mut W, backtrace: &[Address]) -> io::Result<()> {
        for &frame in backtrace {
            self.render_frame(out, frame)?;
        }
        writeln!(out)
    }

    fn render_frame<W: Write + ?Sized>(&self, out: &mut W, frame: Address) -> io::Result<()> {
        let ModuleOffset { module, offset } = self.modules.resolve(frame);
        let artifact = self.artifacts.path_for(module);

        if !artifact.exists() {
            debug!("No debug artifact for {module} at {}", artifact.display());
            return writeln!(out, "{FRAME_PREFIX}{frame} (unknown module \"{module}\")");
        }

        match self.symbolicator.symbolicate(&artifact, offset) {
            Ok(location) => writeln!(out, "{FRAME_PREFIX}{location}"),
            Err(e) => {
                warn!("Failed to symbolicate 0x{frame:x} in {}: {e:#}", artifact.display());
                writeln!(out, "{FRAME_PREFIX}{frame} ({module}+0x{offset:x}, unresolved)")
            }
        }
    }
}
