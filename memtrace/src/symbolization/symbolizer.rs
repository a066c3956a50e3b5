// String formatting intentionally uses format! for clarity
#![allow(clippy::format_push_string)]

use addr2line::Context;
use anyhow::{anyhow, Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use log::{info, warn};
use object::{Object, ObjectSection};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::Symbolicate;

/// DWARF line-table lookups for a single debug artifact
///
/// Caches resolved offsets; a backtrace-heavy report hits the same return
/// addresses over and over.
pub struct Symbolizer {
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
    cache: RefCell<HashMap<u64, ResolvedFrame>>,
}

impl Symbolizer {
    /// Load the DWARF sections of a debug artifact
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed as an object file
    pub fn new<P: AsRef<Path>>(artifact: P) -> Result<Self> {
        let data = fs::read(artifact.as_ref()).context("Failed to read debug artifact")?;

        let obj_file = object::File::parse(&*data).context("Failed to parse object file")?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        Ok(Self { ctx, cache: RefCell::new(HashMap::new()) })
    }

    /// Resolve an offset into the artifact to its source location
    pub fn resolve(&self, offset: u64) -> ResolvedFrame {
        if let Some(cached) = self.cache.borrow().get(&offset) {
            return cached.clone();
        }

        let mut frames = Vec::new();

        if let Ok(mut frame_iter) = self.ctx.find_frames(offset).skip_all_loads() {
            while let Ok(Some(frame)) = frame_iter.next() {
                let function = frame
                    .function
                    .and_then(|f| f.demangle().ok().map(|s| s.to_string()))
                    .unwrap_or_else(|| "??".to_string());

                let location = frame.location.map(|loc| SourceLocation {
                    file: loc.file.map(std::string::ToString::to_string),
                    line: loc.line,
                });

                frames.push(InlinedFrame { function, location });
            }
        }

        let resolved = ResolvedFrame { offset, frames };
        self.cache.borrow_mut().insert(offset, resolved.clone());
        resolved
    }
}

/// A resolved offset; more than one frame when calls were inlined
#[derive(Debug, Clone)]
pub struct ResolvedFrame {
    pub offset: u64,
    /// Innermost frame first
    pub frames: Vec<InlinedFrame>,
}

#[derive(Debug, Clone)]
pub struct InlinedFrame {
    pub function: String,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl InlinedFrame {
    /// `function (file:line)`, with `??` for whatever is unknown
    #[must_use]
    pub fn describe(&self) -> String {
        let file = self.location.as_ref().and_then(|loc| loc.file.as_deref()).unwrap_or("??");
        let line = self
            .location
            .as_ref()
            .and_then(|loc| loc.line)
            .map_or_else(|| "?".to_string(), |line| line.to_string());
        format!("{} ({file}:{line})", self.function)
    }
}

impl ResolvedFrame {
    /// One line describing the frame and everything inlined into it
    #[must_use]
    pub fn describe(&self) -> String {
        if self.frames.is_empty() {
            return format!("?? (0x{:x})", self.offset);
        }

        let mut output = String::new();
        for (idx, inlined) in self.frames.iter().enumerate() {
            if idx > 0 {
                output.push_str(" (inlined by) ");
            }
            output.push_str(&inlined.describe());
        }
        output
    }
}

/// In-process symbolicator reading DWARF from the debug artifacts
///
/// Each artifact is parsed once, on first use. Artifacts that fail to load
/// are remembered so the failure is only reported once.
#[derive(Default)]
pub struct DwarfSymbolicator {
    artifacts: RefCell<HashMap<PathBuf, Option<Symbolizer>>>,
}

impl DwarfSymbolicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Symbolicate for DwarfSymbolicator {
    fn symbolicate(&self, artifact: &Path, offset: u64) -> Result<String> {
        let mut artifacts = self.artifacts.borrow_mut();
        let symbolizer = artifacts.entry(artifact.to_path_buf()).or_insert_with(|| {
            match Symbolizer::new(artifact) {
                Ok(symbolizer) => {
                    info!("Loaded debug info from {}", artifact.display());
                    Some(symbolizer)
                }
                Err(e) => {
                    warn!("Cannot symbolize with {}: {e:#}", artifact.display());
                    None
                }
            }
        });

        symbolizer
            .as_ref()
            .map(|symbolizer| symbolizer.resolve(offset).describe())
            .ok_or_else(|| anyhow!("no usable debug info in {}", artifact.display()))
    }
}
