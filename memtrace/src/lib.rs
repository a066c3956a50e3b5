//! # memtrace - Allocation Trace Analyzer
//!
//! memtrace reads the binary trace an instrumented allocator writes while a
//! system runs, and reports on it offline: which blocks were never freed,
//! which sizes are requested most, which allocations were unusually large,
//! and which call sites hold the most memory.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Instrumented allocator (target)                │
//! │        alloc / free / page alloc / page free / module info      │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ tagged binary records
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       memtrace (This Crate)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Decoder    │──▶│   Analyzer   │──▶│   Reports    │         │
//! │  │  (records)   │   │ (ledger and  │   │   (text)     │         │
//! │  └──────────────┘   │  statistics) │   └──────┬───────┘         │
//! │                     └──────┬───────┘          │                 │
//! │                            │                  ▼                 │
//! │                            ▼           ┌──────────────┐         │
//! │                     ┌──────────────┐   │ Symbolizer   │         │
//! │                     │    Export    │   │ (DWARF or    │         │
//! │                     │   (JSON)     │   │  addr2line)  │         │
//! │                     └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`decoder`]: Streaming decoder for the record format, plus a writer
//!   that produces traces for tests and tooling
//! - [`analysis`]: Live-allocation ledger, size statistics and call-site
//!   grouping, driven by the [`analysis::Analyzer`]
//! - [`symbolization`]: Module ranges, debug artifact lookup and the
//!   symbolication backends
//! - [`report`]: Text reports over a finished analysis
//! - [`export`]: JSON export of a finished analysis
//! - [`cli`]: Command-line argument parsing and report mode tokens
//! - [`preflight`]: Input checks run before decoding
//! - [`domain`]: Core types ([`domain::Address`], backtraces) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Everything still allocated at the end of the trace
//! memtrace memtrace.bin unfreed
//!
//! # Most common sizes, without backtraces
//! memtrace memtrace.bin counts oneandover nobacktrace
//!
//! # Trace from a 32-bit build
//! memtrace --pointer-width 4 memtrace.bin toobig
//! ```

pub mod analysis;
pub mod cli;
pub mod decoder;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod report;
pub mod symbolization;
