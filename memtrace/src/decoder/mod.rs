//! # Trace Decoding
//!
//! Turns the raw bytes of an allocation trace into typed [`Record`]s.
//!
//! The decoder owns all framing logic: tag dispatch, pointer width,
//! self-terminating backtraces, NUL-padded module names and the handling of
//! a stream that stops halfway through a record. Downstream code only ever
//! sees complete records.
//!
//! ## How a stream ends
//!
//! ```text
//! end of data on a record boundary   → StreamEnd::Clean
//! end of data inside a record        → StreamEnd::Truncated { offset }
//! unknown tag byte / read failure    → DecodeError (fatal)
//! ```
//!
//! Captures are frequently cut short when the machine being traced dies, so
//! truncation is an expected way for a trace to end and is not an error.
//!
//! ## Module Structure
//!
//! - **`record`**: The [`Record`] variants and decoder configuration
//! - **`reader`**: [`RecordDecoder`], the streaming reader
//! - **`writer`**: [`TraceWriter`], an encoder for building traces in tests and tools

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{RecordDecoder, StreamEnd};
pub use record::{DecoderConfig, Record};
pub use writer::TraceWriter;
