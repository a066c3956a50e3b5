//! Analysis export
//!
//! This module provides functionality for exporting a finished analysis for
//! processing by other tools. Currently supports a JSON document.

pub mod json;

pub use json::JsonExporter;
