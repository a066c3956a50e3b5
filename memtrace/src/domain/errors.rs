//! Structured error types for memtrace
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions met while decoding a trace
///
/// Running out of bytes in the middle of a record is not an error: the
/// decoder reports it as a truncated end of stream instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid record tag {tag:#04x} encountered at offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    #[error("Failed to read trace at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Byte offset of the record that could not be decoded
    #[must_use]
    pub fn offset(&self) -> u64 {
        match self {
            Self::UnknownTag { offset, .. } | Self::Io { offset, .. } => *offset,
        }
    }
}

/// Problems loading a module-to-debug-artifact map
#[derive(Error, Debug)]
pub enum ModuleMapError {
    #[error("Failed to read module map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Module map {path} is not a JSON object of module names to paths: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_display() {
        let err = DecodeError::UnknownTag { tag: b'Z', offset: 17 };
        assert_eq!(err.to_string(), "Invalid record tag 0x5a encountered at offset 17");
        assert_eq!(err.offset(), 17);
    }

    #[test]
    fn test_module_map_error_mentions_path() {
        let err = ModuleMapError::Read {
            path: PathBuf::from("/nonexistent/map.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nonexistent/map.json"));
    }
}
