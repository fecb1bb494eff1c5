//! Error types for dataset conversion.
//!
//! Conversion errors are typed so the batch driver can tell a missing
//! input (skipped) apart from a data-integrity failure (fatal). Loading
//! manifests and benchmark results uses `anyhow::Result` instead.

use std::io;
use std::path::PathBuf;

use crate::header::HeaderField;

/// Errors from the pure header codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("header truncated: need 8 bytes, got {len}")]
    Truncated { len: usize },

    #[error("{field} value {value} does not fit in a u32 header word")]
    ValueOutOfRange { field: HeaderField, value: u64 },
}

/// Errors from a single file conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("source file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("malformed header in {}: file holds {len} bytes, need 8", path.display())]
    MalformedHeader { path: PathBuf, len: u64 },

    #[error("cannot encode header for {}: {field} value {value} exceeds u32", path.display())]
    ValueOutOfRange {
        path: PathBuf,
        field: HeaderField,
        value: u64,
    },

    #[error(
        "payload size overflow in {}: dim={dimension} x count={count} x {element_width} bytes",
        path.display()
    )]
    ArithmeticOverflow {
        path: PathBuf,
        dimension: u64,
        count: u64,
        element_width: usize,
    },

    #[error(
        "payload size mismatch in {}: expected {expected} bytes (dim={dimension}, count={count}, {element_width}-byte elements), got {actual}",
        path.display()
    )]
    PayloadSizeMismatch {
        path: PathBuf,
        dimension: u64,
        count: u64,
        element_width: usize,
        expected: u64,
        actual: u64,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is already an output of this batch", path.display())]
    DuplicateOutput { path: PathBuf },
}

impl ConvertError {
    /// Only an absent source may be skipped; everything else points at bad data
    /// or a broken destination and aborts the batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, ConvertError::FileNotFound { .. })
    }

    /// Path of the file the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConvertError::FileNotFound { path }
            | ConvertError::MalformedHeader { path, .. }
            | ConvertError::ValueOutOfRange { path, .. }
            | ConvertError::ArithmeticOverflow { path, .. }
            | ConvertError::PayloadSizeMismatch { path, .. }
            | ConvertError::Read { path, .. }
            | ConvertError::WriteFailure { path, .. }
            | ConvertError::DuplicateOutput { path } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
