//! Dataset tooling for ANN benchmark pipelines.
//!
//! Converts binary vector datasets between two 8-byte header conventions and
//! summarizes search benchmark results.
//!
//! ## File Formats
//!
//! | Layout | Header | Payload |
//! |--------|--------|---------|
//! | Internal | `[dim: u32 LE][count: u32 LE]` | `dim * count` elements, row-major |
//! | Standard (fbin/ibin) | `[count: u32 LE][dim: u32 LE]` | identical bytes |
//!
//! Elements are 4-byte floats for base/query vectors and 8-byte integers for
//! ground-truth neighbor ids. For ground truth, `dim` is `k` and `count` is
//! the number of queries.
//!
//! ## Components
//!
//! - [`header`] - Header codec for both layouts
//! - [`convert`] - Single-file conversion and inspection
//! - [`manifest`] - Which files to convert, with which element type
//! - [`batch`] - Runs a manifest, skipping missing inputs
//! - [`summary`] - Benchmark result table and CSV export
//!
//! ## Example
//!
//! ```no_run
//! use annbin_dataset::{run_batch, Manifest};
//! use std::path::Path;
//!
//! let report = run_batch(
//!     Path::new("/datasets/openai_500k"),
//!     Path::new("./data"),
//!     &Manifest::default(),
//! )?;
//! println!("wrote {} bytes", report.total_bytes_written());
//! # Ok::<(), annbin_dataset::BatchError>(())
//! ```

pub mod batch;
pub mod convert;
pub mod element;
pub mod error;
pub mod header;
pub mod manifest;
pub mod summary;

pub use batch::{
    run_batch, run_batch_with_direction, BatchDirection, BatchError, BatchReport, EntryOutcome,
    EntryReport,
};
pub use convert::{convert, convert_between, inspect, ConversionReport, InspectReport};
pub use element::ElementType;
pub use error::{ConvertError, HeaderError};
pub use header::{
    decode_internal, encode_standard, DatasetHeader, HeaderField, HeaderLayout, HEADER_LEN,
};
pub use manifest::{DatasetRole, Manifest, ManifestEntry};
pub use summary::{collect_results, save_summary_csv, BenchmarkRecord};
