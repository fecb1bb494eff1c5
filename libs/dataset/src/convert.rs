//! Single-file dataset conversion.
//!
//! A conversion reads the whole source into memory, validates the payload
//! length against the declared header, and only then opens the destination.
//! A source that fails validation therefore never creates or truncates the
//! destination file.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::element::ElementType;
use crate::error::{ConvertError, HeaderError, Result};
use crate::header::{DatasetHeader, HeaderLayout, HEADER_LEN};

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub dimension: u64,
    pub count: u64,
    pub element: ElementType,
    /// Header plus payload bytes written to the destination.
    pub bytes_written: u64,
}

impl ConversionReport {
    pub fn element_width(&self) -> usize {
        self.element.width()
    }
}

/// Convert an internal-layout file to the standard (fbin/ibin) layout.
pub fn convert(
    source: &Path,
    destination: &Path,
    element: ElementType,
) -> Result<ConversionReport> {
    convert_between(
        source,
        destination,
        element,
        HeaderLayout::Internal,
        HeaderLayout::Standard,
    )
}

/// Convert `source` in layout `from` to `destination` in layout `to`.
///
/// Only the 8-byte header is rewritten; payload bytes are copied unchanged.
pub fn convert_between(
    source: &Path,
    destination: &Path,
    element: ElementType,
    from: HeaderLayout,
    to: HeaderLayout,
) -> Result<ConversionReport> {
    let (header, payload) = read_dataset(source, element, from)?;

    let header_bytes = to
        .encode(&header)
        .map_err(|e| header_error(source, 0, e))?;

    let bytes_written = write_dataset(destination, &header_bytes, &payload)?;

    info!(
        source = %source.display(),
        destination = %destination.display(),
        dimension = header.dimension,
        count = header.count,
        element = %element,
        bytes_written,
        "Converted dataset"
    );

    Ok(ConversionReport {
        dimension: header.dimension,
        count: header.count,
        element,
        bytes_written,
    })
}

/// Header-only view of a dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub path: PathBuf,
    pub layout: HeaderLayout,
    pub element: ElementType,
    pub header: DatasetHeader,
    pub file_len: u64,
    /// `None` when `dimension * count * width` overflows.
    pub expected_payload: Option<u64>,
    pub actual_payload: u64,
}

impl InspectReport {
    /// Whether the declared shape matches the bytes on disk.
    pub fn is_consistent(&self) -> bool {
        self.expected_payload == Some(self.actual_payload)
    }
}

/// Read a file's header under `layout` and compare the declared shape with
/// the file size. The payload is never read.
pub fn inspect(path: &Path, layout: HeaderLayout, element: ElementType) -> Result<InspectReport> {
    let file = open_source(path)?;
    let file_len = source_len(&file, path)?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader, path, file_len, layout)?;

    Ok(InspectReport {
        path: path.to_path_buf(),
        layout,
        element,
        header,
        file_len,
        expected_payload: header.payload_len(element),
        actual_payload: file_len - HEADER_LEN as u64,
    })
}

fn read_dataset(
    path: &Path,
    element: ElementType,
    layout: HeaderLayout,
) -> Result<(DatasetHeader, Vec<u8>)> {
    let file = open_source(path)?;
    let file_len = source_len(&file, path)?;
    let mut reader = BufReader::new(file);

    let header = read_header(&mut reader, path, file_len, layout)?;
    debug!(
        path = %path.display(),
        %layout,
        dimension = header.dimension,
        count = header.count,
        "Decoded header"
    );

    let overflow = || ConvertError::ArithmeticOverflow {
        path: path.to_path_buf(),
        dimension: header.dimension,
        count: header.count,
        element_width: element.width(),
    };
    let expected = header.payload_len(element).ok_or_else(overflow)?;
    let expected_len = usize::try_from(expected).map_err(|_| overflow())?;

    let mismatch = |actual: u64| ConvertError::PayloadSizeMismatch {
        path: path.to_path_buf(),
        dimension: header.dimension,
        count: header.count,
        element_width: element.width(),
        expected,
        actual,
    };

    // Reject on metadata first so an over-long file is never loaded.
    let on_disk = file_len - HEADER_LEN as u64;
    if on_disk != expected {
        return Err(mismatch(on_disk));
    }

    // Re-check against what was actually read; metadata can be stale.
    let mut payload = Vec::with_capacity(expected_len);
    reader
        .take(expected.saturating_add(1))
        .read_to_end(&mut payload)
        .map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if payload.len() != expected_len {
        return Err(mismatch(payload.len() as u64));
    }

    Ok((header, payload))
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConvertError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn source_len(file: &File, path: &Path) -> Result<u64> {
    file.metadata()
        .map(|m| m.len())
        .map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn read_header<R: Read>(
    reader: &mut R,
    path: &Path,
    file_len: u64,
    layout: HeaderLayout,
) -> Result<DatasetHeader> {
    if file_len < HEADER_LEN as u64 {
        return Err(ConvertError::MalformedHeader {
            path: path.to_path_buf(),
            len: file_len,
        });
    }

    let mut buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut buf).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            ConvertError::MalformedHeader {
                path: path.to_path_buf(),
                len: file_len,
            }
        } else {
            ConvertError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    layout
        .decode(&buf)
        .map_err(|e| header_error(path, file_len, e))
}

fn header_error(path: &Path, file_len: u64, err: HeaderError) -> ConvertError {
    match err {
        HeaderError::Truncated { .. } => ConvertError::MalformedHeader {
            path: path.to_path_buf(),
            len: file_len,
        },
        HeaderError::ValueOutOfRange { field, value } => ConvertError::ValueOutOfRange {
            path: path.to_path_buf(),
            field,
            value,
        },
    }
}

fn write_dataset(destination: &Path, header: &[u8; HEADER_LEN], payload: &[u8]) -> Result<u64> {
    let write_err = |source: io::Error| ConvertError::WriteFailure {
        path: destination.to_path_buf(),
        source,
    };

    let file = File::create(destination).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(header).map_err(write_err)?;
    writer.write_all(payload).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    Ok((HEADER_LEN + payload.len()) as u64)
}
