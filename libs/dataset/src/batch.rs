//! Batch driver: apply the converter to every entry of a manifest.
//!
//! Entries run strictly in manifest order. A missing source is recorded as
//! skipped; any other failure stops the batch and is returned together with
//! the report of entries finished so far. Files already written are left on
//! disk. An entry whose output was already written earlier in the same batch
//! is fatal, so no file is overwritten by the batch itself.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::convert::{convert_between, ConversionReport};
use crate::error::ConvertError;
use crate::header::HeaderLayout;
use crate::manifest::{Manifest, ManifestEntry};

/// Which way a batch converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchDirection {
    /// Internal sources (`entry.source`) to standard files (`entry.destination`).
    #[default]
    ToStandard,
    /// Standard files (`entry.destination`) back to internal (`entry.source`).
    ToInternal,
}

impl BatchDirection {
    pub const fn layouts(self) -> (HeaderLayout, HeaderLayout) {
        match self {
            BatchDirection::ToStandard => (HeaderLayout::Internal, HeaderLayout::Standard),
            BatchDirection::ToInternal => (HeaderLayout::Standard, HeaderLayout::Internal),
        }
    }

    /// (input name, output name) for an entry.
    pub fn file_names(self, entry: &ManifestEntry) -> (&str, &str) {
        match self {
            BatchDirection::ToStandard => (&entry.source, &entry.destination),
            BatchDirection::ToInternal => (&entry.destination, &entry.source),
        }
    }
}

/// What happened to one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Input file was absent.
    Skipped,
    Converted(ConversionReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub entry: ManifestEntry,
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: EntryOutcome,
}

impl EntryReport {
    /// Size of the written file, if the entry was converted.
    pub fn output_size(&self) -> Option<u64> {
        match &self.outcome {
            EntryOutcome::Converted(report) => Some(report.bytes_written),
            EntryOutcome::Skipped => None,
        }
    }
}

/// Per-entry outcomes, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub entries: Vec<EntryReport>,
}

impl BatchReport {
    pub fn converted(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Converted(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|e| e.outcome == EntryOutcome::Skipped)
    }

    pub fn total_bytes_written(&self) -> u64 {
        self.entries.iter().filter_map(EntryReport::output_size).sum()
    }
}

/// A batch stopped at `input_name`.
#[derive(Debug, thiserror::Error)]
#[error("failed to convert {input_name}: {source}")]
pub struct BatchError {
    pub input_name: String,
    /// Entries processed before the failure.
    pub completed: BatchReport,
    #[source]
    pub source: ConvertError,
}

/// Convert every manifest entry from `input_dir` into `output_dir`
/// (internal to standard layout).
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    manifest: &Manifest,
) -> Result<BatchReport, BatchError> {
    run_batch_with_direction(input_dir, output_dir, manifest, BatchDirection::ToStandard)
}

pub fn run_batch_with_direction(
    input_dir: &Path,
    output_dir: &Path,
    manifest: &Manifest,
    direction: BatchDirection,
) -> Result<BatchReport, BatchError> {
    let (from, to) = direction.layouts();
    let mut report = BatchReport::default();
    let mut outputs = HashSet::new();

    for entry in manifest.entries() {
        let (input_name, output_name) = direction.file_names(entry);
        let input = input_dir.join(input_name);
        let output = output_dir.join(output_name);

        if !outputs.insert(output_name) {
            return Err(BatchError {
                input_name: input_name.to_string(),
                completed: report,
                source: ConvertError::DuplicateOutput { path: output },
            });
        }

        let outcome = match convert_between(&input, &output, entry.element, from, to) {
            Ok(conversion) => EntryOutcome::Converted(conversion),
            Err(err) if err.is_skippable() => {
                warn!(role = %entry.role, file = input_name, "Input not found, skipping");
                EntryOutcome::Skipped
            }
            Err(source) => {
                return Err(BatchError {
                    input_name: input_name.to_string(),
                    completed: report,
                    source,
                });
            }
        };

        report.entries.push(EntryReport {
            entry: entry.clone(),
            input,
            output,
            outcome,
        });
    }

    info!(
        converted = report.converted().count(),
        skipped = report.skipped().count(),
        bytes = report.total_bytes_written(),
        "Batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::manifest::DatasetRole;
    use std::fs;
    use tempfile::tempdir;

    fn write_internal(path: &Path, dim: u32, count: u32, width: usize) {
        let mut bytes = dim.to_le_bytes().to_vec();
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.resize(8 + dim as usize * count as usize * width, 0x5A);
        fs::write(path, bytes).unwrap();
    }

    fn write_standard(path: &Path, count: u32, dim: u32) {
        let mut bytes = count.to_le_bytes().to_vec();
        bytes.extend_from_slice(&dim.to_le_bytes());
        bytes.resize(8 + dim as usize * count as usize * 4, 0x3C);
        fs::write(path, bytes).unwrap();
    }

    fn small_manifest() -> Manifest {
        Manifest::new(vec![
            ManifestEntry::new(DatasetRole::Base, "base.bin", "base.fbin"),
            ManifestEntry::new(DatasetRole::Query, "query.bin", "query.fbin"),
            ManifestEntry::new(DatasetRole::GroundTruth, "gt.bin", "gt.ibin"),
        ])
    }

    #[test]
    fn test_all_entries_converted() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_internal(&input.path().join("base.bin"), 8, 20, 4);
        write_internal(&input.path().join("query.bin"), 8, 3, 4);
        write_internal(&input.path().join("gt.bin"), 10, 3, 8);

        let report = run_batch(input.path(), output.path(), &small_manifest()).unwrap();
        assert_eq!(report.converted().count(), 3);
        assert_eq!(report.skipped().count(), 0);

        let sizes: Vec<_> = report.entries.iter().map(|e| e.output_size()).collect();
        assert_eq!(sizes, [Some(8 + 640), Some(8 + 96), Some(8 + 240)]);
        assert_eq!(report.total_bytes_written(), 648 + 104 + 248);

        let gt = fs::read(output.path().join("gt.ibin")).unwrap();
        assert_eq!(&gt[..8], &[3, 0, 0, 0, 10, 0, 0, 0]);
    }

    #[test]
    fn test_missing_entry_is_skipped() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_internal(&input.path().join("base.bin"), 4, 4, 4);
        write_internal(&input.path().join("gt.bin"), 2, 2, 8);

        let report = run_batch(input.path(), output.path(), &small_manifest()).unwrap();
        let outcomes: Vec<_> = report
            .entries
            .iter()
            .map(|e| matches!(e.outcome, EntryOutcome::Converted(_)))
            .collect();
        assert_eq!(outcomes, [true, false, true]);
        assert!(!output.path().join("query.fbin").exists());
        assert!(output.path().join("gt.ibin").exists());
    }

    #[test]
    fn test_error_aborts_and_keeps_partial_report() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_internal(&input.path().join("base.bin"), 4, 4, 4);
        // Query payload one byte short.
        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 15]);
        fs::write(input.path().join("query.bin"), bytes).unwrap();
        write_internal(&input.path().join("gt.bin"), 2, 2, 8);

        let err = run_batch(input.path(), output.path(), &small_manifest()).unwrap_err();
        assert_eq!(err.input_name, "query.bin");
        assert!(matches!(
            err.source,
            ConvertError::PayloadSizeMismatch {
                expected: 16,
                actual: 15,
                ..
            }
        ));
        assert_eq!(err.completed.entries.len(), 1);
        assert!(err.to_string().starts_with("failed to convert query.bin"));

        // Earlier output stays, later entries are never attempted.
        assert!(output.path().join("base.fbin").exists());
        assert!(!output.path().join("query.fbin").exists());
        assert!(!output.path().join("gt.ibin").exists());
    }

    #[test]
    fn test_reverse_direction_swaps_names() {
        let input = tempdir().unwrap();
        let staged = tempdir().unwrap();
        let restored = tempdir().unwrap();
        write_internal(&input.path().join("base.bin"), 3, 5, 4);

        let manifest = Manifest::new(vec![ManifestEntry::new(
            DatasetRole::Base,
            "base.bin",
            "base.fbin",
        )
        .with_element(ElementType::Float32)]);

        run_batch(input.path(), staged.path(), &manifest).unwrap();
        let report = run_batch_with_direction(
            staged.path(),
            restored.path(),
            &manifest,
            BatchDirection::ToInternal,
        )
        .unwrap();

        assert_eq!(report.entries[0].output, restored.path().join("base.bin"));
        assert_eq!(
            fs::read(restored.path().join("base.bin")).unwrap(),
            fs::read(input.path().join("base.bin")).unwrap()
        );
    }

    #[test]
    fn test_reverse_shared_source_does_not_overwrite() {
        let staged = tempdir().unwrap();
        let restored = tempdir().unwrap();
        write_standard(&staged.path().join("a.fbin"), 2, 2);
        write_standard(&staged.path().join("b.fbin"), 3, 1);

        // Both entries restore to the same internal file.
        let manifest = Manifest::new(vec![
            ManifestEntry::new(DatasetRole::Base, "same.bin", "a.fbin"),
            ManifestEntry::new(DatasetRole::Query, "same.bin", "b.fbin"),
        ]);
        assert!(manifest.validate().is_err());

        let err = run_batch_with_direction(
            staged.path(),
            restored.path(),
            &manifest,
            BatchDirection::ToInternal,
        )
        .unwrap_err();
        assert_eq!(err.input_name, "b.fbin");
        assert!(matches!(err.source, ConvertError::DuplicateOutput { .. }));
        assert!(!err.source.is_skippable());
        assert_eq!(err.completed.converted().count(), 1);

        // First conversion is intact: 8 header bytes + 2 x 2 x 4 payload.
        let restored_bytes = fs::read(restored.path().join("same.bin")).unwrap();
        assert_eq!(restored_bytes.len(), 24);
        assert_eq!(&restored_bytes[..8], &[2, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_forward_shared_destination_is_fatal() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_internal(&input.path().join("a.bin"), 2, 2, 4);
        write_internal(&input.path().join("b.bin"), 3, 1, 4);

        let manifest = Manifest::new(vec![
            ManifestEntry::new(DatasetRole::Base, "a.bin", "out.fbin"),
            ManifestEntry::new(DatasetRole::Query, "b.bin", "out.fbin"),
        ]);
        let err = run_batch(input.path(), output.path(), &manifest).unwrap_err();
        assert_eq!(err.input_name, "b.bin");
        assert_eq!(fs::read(output.path().join("out.fbin")).unwrap().len(), 24);
    }
}
