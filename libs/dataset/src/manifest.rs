//! Conversion manifests.
//!
//! A manifest is the fixed list of (source, destination, element type)
//! triples the batch driver walks. The default manifest covers the
//! OpenAI-500K dataset; other datasets that follow the same naming scheme
//! can be described with [`Manifest::for_dataset`] or loaded from JSON.
//!
//! ```json
//! {
//!   "entries": [
//!     { "role": "base", "source": "openai_500k_train_vectors.bin",
//!       "destination": "openai500k_base.fbin", "element": "f32" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::element::ElementType;

/// Source prefix of the default manifest.
pub const DEFAULT_SOURCE_PREFIX: &str = "openai_500k";

/// Destination prefix of the default manifest.
pub const DEFAULT_DESTINATION_PREFIX: &str = "openai500k";

/// Role a dataset file plays in a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    /// Vectors to index.
    Base,
    /// Query vectors.
    Query,
    /// Exact nearest-neighbor ids per query.
    #[serde(rename = "groundtruth")]
    GroundTruth,
}

impl DatasetRole {
    pub const ALL: [DatasetRole; 3] = [
        DatasetRole::Base,
        DatasetRole::Query,
        DatasetRole::GroundTruth,
    ];

    /// Element type files of this role are stored with.
    pub const fn default_element(self) -> ElementType {
        match self {
            DatasetRole::Base | DatasetRole::Query => ElementType::Float32,
            DatasetRole::GroundTruth => ElementType::Int64,
        }
    }
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetRole::Base => write!(f, "base"),
            DatasetRole::Query => write!(f, "query"),
            DatasetRole::GroundTruth => write!(f, "groundtruth"),
        }
    }
}

/// One file to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub role: DatasetRole,
    /// File name inside the input directory.
    pub source: String,
    /// File name inside the output directory.
    pub destination: String,
    pub element: ElementType,
}

impl ManifestEntry {
    /// Entry using the role's default element type.
    pub fn new(role: DatasetRole, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            role,
            source: source.into(),
            destination: destination.into(),
            element: role.default_element(),
        }
    }

    /// Override the element type.
    pub fn with_element(mut self, element: ElementType) -> Self {
        self.element = element;
        self
    }
}

/// Ordered, immutable list of files to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::for_dataset(DEFAULT_SOURCE_PREFIX, DEFAULT_DESTINATION_PREFIX)
    }
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Base, query and ground-truth entries for a dataset named like OpenAI-500K:
    ///
    /// - `{src}_train_vectors.bin` -> `{dst}_base.fbin`
    /// - `{src}_test_queries.bin` -> `{dst}_query.fbin`
    /// - `{src}_ground_truth.bin` -> `{dst}_groundtruth.ibin`
    pub fn for_dataset(source_prefix: &str, destination_prefix: &str) -> Self {
        let entries = DatasetRole::ALL
            .into_iter()
            .map(|role| {
                let source_suffix = match role {
                    DatasetRole::Base => "train_vectors",
                    DatasetRole::Query => "test_queries",
                    DatasetRole::GroundTruth => "ground_truth",
                };
                let element = role.default_element();
                ManifestEntry::new(
                    role,
                    format!("{}_{}.bin", source_prefix, source_suffix),
                    format!(
                        "{}_{}.{}",
                        destination_prefix,
                        role,
                        element.standard_extension()
                    ),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject manifests the batch driver cannot run safely.
    ///
    /// Sources and destinations must each be unique, since either side can
    /// be the output of a batch depending on its direction.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            anyhow::bail!("Manifest has no entries");
        }

        let mut errors = Vec::new();
        let mut sources = HashSet::new();
        let mut destinations = HashSet::new();

        for entry in &self.entries {
            for name in [&entry.source, &entry.destination] {
                if !is_plain_file_name(name) {
                    errors.push(format!("not a plain file name: {:?}", name));
                }
            }
            if !sources.insert(entry.source.as_str()) {
                errors.push(format!("duplicate source: {}", entry.source));
            }
            if !destinations.insert(entry.destination.as_str()) {
                errors.push(format!("duplicate destination: {}", entry.destination));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid manifest:\n  {}", errors.join("\n  "))
        }
    }

    /// Load and validate a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;
        let manifest: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest JSON in {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize manifest")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}
