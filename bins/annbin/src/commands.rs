//! CLI command implementations.
//!
//! Thin wrappers around `annbin_dataset`: argument handling, directory checks
//! and the human-readable report on stdout.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use annbin_dataset::batch::{run_batch_with_direction, BatchDirection, BatchReport, EntryOutcome};
use annbin_dataset::manifest::{DEFAULT_DESTINATION_PREFIX, DEFAULT_SOURCE_PREFIX};
use annbin_dataset::summary::{self, SUMMARY_CSV_NAME};
use annbin_dataset::{ElementType, HeaderLayout, Manifest};

const RULE_WIDTH: usize = 80;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

// ============================================================================
// Convert Command
// ============================================================================

#[derive(Parser)]
pub struct ConvertArgs {
    /// Directory holding the source files
    pub input_dir: PathBuf,

    /// Directory to write converted files to (created if missing)
    pub output_dir: PathBuf,

    /// JSON manifest to use instead of the built-in OpenAI-500K one
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Convert standard (fbin/ibin) files back to the internal layout
    #[arg(long)]
    pub reverse: bool,
}

pub fn convert(args: ConvertArgs) -> Result<()> {
    if !args.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input_dir.display());
    }

    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path)?,
        None => Manifest::default(),
    };
    let direction = if args.reverse {
        BatchDirection::ToInternal
    } else {
        BatchDirection::ToStandard
    };

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let (from, to) = direction.layouts();
    println!("{}", rule());
    println!("Dataset Conversion: {} -> {}", from, to);
    println!("{}", rule());
    println!("Input directory:  {}", args.input_dir.display());
    println!("Output directory: {}", args.output_dir.display());
    println!();

    let result =
        run_batch_with_direction(&args.input_dir, &args.output_dir, &manifest, direction);
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            print_entries(&err.completed);
            return Err(err.into());
        }
    };

    print_entries(&report);

    println!("{}", rule());
    println!("Conversion completed successfully!");
    println!("{}", rule());
    println!();
    println!("Generated files:");
    for entry in report.converted() {
        let name = entry
            .output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = entry.output_size().unwrap_or(0) as f64 / BYTES_PER_MB;
        println!("  {:40} {:10.2} MB", name, size);
    }
    println!();
    Ok(())
}

fn print_entries(report: &BatchReport) {
    for entry in &report.entries {
        let input_name = entry
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &entry.outcome {
            EntryOutcome::Skipped => {
                println!("Warning: {} not found, skipping...", input_name);
            }
            EntryOutcome::Converted(conversion) => {
                println!(
                    "Converted {} -> {}",
                    entry.input.display(),
                    entry.output.display()
                );
                println!(
                    "  dim={}, count={}, element={} ({} bytes)",
                    conversion.dimension,
                    conversion.count,
                    conversion.element,
                    conversion.element_width()
                );
                println!("  wrote {} bytes", conversion.bytes_written);
            }
        }
        println!();
    }
}

// ============================================================================
// Inspect Command
// ============================================================================

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum LayoutArg {
    /// [dim, count]
    Internal,
    /// [count, dim] (fbin/ibin)
    Standard,
}

impl From<LayoutArg> for HeaderLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Internal => HeaderLayout::Internal,
            LayoutArg::Standard => HeaderLayout::Standard,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ElementArg {
    /// 4-byte float
    F32,
    /// 8-byte integer
    I64,
}

impl From<ElementArg> for ElementType {
    fn from(arg: ElementArg) -> Self {
        match arg {
            ElementArg::F32 => ElementType::Float32,
            ElementArg::I64 => ElementType::Int64,
        }
    }
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Dataset file to inspect
    pub file: PathBuf,

    /// Header layout to read the file with
    #[arg(long, value_enum, default_value = "internal")]
    pub layout: LayoutArg,

    /// Element type of the payload
    #[arg(long, value_enum, default_value = "f32")]
    pub element: ElementArg,
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let report = annbin_dataset::inspect(&args.file, args.layout.into(), args.element.into())?;

    println!("File:      {}", report.path.display());
    println!("Layout:    {}", report.layout);
    println!("Element:   {} ({} bytes)", report.element, report.element.width());
    println!("Dimension: {}", report.header.dimension);
    println!("Count:     {}", report.header.count);
    match report.expected_payload {
        Some(expected) => println!("Expected payload: {} bytes", expected),
        None => println!("Expected payload: overflow"),
    }
    println!("Actual payload:   {} bytes", report.actual_payload);

    if !report.is_consistent() {
        anyhow::bail!(
            "Header does not match file size for {}",
            report.path.display()
        );
    }
    println!("Status:    OK");
    Ok(())
}

// ============================================================================
// Summarize Command
// ============================================================================

#[derive(Parser)]
pub struct SummarizeArgs {
    /// Directory holding search_concurrency_*.json files
    pub results_dir: PathBuf,

    /// Where to write the CSV summary (default: <RESULTS_DIR>/summary.csv)
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub fn summarize(args: SummarizeArgs) -> Result<()> {
    if !args.results_dir.is_dir() {
        anyhow::bail!("Directory not found: {}", args.results_dir.display());
    }

    let records = summary::collect_results(&args.results_dir)?;

    println!("{}", rule());
    println!("Search Benchmark Results Summary");
    println!("{}", rule());
    println!();
    print!("{}", summary::render_table(&records));
    println!();
    println!("{}", rule());
    if let Some(first) = records.first() {
        print!("{}", summary::render_search_parameters(first));
    }
    println!();

    let csv_path = args
        .csv
        .unwrap_or_else(|| args.results_dir.join(SUMMARY_CSV_NAME));
    summary::save_summary_csv(&records, &csv_path)?;
    println!("Summary saved to: {}", csv_path.display());
    println!();
    Ok(())
}

// ============================================================================
// Manifest Command
// ============================================================================

#[derive(Parser)]
pub struct ManifestArgs {
    /// Source file name prefix
    #[arg(long, default_value = DEFAULT_SOURCE_PREFIX)]
    pub source_prefix: String,

    /// Destination file name prefix
    #[arg(long, default_value = DEFAULT_DESTINATION_PREFIX)]
    pub destination_prefix: String,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn manifest(args: ManifestArgs) -> Result<()> {
    let manifest = Manifest::for_dataset(&args.source_prefix, &args.destination_prefix);
    manifest.validate()?;

    match &args.output {
        Some(path) => {
            manifest.save(path)?;
            println!("Manifest saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&manifest)?),
    }
    Ok(())
}
