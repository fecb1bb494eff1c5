//! Dataset conversion and benchmark summary CLI.
//!
//! ## Commands
//!
//! ```bash
//! # Convert internal-layout files to fbin/ibin
//! annbin convert /datasets/openai_500k ./data
//!
//! # Same, with a custom manifest; or back to the internal layout
//! annbin convert ./in ./out --manifest manifest.json
//! annbin convert ./data ./restored --reverse
//!
//! # Check a file's header against its size
//! annbin inspect ./data/openai500k_groundtruth.ibin --layout standard --element i64
//!
//! # Summarize search_concurrency_*.json results
//! annbin summarize ./results
//!
//! # Print the default manifest as JSON
//! annbin manifest
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "annbin")]
#[command(version, about = "ANN benchmark dataset conversion and result summaries")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every manifest entry from <INPUT_DIR> into <OUTPUT_DIR>
    Convert(commands::ConvertArgs),

    /// Show a dataset file's header and check it against the file size
    Inspect(commands::InspectArgs),

    /// Summarize per-concurrency search benchmark results
    Summarize(commands::SummarizeArgs),

    /// Print a conversion manifest as JSON
    Manifest(commands::ManifestArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    annbin_core::telemetry::init_dev_subscriber_with_env_filter(default_filter);

    match cli.command {
        Commands::Convert(args) => commands::convert(args),
        Commands::Inspect(args) => commands::inspect(args),
        Commands::Summarize(args) => commands::summarize(args),
        Commands::Manifest(args) => commands::manifest(args),
    }
}
