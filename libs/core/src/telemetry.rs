//! Telemetry module providing tracing subscriber initialization for the annbin tools.
//!
//! `init_dev_subscriber_with_env_filter()` installs stderr logging filtered by
//! `RUST_LOG`. Libraries only emit `tracing` events; binaries call this once
//! at startup.
//!
//! # Usage
//!
//! ```no_run
//! use annbin_core::telemetry;
//!
//! fn main() {
//!     telemetry::init_dev_subscriber_with_env_filter("info");
//!     tracing::info!("Application started");
//! }
//! ```

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialize a stderr subscriber filtered by the `RUST_LOG` environment variable.
///
/// If `RUST_LOG` is unset or invalid, `default_directive` is used instead
/// (e.g. `"info"` or `"annbin_dataset=debug,info"`).
///
/// # Panics
/// Panics if a global subscriber has already been set.
pub fn init_dev_subscriber_with_env_filter(default_directive: &str) {
    let filter = env_filter_or(default_directive);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn env_filter_or(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
