//! Shared runtime support for the annbin workspace.

pub mod telemetry;
