//! Command-line interface for corpus-forge.
//!
//! Provides the stage-selection flags and dispatches into the pipeline
//! orchestrator.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
