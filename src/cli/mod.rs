//! Command line interface for kodegen_release_flow.
//!
//! Parses arguments, wires the production collaborators and runs the flow
//! for the chosen subcommand.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, CommonArgs, VersionArgs};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
