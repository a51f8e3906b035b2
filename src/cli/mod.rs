//! CLI layer for autoapply.
//!
//! Provides the command-line interface using clap, with commands for
//! setting up the applicant database and asking questions.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
