//! Liveping CLI library.
//!
//! Argument parsing, logging setup and the subcommand handlers behind the
//! `liveping` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands};
pub use error::{CliError, Result};
