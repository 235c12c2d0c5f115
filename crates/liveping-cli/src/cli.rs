//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Crates whose logs are shown at the chosen verbosity.
const LOG_TARGETS: &[&str] = &[
    "liveping",
    "liveping_cli",
    "liveping_core",
    "liveping_runtime",
    "liveping_twitch",
    "liveping_bluesky",
];

/// Liveping - announce Twitch streams on Bluesky
#[derive(Parser, Debug)]
#[command(name = "liveping")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        env = "LIVEPING_CONFIG",
        default_value = "config.json",
        global = true
    )]
    pub config: String,

    /// Log posts instead of sending them
    #[arg(long, global = true)]
    pub mock: bool,

    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Do not read manual post requests from stdin
    #[arg(long, global = true)]
    pub no_stdin: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch the channel and post when it goes live (default)
    Run,

    /// Run a single monitoring cycle and exit
    Once,

    /// Test the Twitch and Bluesky connections and exit
    Test,

    /// Post a notification right now
    Post,

    /// Write an example configuration file
    InitConfig {
        /// Where to write it
        #[arg(short, long, default_value = "config.example.json")]
        path: String,
    },
}

impl Cli {
    /// The subcommand, defaulting to `run`.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Config path with `~` expanded.
    pub fn config_path(&self) -> PathBuf {
        expand_path(&self.config)
    }

    /// Filter directive for the verbosity level.
    pub fn log_filter(&self) -> String {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let mut directives = vec!["warn".to_string()];
        directives.extend(LOG_TARGETS.iter().map(|t| format!("{}={}", t, level)));
        directives.join(",")
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
