//! Liveping entry point.

use clap::Parser;

use liveping_cli::cli::{Cli, Commands};
use liveping_cli::{commands, logging};
use liveping_core::paths;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Environment from the config directory first, then the working directory.
    let env_path = paths::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let guard = if matches!(cli.command(), Commands::InitConfig { .. }) {
        None
    } else {
        if let Err(e) = paths::ensure_all_dirs() {
            eprintln!("Warning: failed to create state directories: {}", e);
        }
        match logging::init_logging(&cli.log_filter(), &paths::logs_dir()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    };

    let code = match commands::execute(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_config() {
                eprintln!("Run `liveping init-config` to create an example configuration file");
            }
            1
        }
    };

    drop(guard);
    // The stdin reader may still be blocked on a read; exit without waiting for it.
    std::process::exit(code);
}
