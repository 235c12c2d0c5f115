//! Command handlers for CLI subcommands.

use std::path::Path;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{error, info, warn};

use liveping_bluesky::{BlueskyClient, DryRunPublisher, OpenGraphPreview};
use liveping_core::{Config, PreviewFetcher, Publisher, StatusSource};
use liveping_runtime::{
    listen_lines, CycleReport, DispatchOutcome, DispatchStatus, Dispatcher, MessageComposer,
    Runtime, RuntimeConfig, RuntimeEvent, StateSnapshot, TriggerHandle,
};
use liveping_twitch::TwitchClient;

use crate::cli::{expand_path, Cli, Commands};
use crate::error::{CliError, Result};

/// The external services the runtime drives.
pub struct Collaborators {
    pub source: Arc<dyn StatusSource>,
    pub publisher: Arc<dyn Publisher>,
    pub preview: Arc<dyn PreviewFetcher>,
}

impl Collaborators {
    /// Real clients from the configuration; `mock` swaps in a dry-run publisher.
    pub fn from_config(config: &Config, mock: bool) -> Result<Self> {
        let source = TwitchClient::new(&config.twitch.client_id, &config.twitch.client_secret)?;

        let publisher: Arc<dyn Publisher> = if mock {
            info!("mock mode: posts will only be logged");
            Arc::new(DryRunPublisher::new())
        } else {
            Arc::new(BlueskyClient::with_service(
                &config.bluesky.service,
                &config.bluesky.handle,
                &config.bluesky.app_password,
            )?)
        };

        Ok(Self {
            source: Arc::new(source),
            publisher,
            preview: Arc::new(OpenGraphPreview::new()?),
        })
    }
}

/// Execute a CLI command.
pub async fn execute(cli: &Cli) -> Result<()> {
    match cli.command() {
        Commands::InitConfig { path } => cmd_init_config(&expand_path(&path)),
        command => {
            let config = Config::load(&cli.config_path())?;
            let collaborators = Collaborators::from_config(&config, cli.mock)?;

            match command {
                Commands::Test => cmd_test(&config, &collaborators).await,
                Commands::Once => cmd_once(&config, collaborators).await,
                Commands::Post => cmd_post(&config, &collaborators).await,
                _ => cmd_run(&config, collaborators, !cli.no_stdin).await,
            }
        }
    }
}

fn build_runtime(config: &Config, collaborators: Collaborators) -> Result<Runtime> {
    Ok(Runtime::builder(RuntimeConfig::from_config(config))
        .status_source(collaborators.source)
        .publisher(collaborators.publisher)
        .preview_fetcher(collaborators.preview)
        .build()?)
}

/// Poll Twitch once and verify the Bluesky credentials.
pub async fn test_connections(config: &Config, collaborators: &Collaborators) -> Result<()> {
    info!("testing connections");

    match collaborators.source.poll(&config.twitch.username).await {
        Ok(status) => {
            info!(stream = %status.state(), "Twitch connection successful");
        }
        Err(e) => {
            error!(error = %e, "Twitch connection failed");
            return Err(CliError::ConnectionTest(format!("Twitch: {}", e)));
        }
    }

    if let Err(e) = collaborators.publisher.check_connection().await {
        error!(error = %e, "Bluesky connection failed");
        return Err(CliError::ConnectionTest(format!("Bluesky: {}", e)));
    }
    info!("Bluesky connection successful");

    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    Config::write_example(path)?;
    println!("Wrote example configuration to {}", path.display());
    println!("Fill in your Twitch and Bluesky credentials, then save it as config.json");
    Ok(())
}

async fn cmd_test(config: &Config, collaborators: &Collaborators) -> Result<()> {
    test_connections(config, collaborators).await?;
    println!("All connections OK");
    Ok(())
}

async fn cmd_once(config: &Config, collaborators: Collaborators) -> Result<()> {
    let mut runtime = build_runtime(config, collaborators)?;
    let report = runtime.run_once().await?;
    print_report(&report);
    Ok(())
}

/// One manual post from a fresh poll. A failed poll falls back to the
/// offline message.
async fn cmd_post(config: &Config, collaborators: &Collaborators) -> Result<()> {
    let snapshot = match collaborators.source.poll(&config.twitch.username).await {
        Ok(status) => StateSnapshot {
            state: status.state(),
            session: status.session,
        },
        Err(e) => {
            warn!(error = %e, "status poll failed, posting fallback message");
            StateSnapshot::default()
        }
    };

    let runtime_config = RuntimeConfig::from_config(config);
    let composer = MessageComposer::new(&runtime_config).with_preview(collaborators.preview.clone());
    let dispatcher = Dispatcher::new(composer, collaborators.publisher.clone());

    let outcome = dispatcher.dispatch_manual(&snapshot).await;
    print_outcome(&outcome);

    match outcome.status {
        DispatchStatus::Published(_) => Ok(()),
        DispatchStatus::Failed(e) => Err(CliError::Publish(e)),
    }
}

async fn cmd_run(config: &Config, collaborators: Collaborators, read_stdin: bool) -> Result<()> {
    info!(
        username = %config.twitch.username,
        handle = %config.bluesky.handle,
        check_interval = config.settings.check_interval,
        "starting Liveping"
    );

    test_connections(config, &collaborators).await.map_err(|e| {
        error!("connection tests failed, aborting");
        e
    })?;

    let mut runtime = build_runtime(config, collaborators)?;
    let trigger = runtime.trigger_handle();

    spawn_event_printer(&runtime);
    if read_stdin {
        spawn_stdin_listener(trigger.clone());
        println!("Press Enter (or type 'p') to post now. Ctrl+C to stop.");
    }
    #[cfg(unix)]
    spawn_signal_listener(trigger);

    runtime.run_forever(shutdown_signal()).await?;

    info!("shutdown complete");
    Ok(())
}

fn spawn_event_printer(runtime: &Runtime) {
    let mut events = runtime.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RuntimeEvent::Dispatched(outcome)) => print_outcome(&outcome),
                Ok(RuntimeEvent::Stopped { .. }) => break,
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_stdin_listener(trigger: TriggerHandle) {
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = listen_lines(stdin, trigger).await {
            warn!(error = %e, "stopped reading stdin");
        }
    });
}

#[cfg(unix)]
fn spawn_signal_listener(trigger: TriggerHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut usr1 = match signal(SignalKind::user_defined1()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "SIGUSR1 trigger unavailable");
                return;
            }
        };
        while usr1.recv().await.is_some() {
            info!("manual post requested by SIGUSR1");
            if !trigger.fire() {
                break;
            }
        }
    });
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

fn print_report(report: &CycleReport) {
    let state = report
        .observed
        .map(|s| s.to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    println!("Cycle {}: stream is {}", report.cycle, state);

    if let Some(e) = &report.error {
        println!("  poll failed: {}", e);
    }
    match &report.dispatch {
        Some(outcome) => print_outcome(outcome),
        None => println!("  nothing to post"),
    }
}

fn print_outcome(outcome: &DispatchOutcome) {
    match &outcome.status {
        DispatchStatus::Published(id) => println!(
            "  [{}] posted {}{}",
            outcome.kind,
            id,
            if outcome.preview_attached {
                " (with link card)"
            } else {
                ""
            }
        ),
        DispatchStatus::Failed(e) => println!("  [{}] post failed: {}", outcome.kind, e),
    }
}
