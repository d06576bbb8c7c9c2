//! Ledgerline - line shell for the finance tracker
//!
//! Architecture:
//! - Shell - reads commands from stdin, prints snapshots
//! - App Layer - store actor processing commands
//! - Network Layer (Tokio) - async HTTP execution

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use ledgerline::cli::{self, Action, View};
use ledgerline::constants::{APP_NAME, APP_VERSION};
use ledgerline::{AppActor, Config, HttpTransport, RecordKind, Store, StoreCommand, StoreSnapshot, TokenStore};

#[derive(Parser, Debug)]
#[command(name = "ledgerline", version, about = "Track incomes and expenses against a remote ledger")]
struct Args {
    /// Base URL of the tracker API
    #[arg(long)]
    api_url: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the session file and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(secs) = args.timeout {
        config.request_timeout_secs = secs;
    }
    std::fs::create_dir_all(&config.data_dir)?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&config.data_dir, format!("{}.log", APP_NAME));
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!(version = APP_VERSION, api_url = %config.base_url(), "Starting");

    let transport = HttpTransport::new(config.base_url(), config.request_timeout())?;
    let store = Arc::new(Store::new(transport, TokenStore::new(&config.data_dir)));

    // Create channels
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<StoreCommand>();
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel::<StoreSnapshot>();

    // Spawn app actor
    let actor = tokio::spawn(AppActor::new(store, snapshot_tx).run(cmd_rx));
    let _ = cmd_tx.send(StoreCommand::Restore);

    println!("{} {} - type 'help' for commands", APP_NAME, APP_VERSION);
    run_shell(&cmd_tx, &mut snapshot_rx).await?;

    let _ = cmd_tx.send(StoreCommand::Shutdown);
    actor.await?;
    tracing::info!("Stopped");
    Ok(())
}

/// Read commands until EOF or `quit`, printing changes as snapshots arrive
async fn run_shell(
    cmd_tx: &mpsc::UnboundedSender<StoreCommand>,
    snapshot_rx: &mut mpsc::UnboundedReceiver<StoreSnapshot>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current = StoreSnapshot::default();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match cli::parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(Action::Quit)) => break,
                    Ok(Some(Action::Help)) => println!("{}", cli::HELP),
                    Ok(Some(Action::Show(view))) => println!("{}", render_view(view, &current)),
                    Ok(Some(Action::Run(cmd))) => {
                        if cmd_tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }

            Some(snapshot) = snapshot_rx.recv() => {
                for note in cli::describe_changes(&current, &snapshot) {
                    println!("{}", note);
                }
                current = snapshot;
            }
        }
    }

    Ok(())
}

fn render_view(view: View, snapshot: &StoreSnapshot) -> String {
    match view {
        View::Records(RecordKind::Income) => cli::render_records(RecordKind::Income, &snapshot.incomes),
        View::Records(RecordKind::Expense) => cli::render_records(RecordKind::Expense, &snapshot.expenses),
        View::Totals => cli::render_totals(&snapshot.totals),
        View::Status => cli::render_status(snapshot),
    }
}
