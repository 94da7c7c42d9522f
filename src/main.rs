//! Agent Arena Monitor
//!
//! Polls the trading simulation backend and renders its leaderboard and
//! agent state in the terminal.

mod api;
mod config;
mod models;
mod polling;
mod view;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::StatsClient;
use crate::config::{resolve_base_url, MonitorConfig};
use crate::models::Denomination;
use crate::polling::{PollingController, ViewState};
use crate::view::{project, render_state};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";
const WATCH_HINT: &str = "Press Enter to run a cycle, Ctrl+C to quit.";

/// Agent Arena monitor CLI.
#[derive(Parser)]
#[command(name = "arena-monitor")]
#[command(about = "Watch the Agent Arena trading simulation", long_about = None)]
struct Cli {
    /// Backend base URL (takes precedence over the origin)
    #[arg(long, env = "ARENA_API_URL")]
    api_url: Option<String>,

    /// Origin the monitor is served from; a non-loopback origin puts the backend at <origin>/api
    #[arg(long, env = "ARENA_ORIGIN")]
    origin: Option<String>,

    /// Payload variant the backend serves
    #[arg(long, value_enum, default_value = "usd", env = "ARENA_DENOMINATION")]
    denomination: Denomination,

    /// Polling interval in seconds
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Number of leaderboard rows to show
    #[arg(long, default_value = "15")]
    leaderboard_size: usize,

    /// Refresh even when the cycle trigger fails
    #[arg(long)]
    refresh_after_failed_cycle: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the backend and keep the dashboard on screen (Enter runs a cycle)
    Watch,

    /// Fetch and print the dashboard once
    Snapshot {
        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Advance the simulation by one cycle and show the result
    Cycle,

    /// Check that the backend is reachable
    Status,

    /// Show the resolved configuration
    Config,
}

impl Cli {
    fn monitor_config(&self) -> Result<MonitorConfig> {
        Ok(MonitorConfig {
            base_url: resolve_base_url(self.api_url.as_deref(), self.origin.as_deref())?,
            poll_interval_secs: self.interval,
            leaderboard_size: self.leaderboard_size,
            denomination: self.denomination,
            refresh_after_failed_cycle: self.refresh_after_failed_cycle,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging (stderr keeps the rendered dashboard clean)
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.monitor_config()?;
    let client = StatsClient::new(config.base_url.clone(), config.denomination)
        .context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Watch => {
            info!(
                base_url = %config.base_url,
                interval = config.poll_interval_secs,
                denomination = %config.denomination,
                "Starting monitor"
            );

            watch(client, &config).await?;
        }

        Commands::Snapshot { json } => {
            let snapshot = client
                .fetch_snapshot()
                .await
                .context("Failed to fetch dashboard stats")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", project(&snapshot, config.leaderboard_size));
            }
        }

        Commands::Cycle => {
            let controller = PollingController::new(Arc::new(client), config.polling());
            let outcome = controller.run_cycle().await;

            if !outcome.triggered {
                anyhow::bail!("Backend did not accept the cycle trigger (see logs)");
            }
            if !outcome.refreshed() {
                anyhow::bail!("Cycle triggered, but fetching the updated dashboard failed (see logs)");
            }

            println!("Simulated cycle triggered!\n");
            println!("{}", render_state(&controller.state(), config.leaderboard_size));
        }

        Commands::Status => {
            let status = client.ping().await.context("Backend unreachable")?;

            println!("Backend: {}", client.base_url());
            println!("Status:  {}", status);
        }

        Commands::Config => {
            println!("\n=== Monitor Configuration ===\n");
            println!("Backend:");
            println!("  Base URL:             {}", config.base_url);
            println!("  Denomination:         {}", config.denomination);
            println!("\nPolling:");
            println!("  Interval:             {}s", config.poll_interval_secs);
            println!("  Refresh After Failed Cycle: {}", config.refresh_after_failed_cycle);
            println!("\nDisplay:");
            println!("  Leaderboard Rows:     {}", config.leaderboard_size);
        }
    }

    Ok(())
}

/// One full screen of the watch view: the state followed by the key hint.
fn watch_frame(state: &ViewState, leaderboard_size: usize) -> String {
    format!(
        "{}{}\n\n{}",
        CLEAR_SCREEN,
        render_state(state, leaderboard_size),
        WATCH_HINT
    )
}

fn draw(state: &ViewState, leaderboard_size: usize) {
    println!("{}", watch_frame(state, leaderboard_size));
}

/// Mount the controller and redraw on every state change until Ctrl+C.
async fn watch(client: StatsClient, config: &MonitorConfig) -> Result<()> {
    let controller = PollingController::new(Arc::new(client), config.polling());
    let mut updates = controller.subscribe();
    let view = controller.mount();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    draw(&controller.state(), config.leaderboard_size);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping monitor...");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                draw(&state, config.leaderboard_size);
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        let controller = Arc::clone(view.controller());
                        tokio::spawn(async move {
                            if controller.run_cycle().await.triggered {
                                info!("Simulated cycle triggered");
                            }
                        });
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    view.unmount().await;

    Ok(())
}
