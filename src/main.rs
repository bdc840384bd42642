//! Open City simulation host
//!
//! Runs a single session on the downtown scenario. Commands arrive as JSON
//! lines on stdin, outcomes and broadcast events are logged.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use open_city_sim::config::Config;
use open_city_sim::game::{Engine, Scenario};
use open_city_sim::session::{Command, GameSession, SessionHandle, SessionMsg};
use open_city_sim::util::random::SeededRandom;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    let scenario = Scenario::downtown();
    info!(scenario = scenario.name, seed = config.seed, "Starting Open City simulation");

    let engine = Engine::new(scenario.world, config.movement, SeededRandom::new(config.seed));
    let (session, handle) = GameSession::new(engine, config.snapshot_interval_ticks);
    let session_task = tokio::spawn(session.run());

    tokio::spawn(log_session_messages(handle.clone()));

    tokio::select! {
        result = read_commands(handle.clone()) => {
            result?;
            info!("Command stream closed");
        }
        _ = shutdown_signal() => {}
    }

    handle.shutdown().await.ok();
    session_task.await.context("session task panicked")?;

    info!("Simulation shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Feed JSON-line commands from stdin into the session until EOF
async fn read_commands(handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command: Command = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed command");
                continue;
            }
        };

        match handle.send(command).await? {
            Ok(events) => {
                info!(count = events.len(), "Command accepted");
                println!("{}", serde_json::to_string(&events)?);
            }
            Err(reason) => {
                info!(%reason, "Command rejected");
                println!("{}", serde_json::json!({ "rejected": reason.to_string() }));
            }
        }
    }

    Ok(())
}

/// Log events published by the session
async fn log_session_messages(handle: SessionHandle) {
    let mut rx = handle.subscribe();
    loop {
        match rx.recv().await {
            Ok(SessionMsg::Events {
                game_time_ms,
                events,
            }) => {
                for event in events {
                    info!(game_time_ms, ?event, "Game event");
                }
            }
            Ok(SessionMsg::Snapshot(snapshot)) => {
                debug!(
                    game_time_ms = snapshot.game_time_ms,
                    bullets = snapshot.bullets.len(),
                    "Snapshot"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session message log lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
