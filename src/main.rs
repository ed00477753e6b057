//! Main entry point for the battle-room service
//!
//! Loads configuration, starts the battle API with its health and metrics
//! server, and shuts everything down on SIGINT/SIGTERM.

use anyhow::{Context, Result};
use battle_room::config::AppConfig;
use battle_room::service::{AppState, BattleService, HealthCheck, HealthStatus};
use battle_room::types::Participant;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Battle Room - head-to-head quiz battles with Elo ratings
#[derive(Parser)]
#[command(
    name = "battle-room",
    version,
    about = "Quiz battle matchmaking, result ledger and leaderboards",
    long_about = "Battle Room pairs participants for quick practice battles or ranked battles \
                 within a rating band, applies Elo rating changes when results are submitted, \
                 and serves all-time, weekly and monthly leaderboards over HTTP."
)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    #[arg(long, value_name = "PORT", help = "Override battle API port")]
    http_port: Option<u16>,

    #[arg(long, value_name = "PORT", help = "Override metrics server port")]
    metrics_port: Option<u16>,

    #[arg(long, value_name = "SEED", help = "Seed the matchmaking generator")]
    seed: Option<u64>,

    #[arg(
        long,
        value_name = "FILE",
        help = "JSON array of participants to load at startup"
    )]
    participants: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Participant record as written in the startup file
#[derive(Debug, Deserialize)]
struct ParticipantSeed {
    id: u64,
    username: String,
    rating: Option<i32>,
    avatar: Option<String>,
}

impl ParticipantSeed {
    /// Omitted ratings start at the configured initial rating
    fn into_participant(self, state: &AppState) -> Participant {
        let mut participant = state.new_participant(self.id, self.username);
        if let Some(rating) = self.rating {
            participant = participant.with_rating(rating);
        }
        if let Some(avatar) = self.avatar {
            participant = participant.with_avatar(avatar);
        }
        participant
    }
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn load_participants(state: &AppState, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read participants file {}", path.display()))?;
    let seeds: Vec<ParticipantSeed> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse participants file {}", path.display()))?;

    let count = seeds.len();
    for seed in seeds {
        state.register_participant(seed.into_participant(state))?;
    }

    Ok(count)
}

/// Check a freshly built state and exit with the matching status code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = AppState::new(config)?;
    app_state.set_running(true).await;

    match HealthCheck::check(&app_state).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            for check in &health.checks {
                println!(
                    "  {}: {}{}",
                    check.name,
                    check.status,
                    check
                        .message
                        .as_deref()
                        .map(|m| format!(" ({})", m))
                        .unwrap_or_default()
                );
            }

            // An empty pool only degrades ranked play; the process itself is fine
            if health.status == HealthStatus::Unhealthy {
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log a one-line health summary every 30 seconds
async fn health_check_task(app_state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while app_state.is_running().await {
        interval.tick().await;

        match HealthCheck::check(&app_state).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} participants, {} battles ({} today)",
                    health.status,
                    health.stats.participants,
                    health.stats.battles_total,
                    health.stats.battles_today
                );
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

fn display_startup_banner(config: &AppConfig) {
    info!("⚔️  Battle Room Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Battle API: {}:{}",
        config.service.http_host, config.service.http_port
    );
    info!("   Metrics port: {}", config.service.metrics_port);
    info!("   K-factor: {}", config.rating.k_factor);
    info!("   Ranked band: ±{}", config.matchmaking.rating_band);
    match config.matchmaking.rng_seed {
        Some(seed) => info!("   Matchmaking seed: {}", seed),
        None => info!("   Matchmaking seed: entropy"),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(metrics_port) = args.metrics_port {
        config.service.metrics_port = metrics_port;
    }

    if let Some(seed) = args.seed {
        config.matchmaking.rng_seed = Some(seed);
    }

    battle_room::config::validate_config(&config)?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut service = match BattleService::new(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.participants {
        match load_participants(service.state(), path) {
            Ok(count) => info!("Loaded {} participants from {}", count, path.display()),
            Err(e) => {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Starting service...");
    if let Err(e) = service.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let health_task = tokio::spawn(health_check_task(service.state().clone()));

    info!("✅ Battle Room is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    health_task.abort();

    match tokio::time::timeout(config.shutdown_timeout(), service.shutdown()).await {
        Ok(Ok(())) => info!("✅ Graceful shutdown completed successfully"),
        Ok(Err(e)) => warn!("Shutdown finished with errors: {}", e),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, forcing exit"),
    }

    info!("🛑 Battle Room stopped");
    Ok(())
}
