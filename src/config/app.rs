//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! battle-room service, including environment variable loading, TOML file
//! loading and validation.

use crate::config::{LedgerConfig, MatchmakingConfig, RatingConfig};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub matchmaking: MatchmakingConfig,
    pub ledger: LedgerConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the battle API binds to
    pub http_host: String,
    /// Port for the battle API
    pub http_port: u16,
    /// Port for health and Prometheus endpoints
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "battle-room".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            metrics_port: 9090,
            shutdown_timeout_seconds: 30,
        }
    }
}

/// Read and parse an environment variable, `None` when it is unset
fn env_value<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            config.service.http_host = host;
        }
        if let Some(port) = env_value("HTTP_PORT")? {
            config.service.http_port = port;
        }
        if let Some(port) = env_value("METRICS_PORT")? {
            config.service.metrics_port = port;
        }
        if let Some(timeout) = env_value("SHUTDOWN_TIMEOUT_SECONDS")? {
            config.service.shutdown_timeout_seconds = timeout;
        }

        // Rating settings
        if let Some(k_factor) = env_value("K_FACTOR")? {
            config.rating.k_factor = k_factor;
        }
        if let Some(initial) = env_value("INITIAL_RATING")? {
            config.rating.initial_rating = initial;
        }

        // Matchmaking settings
        if let Some(band) = env_value("RATING_BAND")? {
            config.matchmaking.rating_band = band;
        }
        if let Some(jitter) = env_value("PRACTICE_RATING_JITTER")? {
            config.matchmaking.practice_rating_jitter = jitter;
        }
        if let Some(limit) = env_value("CANDIDATE_LIMIT")? {
            config.matchmaking.candidate_limit = limit;
        }
        if let Some(seed) = env_value("MATCHMAKING_SEED")? {
            config.matchmaking.rng_seed = Some(seed);
        }

        // Ledger settings
        if let Some(limit) = env_value("LEADERBOARD_LIMIT")? {
            config.ledger.default_leaderboard_limit = limit;
        }
        if let Some(min_rating) = env_value("LEADERBOARD_MIN_RATING")? {
            config.ledger.leaderboard_min_rating = min_rating;
        }
        if let Some(interval) = env_value("RECONCILE_INTERVAL_SECONDS")? {
            config.ledger.reconcile_interval_seconds = interval;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.metrics_port == 0 {
        return Err(anyhow!("Metrics port cannot be 0"));
    }

    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    config.rating.validate()?;
    config.matchmaking.validate()?;

    if config.ledger.default_leaderboard_limit == 0 {
        return Err(anyhow!("Leaderboard limit must be greater than 0"));
    }

    Ok(())
}
