//! Main application state and service coordination
//!
//! [`AppState`] holds the shared battle components and is cloned into every
//! request handler. [`BattleService`] owns the process lifecycle: the battle
//! API server, the health/metrics server and the background tasks.

use crate::api;
use crate::config::AppConfig;
use crate::error::{BattleError, Result as RoomResult};
use crate::ledger::{
    BattleResultLedger, BattleResultStorage, InMemoryBattleResultStorage, ReconciliationReport,
    SubmissionOutcome,
};
use crate::matchmaking::Matchmaker;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::rating::{
    EloRatingCalculator, InMemoryParticipantStorage, ParticipantStorage, RatingCalculator,
};
use crate::types::{
    BattleResult, BattleStats, Leaderboard, LeaderboardPeriod, MatchAssignment, Participant,
    ParticipantId, ResultSubmission,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Shared battle components
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    participants: Arc<dyn ParticipantStorage>,
    results: Arc<dyn BattleResultStorage>,
    rating_calculator: Arc<dyn RatingCalculator>,
    matchmaker: Arc<Matchmaker>,
    ledger: Arc<BattleResultLedger>,
    metrics: Arc<MetricsCollector>,
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Wire the battle components over in-memory storage
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_storage(
            config,
            Arc::new(InMemoryParticipantStorage::new()),
            Arc::new(InMemoryBattleResultStorage::new()),
        )
    }

    /// Wire the battle components over the given storage
    pub fn with_storage(
        config: AppConfig,
        participants: Arc<dyn ParticipantStorage>,
        results: Arc<dyn BattleResultStorage>,
    ) -> Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let rating_calculator: Arc<dyn RatingCalculator> = Arc::new(
            EloRatingCalculator::new(config.rating.clone()).map_err(|e| {
                ServiceError::Initialization {
                    message: format!("Failed to initialize rating calculator: {}", e),
                }
            })?,
        );

        let matchmaker = Arc::new(
            Matchmaker::new(config.matchmaking.clone(), rating_calculator.clone())
                .with_metrics(metrics.clone()),
        );

        let ledger = Arc::new(
            BattleResultLedger::new(
                config.ledger.clone(),
                participants.clone(),
                results.clone(),
                rating_calculator.clone(),
            )
            .with_metrics(metrics.clone()),
        );

        info!(
            "Battle components ready: rating={}, rating_band={}, seeded={}",
            rating_calculator.config(),
            config.matchmaking.rating_band,
            config.matchmaking.rng_seed.is_some()
        );

        Ok(Self {
            config: Arc::new(config),
            participants,
            results,
            rating_calculator,
            matchmaker,
            ledger,
            metrics,
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn participants(&self) -> Arc<dyn ParticipantStorage> {
        self.participants.clone()
    }

    pub fn results(&self) -> Arc<dyn BattleResultStorage> {
        self.results.clone()
    }

    pub fn matchmaker(&self) -> Arc<Matchmaker> {
        self.matchmaker.clone()
    }

    pub fn ledger(&self) -> Arc<BattleResultLedger> {
        self.ledger.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }

    /// A fresh participant at the configured initial rating
    pub fn new_participant(&self, id: ParticipantId, username: impl Into<String>) -> Participant {
        Participant::new(id, username).with_rating(self.rating_calculator.initial_rating())
    }

    /// Add or replace a participant record
    pub fn register_participant(&self, participant: Participant) -> RoomResult<()> {
        debug!(
            "Registering participant {} ({}) at rating {}",
            participant.id, participant.username, participant.rating
        );
        self.participants.store_participant(participant)
    }

    fn require_participant(&self, participant_id: ParticipantId) -> RoomResult<Participant> {
        self.participants
            .get_participant(participant_id)?
            .ok_or_else(|| BattleError::ParticipantNotFound { participant_id }.into())
    }

    /// Practice battle for a known participant
    pub fn quick_match(&self, participant_id: ParticipantId) -> RoomResult<MatchAssignment> {
        let requester = self.require_participant(participant_id)?;
        Ok(self.matchmaker.quick_match(&requester))
    }

    /// Ranked battle against an active participant inside the rating band
    pub fn ranked_match(&self, participant_id: ParticipantId) -> RoomResult<MatchAssignment> {
        let requester = self.require_participant(participant_id)?;
        let band = self.config.matchmaking.rating_band;

        let pool = self.participants.get_participants_by_rating_range(
            requester.rating.saturating_sub(band),
            requester.rating.saturating_add(band),
            None,
        )?;

        self.matchmaker.ranked_match(&requester, &pool)
    }

    pub fn submit_result(&self, submission: ResultSubmission) -> RoomResult<SubmissionOutcome> {
        self.ledger.submit_result(submission)
    }

    pub fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: Option<usize>,
        requester: Option<ParticipantId>,
    ) -> RoomResult<Leaderboard> {
        self.ledger.leaderboard(period, limit, requester)
    }

    pub fn history(
        &self,
        participant_id: ParticipantId,
        limit: Option<usize>,
    ) -> RoomResult<Vec<BattleResult>> {
        self.ledger.history(participant_id, limit)
    }

    pub fn stats(&self) -> RoomResult<BattleStats> {
        self.ledger.stats()
    }

    pub fn reconcile(&self) -> RoomResult<ReconciliationReport> {
        self.ledger.reconcile_battles()
    }

    /// Push the current participant snapshot into the metrics gauges
    pub fn refresh_participant_metrics(&self) -> RoomResult<usize> {
        let participants = self.participants.get_all_participants()?;
        self.metrics.update_participants(&participants);
        Ok(participants.len())
    }
}

/// Owns the running service: servers and background tasks
pub struct BattleService {
    state: AppState,
    metrics_service: Arc<MetricsService>,
    api_shutdown: broadcast::Sender<()>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl BattleService {
    /// Initialize the service with in-memory storage
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing battle-room service");
        let state = AppState::new(config)?;
        Ok(Self::from_state(state))
    }

    /// Initialize the service around existing components
    pub fn from_state(state: AppState) -> Self {
        let health_config = HealthServerConfig {
            port: state.config().service.metrics_port,
            host: state.config().service.http_host.clone(),
        };
        let health_server = Arc::new(
            HealthServer::new(health_config, state.metrics()).with_app_state(state.clone()),
        );
        let metrics_service = Arc::new(MetricsService::new(state.metrics(), health_server));
        let (api_shutdown, _) = broadcast::channel(1);

        Self {
            state,
            metrics_service,
            api_shutdown,
            background_tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Start servers and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting battle-room service");

        self.state.set_running(true).await;

        self.start_metrics_service().await?;
        self.start_api_server().await?;
        self.start_background_tasks();

        info!("✅ Battle-room service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of battle-room service");

        self.state.set_running(false).await;

        if self.api_shutdown.send(()).is_err() {
            debug!("Battle API server was not running");
        }

        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        } else {
            info!("✅ Metrics service stopped");
        }

        self.stop_background_tasks().await;

        let stats = self
            .state
            .stats()
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;
        info!(
            "Final battle statistics: total={}, ranked={}, quick={}",
            stats.total, stats.by_mode.ranked, stats.by_mode.quick
        );
        info!("✅ Battle-room service shutdown completed");

        Ok(())
    }

    async fn start_metrics_service(&mut self) -> Result<(), ServiceError> {
        let metrics_service = self.metrics_service.clone();
        let port = self.state.config().service.metrics_port;

        let handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });
        self.background_tasks.push(handle);

        // Give the server a moment to bind
        tokio::time::sleep(Duration::from_millis(100)).await;

        info!("✅ Metrics and health endpoints on port {}", port);
        Ok(())
    }

    async fn start_api_server(&mut self) -> Result<(), ServiceError> {
        let service = &self.state.config().service;
        let addr: SocketAddr = format!("{}:{}", service.http_host, service.http_port)
            .parse()
            .map_err(|e| ServiceError::Configuration {
                message: format!("Invalid battle API address: {}", e),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind battle API on {}: {}", addr, e),
            })?;

        let app = api::router(self.state.clone());
        let mut shutdown_rx = self.api_shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("Battle API shutdown signal received");
                })
                .await;

            match result {
                Ok(()) => info!("Battle API server stopped"),
                Err(e) => error!("Battle API server failed: {}", e),
            }
        });
        self.background_tasks.push(handle);

        info!("✅ Battle API listening on http://{}", addr);
        Ok(())
    }

    fn start_background_tasks(&mut self) {
        let health_metrics_task = {
            let state = self.state.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                let start_time = tokio::time::Instant::now();

                while state.is_running().await {
                    interval.tick().await;

                    let metrics = state.metrics();
                    metrics
                        .service()
                        .uptime_seconds
                        .set(start_time.elapsed().as_secs() as i64);

                    match crate::service::health::HealthCheck::check(&state).await {
                        Ok(health) => {
                            metrics.update_health_status(health.status.as_gauge());
                            for check in &health.checks {
                                metrics.update_component_health(
                                    &check.name,
                                    check.status != crate::service::HealthStatus::Unhealthy,
                                );
                            }
                        }
                        Err(e) => warn!("Health metrics update failed: {}", e),
                    }
                }

                info!("Health metrics task stopped");
            })
        };
        self.background_tasks.push(health_metrics_task);

        let participant_metrics_task = {
            let state = self.state.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));

                while state.is_running().await {
                    interval.tick().await;

                    match state.refresh_participant_metrics() {
                        Ok(count) => debug!("Participant metrics refreshed: {} participants", count),
                        Err(e) => warn!("Failed to refresh participant metrics: {}", e),
                    }
                }

                info!("Participant metrics task stopped");
            })
        };
        self.background_tasks.push(participant_metrics_task);

        match self.state.config().ledger.reconcile_interval() {
            Some(period) => {
                info!("Starting reconciliation task ({}s interval)", period.as_secs());
                let state = self.state.clone();

                let reconcile_task = tokio::spawn(async move {
                    let mut interval = tokio::time::interval(period);

                    while state.is_running().await {
                        interval.tick().await;

                        match state.reconcile() {
                            Ok(report) if !report.is_clean() => warn!(
                                "Reconciliation found {} mismatched ranked battles",
                                report.mismatches.len()
                            ),
                            Ok(_) => {}
                            Err(e) => warn!("Reconciliation failed: {}", e),
                        }
                    }

                    info!("Reconciliation task stopped");
                });
                self.background_tasks.push(reconcile_task);
            }
            None => info!("Reconciliation disabled - skipping reconciliation task"),
        }

        info!("{} background tasks running", self.background_tasks.len());
    }

    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        // Servers have been signalled already; give them a moment to drain
        tokio::time::sleep(Duration::from_millis(200)).await;

        for task in self.background_tasks.drain(..) {
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
