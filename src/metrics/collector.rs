//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the battle-room service:
//! matchmaking outcomes, ledger writes, rating movement and request timing.

use crate::types::{BattleMode, LeaderboardPeriod, Participant};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the battle service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Matchmaking metrics
    matchmaking_metrics: MatchmakingMetrics,

    /// Result ledger metrics
    ledger_metrics: LedgerMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// HTTP requests handled by the battle API
    pub http_requests_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Matchmaking metrics
#[derive(Clone)]
pub struct MatchmakingMetrics {
    /// Match requests by mode and outcome
    pub match_requests_total: IntCounterVec,

    /// Practice opponents generated
    pub practice_opponents_total: IntCounter,

    /// Eligible ranked candidates seen per request
    pub candidate_pool_size: Histogram,
}

/// Result ledger metrics
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Results recorded by mode and outcome
    pub results_recorded_total: IntCounterVec,

    /// Re-submissions answered from the stored row
    pub duplicate_submissions_total: IntCounter,

    /// Submissions rejected before any write
    pub rejected_submissions_total: IntCounterVec,

    /// Applied ranked rating changes
    pub rating_change: Histogram,

    /// Known participants
    pub participants: IntGauge,

    /// Current rating distribution
    pub rating_distribution: Histogram,

    /// Problems found by the last reconciliation sweep
    pub reconcile_mismatches: IntGauge,

    /// Reconciliation sweeps run
    pub reconcile_runs_total: IntCounter,

    /// Leaderboard queries by period
    pub leaderboard_queries_total: IntCounterVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time to produce a match assignment
    pub matchmaking_duration: HistogramVec,

    /// Time to record a submitted result
    pub submission_duration: Histogram,

    /// Time to compute a leaderboard page
    pub leaderboard_duration: Histogram,

    /// Battle API request durations
    pub http_request_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let matchmaking_metrics = MatchmakingMetrics::new(&registry)?;
        let ledger_metrics = LedgerMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            matchmaking_metrics,
            ledger_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn matchmaking(&self) -> &MatchmakingMetrics {
        &self.matchmaking_metrics
    }

    pub fn ledger(&self) -> &LedgerMetrics {
        &self.ledger_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a match request and how it ended
    pub fn record_match_request(&self, mode: BattleMode, matched: bool, duration: Duration) {
        let outcome = if matched { "matched" } else { "no_opponent" };

        self.matchmaking_metrics
            .match_requests_total
            .with_label_values(&[mode.as_str(), outcome])
            .inc();

        self.performance_metrics
            .matchmaking_duration
            .with_label_values(&[mode.as_str()])
            .observe(duration.as_secs_f64());
    }

    pub fn record_practice_opponent(&self) {
        self.matchmaking_metrics.practice_opponents_total.inc();
    }

    pub fn record_candidate_pool(&self, size: usize) {
        self.matchmaking_metrics
            .candidate_pool_size
            .observe(size as f64);
    }

    /// Record a newly stored result
    pub fn record_result(&self, mode: BattleMode, is_winner: bool, rating_change: i32) {
        let outcome = if is_winner { "win" } else { "loss" };

        self.ledger_metrics
            .results_recorded_total
            .with_label_values(&[mode.as_str(), outcome])
            .inc();

        if mode == BattleMode::Ranked {
            self.ledger_metrics
                .rating_change
                .observe(rating_change as f64);
        }
    }

    pub fn record_duplicate_submission(&self) {
        self.ledger_metrics.duplicate_submissions_total.inc();
    }

    /// Record a submission that failed validation or lookup
    pub fn record_rejected_submission(&self, reason: &str) {
        self.ledger_metrics
            .rejected_submissions_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_submission_duration(&self, duration: Duration) {
        self.performance_metrics
            .submission_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a leaderboard query
    pub fn record_leaderboard_query(&self, period: LeaderboardPeriod, duration: Duration) {
        self.ledger_metrics
            .leaderboard_queries_total
            .with_label_values(&[period.as_str()])
            .inc();

        self.performance_metrics
            .leaderboard_duration
            .observe(duration.as_secs_f64());
    }

    /// Record the outcome of a reconciliation sweep
    pub fn record_reconciliation(&self, problems: usize) {
        self.ledger_metrics.reconcile_runs_total.inc();
        self.ledger_metrics.reconcile_mismatches.set(problems as i64);
    }

    /// Refresh participant gauges from a full snapshot
    pub fn update_participants(&self, participants: &[Participant]) {
        self.ledger_metrics.participants.set(participants.len() as i64);

        for participant in participants {
            self.ledger_metrics
                .rating_distribution
                .observe(participant.rating as f64);
        }
    }

    /// Record one battle API request
    pub fn record_http_request(&self, route: &str, status: u16, duration: Duration) {
        let status = status.to_string();
        self.service_metrics
            .http_requests_total
            .with_label_values(&[route, status.as_str()])
            .inc();

        self.performance_metrics
            .http_request_duration
            .with_label_values(&[route])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("battle_room_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "battle_room_http_requests_total",
                "Battle API requests handled",
            ),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let health_status = IntGauge::new(
            "battle_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("battle_room_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            http_requests_total,
            health_status,
            component_health,
        })
    }
}

impl MatchmakingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_requests_total = IntCounterVec::new(
            Opts::new(
                "battle_room_match_requests_total",
                "Match requests by mode and outcome",
            ),
            &["mode", "outcome"],
        )?;
        registry.register(Box::new(match_requests_total.clone()))?;

        let practice_opponents_total = IntCounter::new(
            "battle_room_practice_opponents_total",
            "Practice opponents generated",
        )?;
        registry.register(Box::new(practice_opponents_total.clone()))?;

        let candidate_pool_size = Histogram::with_opts(
            HistogramOpts::new(
                "battle_room_candidate_pool_size",
                "Eligible ranked candidates per request",
            )
            .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )?;
        registry.register(Box::new(candidate_pool_size.clone()))?;

        Ok(Self {
            match_requests_total,
            practice_opponents_total,
            candidate_pool_size,
        })
    }
}

impl LedgerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let results_recorded_total = IntCounterVec::new(
            Opts::new(
                "battle_room_results_recorded_total",
                "Battle results recorded",
            ),
            &["mode", "outcome"],
        )?;
        registry.register(Box::new(results_recorded_total.clone()))?;

        let duplicate_submissions_total = IntCounter::new(
            "battle_room_duplicate_submissions_total",
            "Result submissions already recorded",
        )?;
        registry.register(Box::new(duplicate_submissions_total.clone()))?;

        let rejected_submissions_total = IntCounterVec::new(
            Opts::new(
                "battle_room_rejected_submissions_total",
                "Result submissions rejected",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_submissions_total.clone()))?;

        let rating_change = Histogram::with_opts(
            HistogramOpts::new(
                "battle_room_rating_change",
                "Applied ranked rating changes",
            )
            .buckets(vec![
                -50.0, -30.0, -16.0, -5.0, 0.0, 5.0, 16.0, 30.0, 50.0,
            ]),
        )?;
        registry.register(Box::new(rating_change.clone()))?;

        let participants =
            IntGauge::new("battle_room_participants", "Known participants")?;
        registry.register(Box::new(participants.clone()))?;

        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "battle_room_rating_distribution",
                "Participant rating distribution",
            )
            .buckets(vec![
                500.0, 1000.0, 1200.0, 1400.0, 1600.0, 1800.0, 2000.0, 2500.0,
            ]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        let reconcile_mismatches = IntGauge::new(
            "battle_room_reconcile_mismatches",
            "Problems found by the last reconciliation sweep",
        )?;
        registry.register(Box::new(reconcile_mismatches.clone()))?;

        let reconcile_runs_total = IntCounter::new(
            "battle_room_reconcile_runs_total",
            "Reconciliation sweeps run",
        )?;
        registry.register(Box::new(reconcile_runs_total.clone()))?;

        let leaderboard_queries_total = IntCounterVec::new(
            Opts::new(
                "battle_room_leaderboard_queries_total",
                "Leaderboard queries by period",
            ),
            &["period"],
        )?;
        registry.register(Box::new(leaderboard_queries_total.clone()))?;

        Ok(Self {
            results_recorded_total,
            duplicate_submissions_total,
            rejected_submissions_total,
            rating_change,
            participants,
            rating_distribution,
            reconcile_mismatches,
            reconcile_runs_total,
            leaderboard_queries_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matchmaking_duration = HistogramVec::new(
            HistogramOpts::new(
                "battle_room_matchmaking_duration_seconds",
                "Matchmaking time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["mode"],
        )?;
        registry.register(Box::new(matchmaking_duration.clone()))?;

        let submission_duration = Histogram::with_opts(
            HistogramOpts::new(
                "battle_room_submission_duration_seconds",
                "Result submission time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(submission_duration.clone()))?;

        let leaderboard_duration = Histogram::with_opts(
            HistogramOpts::new(
                "battle_room_leaderboard_duration_seconds",
                "Leaderboard computation time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(leaderboard_duration.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "battle_room_http_request_duration_seconds",
                "Battle API request duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["route"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            matchmaking_duration,
            submission_duration,
            leaderboard_duration,
            http_request_duration,
        })
    }
}
