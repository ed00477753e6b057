//! Health check endpoints and monitoring
//!
//! Readiness and liveness probes for the battle service, plus the detailed
//! component report served on `/health`.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Value exported on the `battle_room_health_status` gauge
    pub fn as_gauge(self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    fn worst(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub participants: usize,
    pub active_participants: usize,
    pub battles_total: usize,
    pub battles_today: usize,
    pub ranked_battles: usize,
    pub quick_battles: usize,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let checks = vec![
            Self::check_service_running(app_state).await,
            Self::check_participant_storage(app_state),
            Self::check_result_storage(app_state),
            Self::check_matchmaker(app_state),
        ];

        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |overall, check| overall.worst(check.status));

        let stats = Self::gather_service_stats(app_state);

        Ok(HealthCheck {
            status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: &AppState) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: &AppState) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_participant_storage(app_state)
            .status
            .worst(Self::check_result_storage(app_state).status)
            .worst(Self::check_matchmaker(app_state).status))
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_participant_storage(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.participants().get_participant_count() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Participant storage check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot read participants: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "participant_storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Ranked matchmaking needs at least two active participants
    fn check_matchmaker(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.participants().get_all_participants() {
            Ok(participants) => {
                let active = participants.iter().filter(|p| p.is_active).count();
                if active < 2 {
                    (
                        HealthStatus::Degraded,
                        Some(format!(
                            "{} active participants, ranked matches cannot be made",
                            active
                        )),
                    )
                } else {
                    (HealthStatus::Healthy, None)
                }
            }
            Err(e) => (
                HealthStatus::Unhealthy,
                Some(format!("Cannot read matchmaking pool: {}", e)),
            ),
        };

        ComponentCheck {
            name: "matchmaker".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_result_storage(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.results().result_count() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Result storage check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot read battle results: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "result_storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let mut stats = ServiceStats::default();

        match app_state.participants().get_all_participants() {
            Ok(participants) => {
                stats.participants = participants.len();
                stats.active_participants = participants.iter().filter(|p| p.is_active).count();
            }
            Err(e) => debug!("Failed to read participants for health check: {}", e),
        }

        match app_state.stats() {
            Ok(battles) => {
                stats.battles_total = battles.total;
                stats.battles_today = battles.today;
                stats.ranked_battles = battles.by_mode.ranked;
                stats.quick_battles = battles.by_mode.quick;
            }
            Err(e) => debug!("Failed to get battle stats for health check: {}", e),
        }

        stats
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
