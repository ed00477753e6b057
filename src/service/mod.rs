//! Service layer for the battle service
//!
//! Shared application state, process lifecycle and health reporting.

pub mod app;
pub mod health;

pub use app::{AppState, BattleService, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
