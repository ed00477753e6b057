//! Configuration management for the battle-room service
//!
//! This module handles configuration loading from environment variables or a
//! TOML file, validation, and default values for the battle service.

pub mod app;
pub mod ledger;
pub mod matchmaking;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use ledger::LedgerConfig;
pub use matchmaking::MatchmakingConfig;
pub use rating::RatingConfig;
