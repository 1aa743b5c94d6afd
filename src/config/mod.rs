//! Configuration management for the quiz-matchmaker
//!
//! This module handles application settings loaded from the environment or a
//! TOML file, the per-assessment configuration documents persisted for rating
//! systems and matchmaking strategies, and their administrative forms.

pub mod app;
pub mod document;
pub mod form;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, LevelSettings, MatchmakingSettings, RatingSettings,
    ServiceSettings,
};
pub use document::{ConfigDocument, ConfigValue};
pub use form::{ConfigurationForm, FieldKind, FormField};
