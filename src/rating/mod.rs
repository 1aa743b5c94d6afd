//! Rating systems and per-assessment rating system selection
//!
//! This module provides the rating system interface, the Elo implementation
//! backed by the skillratings crate, the registry of available systems and
//! the loader that resolves an assessment's persisted selection.

pub mod elo;
pub mod loader;
pub mod registry;
pub mod storage;
pub mod system;

// Re-export commonly used types
pub use elo::{expected_score, EloRatingSystem, EloSystemConfig, ELO_RATING_SYSTEM};
pub use loader::RatingSystemLoader;
pub use registry::{RatingSystemFactory, RatingSystemRegistry};
pub use storage::{
    ConfigurationEntry, ConfigurationStore, InMemoryConfigurationStore, MockConfigurationStore,
};
pub use system::{RatingSystem, RatingUpdate};
