//! Quiz Matchmaker - adaptive question selection for assessments
//!
//! This crate rates learners and questions on a shared Elo scale, picks
//! questions a learner is likely but not certain to answer correctly, and lets
//! each assessment choose and configure its rating system at runtime.

pub mod assessment;
pub mod config;
pub mod error;
pub mod learner;
pub mod matchmaking;
pub mod metrics;
pub mod question;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{QuizError, Result};
pub use types::*;

// Re-export key components
pub use assessment::{AssessmentEngine, AssessmentPorts, AttemptResult};
pub use matchmaking::{MatchmakingStrategy, MatchmakingStrategyRegistry, NClosestSelector};
pub use rating::{RatingSystem, RatingSystemLoader, RatingSystemRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
