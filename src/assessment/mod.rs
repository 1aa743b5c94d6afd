//! Assessment orchestration
//!
//! Ties the rating system loader, the matchmaking strategy and the
//! persistence ports together for one assessment.

pub mod engine;

// Re-export commonly used types
pub use engine::{AssessmentEngine, AssessmentPorts, AssessmentStats, AttemptResult};
