//! Error types for the question matchmaking crate
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Domain failures are raised as [`QuizError`] values and
//! travel inside `anyhow::Error`, so callers can downcast when they need the kind.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific assessment scenarios
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Unknown rating system: {name}")]
    UnknownRatingSystem { name: String },

    #[error("Unknown matchmaking strategy: {name}")]
    UnknownMatchmakingStrategy { name: String },

    #[error("Configuration could not be deserialized: {reason}")]
    ConfigurationDeserializationFailure { reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("No rating system selected for assessment {assessment_id}")]
    NoRatingSystemSelected { assessment_id: u64 },

    #[error("Persistence failure during {operation}: {message}")]
    PersistenceFailure { operation: String, message: String },

    #[error("Question not found: {question_id}")]
    QuestionNotFound { question_id: u64 },

    #[error("Question {question_id} cannot be compared with itself")]
    SameQuestionPair { question_id: u64 },

    #[error("Invalid level ratings: {reason}")]
    InvalidLevelRatings { reason: String },
}

impl QuizError {
    /// Shorthand for a persistence failure on the named operation
    pub fn persistence(operation: &str, message: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
