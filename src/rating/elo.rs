//! Elo rating system implementation
//!
//! This module provides the concrete rating system used by assessments,
//! built on the Elo functions of the skillratings crate. Learners and
//! questions are updated with independent K-factors.

use crate::config::{ConfigDocument, ConfigurationForm, FieldKind};
use crate::rating::system::{RatingSystem, RatingUpdate};
use crate::types::Outcome;
use serde::{Deserialize, Serialize};
use skillratings::elo::{elo, EloConfig, EloRating};
use skillratings::Outcomes;
use tracing::warn;

/// Name the Elo system is registered under
pub const ELO_RATING_SYSTEM: &str = "elo";

const STUDENT_K_FACTOR: &str = "student_k_factor";
const QUESTION_K_FACTOR: &str = "question_k_factor";

/// Probability that `own` beats `opponent` under the logistic Elo model
pub fn expected_score(own_rating: f64, opponent_rating: f64) -> f64 {
    let (expected, _) = skillratings::elo::expected_score(
        &EloRating { rating: own_rating },
        &EloRating {
            rating: opponent_rating,
        },
    );
    expected
}

/// Typed configuration of the Elo rating system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloSystemConfig {
    /// Sensitivity of learner ratings
    pub student_k_factor: f64,
    /// Sensitivity of question ratings
    pub question_k_factor: f64,
}

impl Default for EloSystemConfig {
    fn default() -> Self {
        Self {
            student_k_factor: 32.0,
            question_k_factor: 8.0,
        }
    }
}

impl EloSystemConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.student_k_factor.is_finite() && self.student_k_factor > 0.0) {
            return Err(crate::error::QuizError::InvalidConfiguration {
                message: "Student K-factor must be positive".to_string(),
            }
            .into());
        }

        if !(self.question_k_factor.is_finite() && self.question_k_factor > 0.0) {
            return Err(crate::error::QuizError::InvalidConfiguration {
                message: "Question K-factor must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Overlay the recognized keys of a document onto this configuration.
    ///
    /// Invalid values are skipped with a warning.
    pub fn merged_with(&self, document: &ConfigDocument) -> Self {
        let mut merged = *self;

        if let Some(k) = document.get_f64(STUDENT_K_FACTOR) {
            let candidate = Self {
                student_k_factor: k,
                ..merged
            };
            match candidate.validate() {
                Ok(()) => merged = candidate,
                Err(e) => warn!("Ignoring {}={}: {}", STUDENT_K_FACTOR, k, e),
            }
        }

        if let Some(k) = document.get_f64(QUESTION_K_FACTOR) {
            let candidate = Self {
                question_k_factor: k,
                ..merged
            };
            match candidate.validate() {
                Ok(()) => merged = candidate,
                Err(e) => warn!("Ignoring {}={}: {}", QUESTION_K_FACTOR, k, e),
            }
        }

        merged
    }

    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument::new()
            .with(STUDENT_K_FACTOR, self.student_k_factor)
            .with(QUESTION_K_FACTOR, self.question_k_factor)
    }
}

/// Elo rating system
#[derive(Debug, Clone, Default)]
pub struct EloRatingSystem {
    config: EloSystemConfig,
    configured: bool,
}

impl EloRatingSystem {
    /// Create an unconfigured system running on its built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a system with an explicit configuration
    pub fn with_config(config: EloSystemConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            configured: true,
        })
    }

    /// Configuration currently in effect, defaults included
    pub fn effective_config(&self) -> EloSystemConfig {
        self.config
    }

    fn rate(&self, one: f64, two: f64, outcome: Outcomes, k: f64) -> (f64, f64) {
        let (one, two) = elo(
            &EloRating { rating: one },
            &EloRating { rating: two },
            &outcome,
            &EloConfig { k },
        );
        (one.rating, two.rating)
    }
}

impl RatingSystem for EloRatingSystem {
    fn name(&self) -> &'static str {
        ELO_RATING_SYSTEM
    }

    fn configure(&mut self, config: &ConfigDocument) {
        self.config = self.config.merged_with(config);
        self.configured = true;
    }

    fn configuration(&self) -> Option<ConfigDocument> {
        self.configured.then(|| self.config.to_document())
    }

    fn default_configuration(&self) -> ConfigDocument {
        EloSystemConfig::default().to_document()
    }

    fn update_ratings(
        &self,
        learner_rating: f64,
        question_rating: f64,
        outcome: Outcome,
    ) -> RatingUpdate {
        let outcome = outcome.as_learner_outcome();

        // Same match, scored twice: each side moves by its own K-factor
        let (learner_rating_new, _) = self.rate(
            learner_rating,
            question_rating,
            outcome,
            self.config.student_k_factor,
        );
        let (_, question_rating_new) = self.rate(
            learner_rating,
            question_rating,
            outcome,
            self.config.question_k_factor,
        );

        RatingUpdate {
            learner_rating: learner_rating_new,
            question_rating: question_rating_new,
        }
    }

    fn question_victory_ratings(&self, winner_rating: f64, loser_rating: f64) -> (f64, f64) {
        self.rate(
            winner_rating,
            loser_rating,
            Outcomes::WIN,
            self.config.question_k_factor,
        )
    }

    fn configuration_form(&self, config: &ConfigDocument, target_url: &str) -> ConfigurationForm {
        ConfigurationForm::new(target_url)
            .field(
                STUDENT_K_FACTOR,
                "Student K-factor",
                FieldKind::Number,
                config,
            )
            .field(
                QUESTION_K_FACTOR,
                "Question K-factor",
                FieldKind::Number,
                config,
            )
    }
}
