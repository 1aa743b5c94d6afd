//! Rating system trait
//!
//! This module defines the interface every rating system implements: it turns
//! a judged attempt into new learner and question ratings and exposes its
//! configuration as a [`ConfigDocument`].

use crate::config::{ConfigDocument, ConfigurationForm};
use crate::types::Outcome;
use serde::{Deserialize, Serialize};

/// New ratings after one judged attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub learner_rating: f64,
    pub question_rating: f64,
}

impl RatingUpdate {
    /// Change applied to the learner's rating
    pub fn learner_delta(&self, old_learner_rating: f64) -> f64 {
        self.learner_rating - old_learner_rating
    }

    /// Change applied to the question's rating
    pub fn question_delta(&self, old_question_rating: f64) -> f64 {
        self.question_rating - old_question_rating
    }
}

/// Trait for rating systems selectable per assessment
pub trait RatingSystem: Send + Sync + std::fmt::Debug {
    /// Name the system is registered under
    fn name(&self) -> &'static str;

    /// Adopt the recognized keys of the given configuration.
    ///
    /// Unknown keys are ignored and missing keys keep their current value.
    fn configure(&mut self, config: &ConfigDocument);

    /// Current configuration, or `None` if the system was never configured
    fn configuration(&self) -> Option<ConfigDocument>;

    /// Configuration used when an administrator first selects this system
    fn default_configuration(&self) -> ConfigDocument;

    /// Compute new ratings for a learner and a question after one attempt.
    ///
    /// Must be pure: identical inputs always give identical results.
    fn update_ratings(
        &self,
        learner_rating: f64,
        question_rating: f64,
        outcome: Outcome,
    ) -> RatingUpdate;

    /// New ratings for two questions when `winner` proved harder than `loser`
    ///
    /// # Returns
    /// `(new_winner_rating, new_loser_rating)`
    fn question_victory_ratings(&self, winner_rating: f64, loser_rating: f64) -> (f64, f64);

    /// Editable form for the given configuration
    fn configuration_form(&self, config: &ConfigDocument, target_url: &str) -> ConfigurationForm;
}
