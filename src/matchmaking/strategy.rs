//! Matchmaking strategy trait
//!
//! A strategy picks the next question for a learner from a question list.

use crate::config::{ConfigDocument, ConfigurationForm};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::question::QuestionPool;
use crate::types::{LearnerRating, QuestionId, QuestionList, QuestionRating};
use std::collections::HashSet;
use std::sync::Arc;

/// Trait for question selection algorithms
pub trait MatchmakingStrategy: Send + Sync + std::fmt::Debug {
    /// Name the strategy is registered under
    fn name(&self) -> &'static str;

    /// Adopt the recognized, valid keys of the given configuration
    fn configure(&mut self, config: &ConfigDocument);

    /// Report selections to the given collector. Strategies without
    /// selection metrics ignore it.
    fn attach_metrics(&mut self, _metrics: Arc<MetricsCollector>) {}

    /// Current configuration
    fn configuration(&self) -> Option<ConfigDocument>;

    /// Configuration used when the strategy is first selected
    fn default_configuration(&self) -> ConfigDocument;

    /// Choose the next question for a learner
    ///
    /// # Arguments
    /// * `learner` - The learner and their current rating
    /// * `question_list` - The list to pick from
    /// * `excluded` - Questions the learner cannot take right now
    /// * `pool` - Source of question ratings
    ///
    /// # Returns
    /// `Ok(None)` when no question is available; this is not an error.
    fn next_question_for_user(
        &self,
        learner: &LearnerRating,
        question_list: &QuestionList,
        excluded: &HashSet<QuestionId>,
        pool: &dyn QuestionPool,
    ) -> Result<Option<QuestionRating>>;

    /// Editable form for the given configuration
    fn configuration_form(&self, config: &ConfigDocument, target_url: &str) -> ConfigurationForm;
}
