//! N-closest question selection
//!
//! Computes the question rating at which the learner's expected win
//! probability equals a configured target, keeps the N questions closest to
//! it and picks one of them uniformly at random. The random pick keeps a
//! learner at a stable rating from seeing the same question over and over.

use crate::config::{ConfigDocument, ConfigurationForm, FieldKind};
use crate::error::{QuizError, Result};
use crate::matchmaking::strategy::MatchmakingStrategy;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::question::QuestionPool;
use crate::types::{LearnerRating, QuestionId, QuestionList, QuestionRating};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name the selector is registered under
pub const N_CLOSEST_STRATEGY: &str = "n_closest";

const USER_WIN_PROBABILITY: &str = "user_win_probability";
const NUMBER_OF_QUESTIONS_TO_SELECT: &str = "number_of_questions_to_select";

/// Question rating at which a learner's expected win probability is `p`.
///
/// Inverse of the logistic Elo expected score.
pub fn ideal_question_rating(learner_rating: f64, user_win_probability: f64) -> f64 {
    400.0 * (1.0 / user_win_probability - 1.0).log10() + learner_rating
}

/// Configuration for the N-closest selector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NClosestConfig {
    /// Target probability that the learner answers correctly, in (0, 1)
    pub user_win_probability: f64,
    /// Size of the candidate set, at least 1
    pub number_of_questions_to_select: u32,
}

impl Default for NClosestConfig {
    fn default() -> Self {
        Self {
            user_win_probability: 0.75,
            number_of_questions_to_select: 10,
        }
    }
}

impl NClosestConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let p = self.user_win_probability;
        if !(p > 0.0 && p < 1.0) {
            return Err(QuizError::InvalidConfiguration {
                message: format!("User win probability must be in (0, 1), got {}", p),
            }
            .into());
        }

        if self.number_of_questions_to_select == 0 {
            return Err(QuizError::InvalidConfiguration {
                message: "Number of questions to select must be positive".to_string(),
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

        if let Some(p) = document.get_f64(USER_WIN_PROBABILITY) {
            let candidate = Self {
                user_win_probability: p,
                ..merged
            };
            match candidate.validate() {
                Ok(()) => merged = candidate,
                Err(e) => warn!("Ignoring {}={}: {}", USER_WIN_PROBABILITY, p, e),
            }
        }

        if document.contains_key(NUMBER_OF_QUESTIONS_TO_SELECT) {
            match document.get_u32(NUMBER_OF_QUESTIONS_TO_SELECT).filter(|n| *n > 0) {
                Some(n) => merged.number_of_questions_to_select = n,
                None => warn!(
                    "Ignoring {}: expected a positive integer",
                    NUMBER_OF_QUESTIONS_TO_SELECT
                ),
            }
        }

        merged
    }

    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument::new()
            .with(USER_WIN_PROBABILITY, self.user_win_probability)
            .with(NUMBER_OF_QUESTIONS_TO_SELECT, self.number_of_questions_to_select)
    }
}

/// Picks uniformly among the N questions closest to the ideal rating
#[derive(Clone, Default)]
pub struct NClosestSelector {
    config: NClosestConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl std::fmt::Debug for NClosestSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NClosestSelector")
            .field("config", &self.config)
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl NClosestSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NClosestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: None,
        })
    }

    pub fn config(&self) -> &NClosestConfig {
        &self.config
    }

    /// Ideal question rating for the learner under the current configuration
    pub fn ideal_question_rating(&self, learner: &LearnerRating) -> f64 {
        ideal_question_rating(learner.rating, self.config.user_win_probability)
    }

    /// The candidate set the random pick is drawn from, closest first
    pub fn candidate_questions(
        &self,
        learner: &LearnerRating,
        question_list: &QuestionList,
        excluded: &HashSet<QuestionId>,
        pool: &dyn QuestionPool,
    ) -> Result<Vec<QuestionRating>> {
        let ideal = self.ideal_question_rating(learner);
        let candidates = pool.closest_questions(
            question_list.id,
            ideal,
            self.config.number_of_questions_to_select as usize,
            excluded,
        )?;

        debug!(
            "Learner {} (rating {:.1}): ideal question rating {:.2}, {} candidates",
            learner.user_id,
            learner.rating,
            ideal,
            candidates.len()
        );

        Ok(candidates)
    }

    /// Select the next question using the given random number generator
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        learner: &LearnerRating,
        question_list: &QuestionList,
        excluded: &HashSet<QuestionId>,
        pool: &dyn QuestionPool,
        rng: &mut R,
    ) -> Result<Option<QuestionRating>> {
        let timer = MetricsTimer::start();
        let mut candidates = self.candidate_questions(learner, question_list, excluded, pool)?;
        let candidate_count = candidates.len();

        let selected = if candidates.is_empty() {
            None
        } else {
            let index = rng.random_range(0..candidates.len());
            Some(candidates.swap_remove(index))
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_selection(selected.is_some(), candidate_count, timer.stop());
        }

        Ok(selected)
    }
}

impl MatchmakingStrategy for NClosestSelector {
    fn name(&self) -> &'static str {
        N_CLOSEST_STRATEGY
    }

    fn configure(&mut self, config: &ConfigDocument) {
        self.config = self.config.merged_with(config);
    }

    fn attach_metrics(&mut self, metrics: Arc<MetricsCollector>) {
        self.metrics = Some(metrics);
    }

    fn configuration(&self) -> Option<ConfigDocument> {
        Some(self.config.to_document())
    }

    fn default_configuration(&self) -> ConfigDocument {
        NClosestConfig::default().to_document()
    }

    fn next_question_for_user(
        &self,
        learner: &LearnerRating,
        question_list: &QuestionList,
        excluded: &HashSet<QuestionId>,
        pool: &dyn QuestionPool,
    ) -> Result<Option<QuestionRating>> {
        self.select_with_rng(learner, question_list, excluded, pool, &mut rand::rng())
    }

    fn configuration_form(&self, config: &ConfigDocument, target_url: &str) -> ConfigurationForm {
        ConfigurationForm::new(target_url)
            .field(
                USER_WIN_PROBABILITY,
                "User win probability",
                FieldKind::Number,
                config,
            )
            .field(
                NUMBER_OF_QUESTIONS_TO_SELECT,
                "Number of questions to select",
                FieldKind::Integer,
                config,
            )
    }
}
