//! Assessment engine
//!
//! Drives one adaptive assessment: picks questions for learners and turns
//! judged attempts into rating updates. The rating system is resolved through
//! a fresh [`RatingSystemLoader`] for every outcome, so an administrator's
//! change applies to the next attempt without a restart.

use crate::config::{AppConfig, ConfigDocument};
use crate::error::{QuizError, Result};
use crate::learner::LearnerStore;
use crate::matchmaking::{MatchmakingStrategy, MatchmakingStrategyRegistry};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::question::QuestionPool;
use crate::rating::{
    ConfigurationStore, RatingSystem, RatingSystemLoader, RatingSystemRegistry, RatingUpdate,
};
use crate::types::{
    AssessmentId, AttemptOutcome, LearnerRating, QuestionId, QuestionList, QuestionRating, UserId,
};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Persistence ports an engine works against
#[derive(Clone)]
pub struct AssessmentPorts {
    pub rating_systems: Arc<RatingSystemRegistry>,
    pub configuration_store: Arc<dyn ConfigurationStore>,
    pub question_pool: Arc<dyn QuestionPool>,
    pub learner_store: Arc<dyn LearnerStore>,
}

/// Statistics about engine operations
#[derive(Debug, Clone, Default)]
pub struct AssessmentStats {
    /// Questions handed out
    pub questions_selected: u64,
    /// Selections that found no available question
    pub empty_selections: u64,
    /// Judged attempts applied
    pub outcomes_recorded: u64,
    /// Learners reaching a new level
    pub level_ups: u64,
    /// Question-versus-question updates applied
    pub question_victories: u64,
}

/// Result of recording one judged attempt
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    /// Learner after the update
    pub learner: LearnerRating,
    pub question_id: QuestionId,
    pub previous_learner_rating: f64,
    pub previous_question_rating: f64,
    pub update: RatingUpdate,
    /// Level for the new learner rating
    pub level: u32,
    /// Whether the learner reached a new highest level
    pub leveled_up: bool,
}

impl AttemptResult {
    pub fn learner_delta(&self) -> f64 {
        self.update.learner_delta(self.previous_learner_rating)
    }

    pub fn question_delta(&self) -> f64 {
        self.update.question_delta(self.previous_question_rating)
    }
}

/// Orchestrates question selection and rating updates for one assessment
pub struct AssessmentEngine {
    assessment_id: AssessmentId,
    question_list: QuestionList,
    default_learner_rating: f64,
    ports: AssessmentPorts,
    strategy: Box<dyn MatchmakingStrategy>,
    stats: RwLock<AssessmentStats>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl std::fmt::Debug for AssessmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentEngine")
            .field("assessment_id", &self.assessment_id)
            .field("question_list", &self.question_list)
            .field("default_learner_rating", &self.default_learner_rating)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl AssessmentEngine {
    /// Create an engine with an explicit matchmaking strategy
    pub fn new(
        assessment_id: AssessmentId,
        question_list: QuestionList,
        ports: AssessmentPorts,
        strategy: Box<dyn MatchmakingStrategy>,
    ) -> Self {
        Self {
            assessment_id,
            question_list,
            default_learner_rating: 1200.0,
            ports,
            strategy,
            stats: RwLock::new(AssessmentStats::default()),
            metrics: None,
        }
    }

    /// Create an engine from application settings.
    ///
    /// The strategy, its parameters, the default learner rating and the level
    /// thresholds of the question list are taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        assessment_id: AssessmentId,
        mut question_list: QuestionList,
        ports: AssessmentPorts,
    ) -> Result<Self> {
        question_list.set_level_ratings(&config.levels.level_ratings)?;

        let strategy_config = ConfigDocument::new()
            .with("user_win_probability", config.matchmaking.user_win_probability)
            .with(
                "number_of_questions_to_select",
                config.matchmaking.number_of_questions_to_select,
            );
        let strategy = MatchmakingStrategyRegistry::new()
            .configured_strategy(&config.matchmaking.strategy, Some(&strategy_config))?;

        Ok(Self::new(assessment_id, question_list, ports, strategy)
            .with_default_learner_rating(config.rating.default_learner_rating))
    }

    pub fn with_default_learner_rating(mut self, rating: f64) -> Self {
        self.default_learner_rating = rating;
        self
    }

    /// Report selections, updates and store operations to the given collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.strategy.attach_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn assessment_id(&self) -> AssessmentId {
        self.assessment_id
    }

    pub fn question_list(&self) -> &QuestionList {
        &self.question_list
    }

    pub fn strategy(&self) -> &dyn MatchmakingStrategy {
        self.strategy.as_ref()
    }

    /// Snapshot of the engine statistics
    pub fn stats(&self) -> AssessmentStats {
        self.stats
            .read()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Load the assessment's current rating system selection
    pub fn rating_system_loader(&self) -> Result<RatingSystemLoader> {
        let loader = RatingSystemLoader::load(
            self.assessment_id,
            self.ports.rating_systems.clone(),
            self.ports.configuration_store.clone(),
        )?;

        Ok(match &self.metrics {
            Some(metrics) => loader.with_metrics(metrics.clone()),
            None => loader,
        })
    }

    /// Select the assessment's rating system, replacing any previous choice
    pub fn select_rating_system(&self, name: &str, configuration: Option<&ConfigDocument>) -> Result<()> {
        self.rating_system_loader()?
            .set_rating_system(name, configuration)
    }

    /// Reconfigure the selected rating system
    pub fn configure_rating_system(&self, candidate: &ConfigDocument) -> Result<()> {
        self.rating_system_loader()?
            .configure_current_rating_system(candidate)
    }

    /// Get a learner, creating them with the default rating on first contact
    pub fn learner(&self, user_id: UserId) -> Result<LearnerRating> {
        let existing = self.timed("get_learner", || {
            self.ports
                .learner_store
                .get_learner(self.assessment_id, user_id)
        })?;

        if let Some(learner) = existing {
            return Ok(learner);
        }

        let learner = LearnerRating::new(self.assessment_id, user_id, self.default_learner_rating);
        self.timed("store_learner", || {
            self.ports.learner_store.store_learner(learner.clone())
        })?;

        info!(
            "Learner {} joined assessment {} with rating {}",
            user_id, self.assessment_id, learner.rating
        );
        Ok(learner)
    }

    /// Pick the next question for a learner.
    ///
    /// Returns `None` when every question of the list is excluded or the list
    /// is empty.
    pub fn next_question(
        &self,
        user_id: UserId,
        excluded: &HashSet<QuestionId>,
    ) -> Result<Option<QuestionRating>> {
        let learner = self.learner(user_id)?;

        let question = self.strategy.next_question_for_user(
            &learner,
            &self.question_list,
            excluded,
            self.ports.question_pool.as_ref(),
        )?;

        match &question {
            Some(q) => {
                debug!(
                    "Selected question {} (rating {:.1}) for learner {} (rating {:.1})",
                    q.question_id, q.rating, user_id, learner.rating
                );
                self.update_stats(|stats| stats.questions_selected += 1);
            }
            None => {
                info!(
                    "No question available for learner {} in list {}",
                    user_id, self.question_list.id
                );
                self.update_stats(|stats| stats.empty_selections += 1);
            }
        }

        Ok(question)
    }

    /// Apply a judged attempt to the learner and question ratings.
    ///
    /// The question rating is persisted before the learner rating.
    pub fn record_outcome(&self, outcome: &AttemptOutcome) -> Result<AttemptResult> {
        let timer = MetricsTimer::start();
        let system = self.selected_rating_system()?;

        let mut learner = self.learner(outcome.learner_id)?;
        let question = self.question(outcome.question_id)?;

        let update = system.update_ratings(learner.rating, question.rating, outcome.outcome());

        self.timed("update_question_rating", || {
            self.ports
                .question_pool
                .update_question_rating(question.question_id, update.question_rating)
        })?;

        let previous_learner_rating = learner.rating;
        learner.rating = update.learner_rating;
        let level = self.question_list.level_for_rating(learner.rating);
        let leveled_up = learner.record_level(level);

        self.timed("store_learner", || {
            self.ports.learner_store.store_learner(learner.clone())
        })?;

        debug!(
            "Learner {} answered question {} {}: {:.1} -> {:.1}, question {:.1} -> {:.1}",
            learner.user_id,
            question.question_id,
            outcome.outcome(),
            previous_learner_rating,
            learner.rating,
            question.rating,
            update.question_rating
        );
        if leveled_up {
            info!(
                "Learner {} reached level {} in assessment {}",
                learner.user_id, level, self.assessment_id
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_rating_update(outcome.outcome(), learner.rating, timer.elapsed());
            if leveled_up {
                metrics.record_level_up();
            }
        }
        self.update_stats(|stats| {
            stats.outcomes_recorded += 1;
            if leveled_up {
                stats.level_ups += 1;
            }
        });

        Ok(AttemptResult {
            learner,
            question_id: question.question_id,
            previous_learner_rating,
            previous_question_rating: question.rating,
            update,
            level,
            leveled_up,
        })
    }

    /// Record that `winner` proved harder than `loser`.
    ///
    /// # Returns
    /// `(new_winner_rating, new_loser_rating)`
    pub fn record_question_victory(&self, winner: QuestionId, loser: QuestionId) -> Result<(f64, f64)> {
        if winner == loser {
            return Err(QuizError::SameQuestionPair { question_id: winner }.into());
        }

        let system = self.selected_rating_system()?;

        let winner_question = self.question(winner)?;
        let loser_question = self.question(loser)?;

        let (winner_rating, loser_rating) =
            system.question_victory_ratings(winner_question.rating, loser_question.rating);

        self.timed("update_question_rating", || {
            self.ports
                .question_pool
                .update_question_rating(winner, winner_rating)
        })?;
        let loser_write = self.timed("update_question_rating", || {
            self.ports
                .question_pool
                .update_question_rating(loser, loser_rating)
        });
        if let Err(e) = loser_write {
            warn!(
                "Failed to update question {}, restoring question {} to {:.1}",
                loser, winner, winner_question.rating
            );
            self.timed("update_question_rating", || {
                self.ports
                    .question_pool
                    .update_question_rating(winner, winner_question.rating)
            })?;
            return Err(e);
        }

        debug!(
            "Question {} beat question {}: {:.1} -> {:.1}, {:.1} -> {:.1}",
            winner,
            loser,
            winner_question.rating,
            winner_rating,
            loser_question.rating,
            loser_rating
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_question_victory();
        }
        self.update_stats(|stats| stats.question_victories += 1);

        Ok((winner_rating, loser_rating))
    }

    fn selected_rating_system(&self) -> Result<Box<dyn RatingSystem>> {
        let loader = self.rating_system_loader()?;

        loader.rating_system()?.ok_or_else(|| {
            warn!(
                "Assessment {} has no rating system selected",
                self.assessment_id
            );
            QuizError::NoRatingSystemSelected {
                assessment_id: self.assessment_id,
            }
            .into()
        })
    }

    /// A question of this assessment's list; questions of other lists are not found
    fn question(&self, question_id: QuestionId) -> Result<QuestionRating> {
        let question = self
            .timed("get_question", || {
                self.ports.question_pool.question(question_id)
            })?
            .filter(|q| q.question_list_id == self.question_list.id);

        question.ok_or_else(|| QuizError::QuestionNotFound { question_id }.into())
    }

    fn timed<T, F>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let timer = MetricsTimer::start();
        let result = op();

        if let Some(metrics) = &self.metrics {
            metrics.record_store_operation(operation, timer.stop());
            if result.is_err() {
                metrics.record_persistence_failure(operation);
            }
        }

        result
    }

    fn update_stats<F: FnOnce(&mut AssessmentStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.write() {
            f(&mut stats);
        }
    }
}
