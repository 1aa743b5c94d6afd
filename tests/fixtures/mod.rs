//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use quiz_matchmaker::assessment::{AssessmentEngine, AssessmentPorts};
use quiz_matchmaker::config::{ConfigDocument, ConfigurationForm, FieldKind};
use quiz_matchmaker::error::{QuizError, Result};
use quiz_matchmaker::learner::{InMemoryLearnerStore, LearnerStore};
use quiz_matchmaker::matchmaking::NClosestSelector;
use quiz_matchmaker::question::{InMemoryQuestionPool, QuestionPool};
use quiz_matchmaker::rating::{
    ConfigurationStore, InMemoryConfigurationStore, RatingSystem, RatingSystemRegistry,
    RatingUpdate,
};
use quiz_matchmaker::types::{
    AssessmentId, LearnerRating, Outcome, QuestionId, QuestionList, QuestionListId, QuestionRating,
    UserId,
};
use std::sync::{Arc, Mutex};

pub const ASSESSMENT_ID: AssessmentId = 11;
pub const LIST_ID: QuestionListId = 3;
pub const FROZEN_RATING_SYSTEM: &str = "frozen";

/// Question pool with ratings spread evenly between `low` and `high`
pub fn spread_pool(count: usize, low: f64, high: f64) -> InMemoryQuestionPool {
    let pool = InMemoryQuestionPool::new();
    let step = if count > 1 {
        (high - low) / (count - 1) as f64
    } else {
        0.0
    };

    for i in 0..count {
        let id = i as QuestionId + 1;
        pool.add_question(QuestionRating::new(id, LIST_ID, id, low + step * i as f64))
            .expect("add question");
    }
    pool
}

/// Question pool with the given ratings, ids starting at 1
pub fn pool_with(ratings: &[f64]) -> InMemoryQuestionPool {
    let pool = InMemoryQuestionPool::new();
    for (i, rating) in ratings.iter().enumerate() {
        let id = i as QuestionId + 1;
        pool.add_question(QuestionRating::new(id, LIST_ID, id, *rating))
            .expect("add question");
    }
    pool
}

/// Registry with the built-in systems plus [`FrozenRatingSystem`]
pub fn registry_with_frozen() -> Arc<RatingSystemRegistry> {
    let mut registry = RatingSystemRegistry::new();
    registry.register(FROZEN_RATING_SYSTEM, || Box::new(FrozenRatingSystem));
    Arc::new(registry)
}

/// A complete in-memory assessment
pub struct TestSystem {
    pub engine: AssessmentEngine,
    pub pool: Arc<dyn QuestionPool>,
    pub learners: Arc<dyn LearnerStore>,
    pub configurations: Arc<dyn ConfigurationStore>,
}

pub fn create_test_system(pool: Arc<dyn QuestionPool>) -> TestSystem {
    create_test_system_with(
        pool,
        Arc::new(InMemoryLearnerStore::new()),
        Arc::new(InMemoryConfigurationStore::new()),
    )
}

pub fn create_test_system_with(
    pool: Arc<dyn QuestionPool>,
    learners: Arc<dyn LearnerStore>,
    configurations: Arc<dyn ConfigurationStore>,
) -> TestSystem {
    let ports = AssessmentPorts {
        rating_systems: registry_with_frozen(),
        configuration_store: configurations.clone(),
        question_pool: pool.clone(),
        learner_store: learners.clone(),
    };

    let engine = AssessmentEngine::new(
        ASSESSMENT_ID,
        QuestionList::new(LIST_ID, "Fixture list"),
        ports,
        Box::new(NClosestSelector::new()),
    );

    TestSystem {
        engine,
        pool,
        learners,
        configurations,
    }
}

/// Rating system that never changes a rating
#[derive(Debug, Default)]
pub struct FrozenRatingSystem;

impl RatingSystem for FrozenRatingSystem {
    fn name(&self) -> &'static str {
        FROZEN_RATING_SYSTEM
    }

    fn configure(&mut self, _config: &ConfigDocument) {}

    fn configuration(&self) -> Option<ConfigDocument> {
        None
    }

    fn default_configuration(&self) -> ConfigDocument {
        ConfigDocument::new()
    }

    fn update_ratings(
        &self,
        learner_rating: f64,
        question_rating: f64,
        _outcome: Outcome,
    ) -> RatingUpdate {
        RatingUpdate {
            learner_rating,
            question_rating,
        }
    }

    fn question_victory_ratings(&self, winner_rating: f64, loser_rating: f64) -> (f64, f64) {
        (winner_rating, loser_rating)
    }

    fn configuration_form(&self, config: &ConfigDocument, target_url: &str) -> ConfigurationForm {
        ConfigurationForm::new(target_url).field("note", "Note", FieldKind::Text, config)
    }
}

/// Shared log of write operations across ports
pub type WriteLog = Arc<Mutex<Vec<String>>>;

fn log_write(log: &WriteLog, entry: String) {
    if let Ok(mut writes) = log.lock() {
        writes.push(entry);
    }
}

/// Question pool that logs writes and can be told to fail them
pub struct RecordingQuestionPool {
    inner: InMemoryQuestionPool,
    log: WriteLog,
    fail_writes: Mutex<bool>,
    fail_question: Mutex<Option<QuestionId>>,
}

impl RecordingQuestionPool {
    pub fn new(inner: InMemoryQuestionPool, log: WriteLog) -> Self {
        Self {
            inner,
            log,
            fail_writes: Mutex::new(false),
            fail_question: Mutex::new(None),
        }
    }

    /// Fail writes to a single question only
    pub fn set_fail_question(&self, question_id: Option<QuestionId>) {
        if let Ok(mut failing) = self.fail_question.lock() {
            *failing = question_id;
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }
}

impl QuestionPool for RecordingQuestionPool {
    fn fetch_questions(&self, question_list_id: QuestionListId) -> Result<Vec<QuestionRating>> {
        self.inner.fetch_questions(question_list_id)
    }

    fn question(&self, question_id: QuestionId) -> Result<Option<QuestionRating>> {
        self.inner.question(question_id)
    }

    fn update_question_rating(&self, question_id: QuestionId, rating: f64) -> Result<()> {
        let failing_question = self.fail_question.lock().map(|f| *f).unwrap_or(None);
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false)
            || failing_question == Some(question_id)
        {
            return Err(QuizError::persistence("update_question_rating", "pool offline").into());
        }
        log_write(&self.log, format!("question:{}", question_id));
        self.inner.update_question_rating(question_id, rating)
    }
}

/// Learner store that logs writes
pub struct RecordingLearnerStore {
    inner: InMemoryLearnerStore,
    log: WriteLog,
}

impl RecordingLearnerStore {
    pub fn new(log: WriteLog) -> Self {
        Self {
            inner: InMemoryLearnerStore::new(),
            log,
        }
    }
}

impl LearnerStore for RecordingLearnerStore {
    fn get_learner(&self, assessment_id: AssessmentId, user_id: UserId) -> Result<Option<LearnerRating>> {
        self.inner.get_learner(assessment_id, user_id)
    }

    fn store_learner(&self, learner: LearnerRating) -> Result<()> {
        log_write(&self.log, format!("learner:{}", learner.user_id));
        self.inner.store_learner(learner)
    }

    fn learners(&self, assessment_id: AssessmentId) -> Result<Vec<LearnerRating>> {
        self.inner.learners(assessment_id)
    }
}
