//! Learner rating storage
//!
//! Learner ratings are kept per assessment. Each learner is an independent
//! row, so concurrent attempts by different learners never contend.

use crate::error::{QuizError, Result};
use crate::types::{AssessmentId, LearnerRating, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for learner rating storage operations
pub trait LearnerStore: Send + Sync {
    /// Get a learner's rating within an assessment
    fn get_learner(&self, assessment_id: AssessmentId, user_id: UserId) -> Result<Option<LearnerRating>>;

    /// Store or replace a learner's rating
    fn store_learner(&self, learner: LearnerRating) -> Result<()>;

    /// All learners of an assessment
    fn learners(&self, assessment_id: AssessmentId) -> Result<Vec<LearnerRating>>;
}

/// In-memory learner storage implementation
#[derive(Debug, Default)]
pub struct InMemoryLearnerStore {
    learners: RwLock<HashMap<(AssessmentId, UserId), LearnerRating>>,
}

impl InMemoryLearnerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> anyhow::Error {
    QuizError::persistence("learner store", "Failed to acquire learner lock").into()
}

impl LearnerStore for InMemoryLearnerStore {
    fn get_learner(&self, assessment_id: AssessmentId, user_id: UserId) -> Result<Option<LearnerRating>> {
        let learners = self.learners.read().map_err(|_| lock_poisoned())?;
        Ok(learners.get(&(assessment_id, user_id)).cloned())
    }

    fn store_learner(&self, learner: LearnerRating) -> Result<()> {
        let mut learners = self.learners.write().map_err(|_| lock_poisoned())?;
        learners.insert((learner.assessment_id, learner.user_id), learner);
        Ok(())
    }

    fn learners(&self, assessment_id: AssessmentId) -> Result<Vec<LearnerRating>> {
        let learners = self.learners.read().map_err(|_| lock_poisoned())?;

        let mut result: Vec<LearnerRating> = learners
            .values()
            .filter(|l| l.assessment_id == assessment_id)
            .cloned()
            .collect();
        result.sort_by_key(|l| l.user_id);

        Ok(result)
    }
}
