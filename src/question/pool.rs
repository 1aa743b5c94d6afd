//! Question pool interface and implementations
//!
//! The pool supplies question ratings for a question list and ranks them by
//! distance to a target rating. The default ranking is a linear scan and
//! sort, which is enough for pools of a few thousand questions.

use crate::error::{QuizError, Result};
use crate::question::bank::QuestionBank;
use crate::types::{QuestionId, QuestionListId, QuestionRating};
use crate::utils::compare_distance_to;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

/// Trait for question pool operations
pub trait QuestionPool: Send + Sync {
    /// All questions of a question list
    fn fetch_questions(&self, question_list_id: QuestionListId) -> Result<Vec<QuestionRating>>;

    /// A single question by id
    fn question(&self, question_id: QuestionId) -> Result<Option<QuestionRating>>;

    /// Persist a new rating for one question
    fn update_question_rating(&self, question_id: QuestionId, rating: f64) -> Result<()>;

    /// Up to `limit` questions of the list closest to `target`, closest first.
    ///
    /// Excluded questions are removed before ranking. Ties keep the order
    /// returned by [`QuestionPool::fetch_questions`].
    fn closest_questions(
        &self,
        question_list_id: QuestionListId,
        target: f64,
        limit: usize,
        excluded: &HashSet<QuestionId>,
    ) -> Result<Vec<QuestionRating>> {
        let mut questions = self.fetch_questions(question_list_id)?;
        questions.retain(|q| !excluded.contains(&q.question_id));
        questions.sort_by(|a, b| compare_distance_to(target, a.rating, b.rating));
        questions.truncate(limit);
        Ok(questions)
    }
}

fn lock_poisoned() -> anyhow::Error {
    QuizError::persistence("question pool", "Failed to acquire question lock").into()
}

/// In-memory question pool implementation
#[derive(Default)]
pub struct InMemoryQuestionPool {
    questions: RwLock<BTreeMap<QuestionId, QuestionRating>>,
    bank: Option<Arc<dyn QuestionBank>>,
}

impl std::fmt::Debug for InMemoryQuestionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQuestionPool")
            .field("questions", &self.questions)
            .field("has_bank", &self.bank.is_some())
            .finish()
    }
}

impl InMemoryQuestionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh display fields from the given bank whenever questions are read
    pub fn with_bank(mut self, bank: Arc<dyn QuestionBank>) -> Self {
        self.bank = Some(bank);
        self
    }

    /// Add or replace a question
    pub fn add_question(&self, question: QuestionRating) -> Result<()> {
        let mut questions = self.questions.write().map_err(|_| lock_poisoned())?;
        questions.insert(question.question_id, question);
        Ok(())
    }

    /// Total number of questions across all lists
    pub fn len(&self) -> Result<usize> {
        let questions = self.questions.read().map_err(|_| lock_poisoned())?;
        Ok(questions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn with_display(&self, mut question: QuestionRating) -> QuestionRating {
        if let Some(bank) = &self.bank {
            question.refresh_display(bank.as_ref());
        }
        question
    }
}

impl QuestionPool for InMemoryQuestionPool {
    fn fetch_questions(&self, question_list_id: QuestionListId) -> Result<Vec<QuestionRating>> {
        let questions = self.questions.read().map_err(|_| lock_poisoned())?;

        Ok(questions
            .values()
            .filter(|q| q.question_list_id == question_list_id)
            .cloned()
            .map(|q| self.with_display(q))
            .collect())
    }

    fn question(&self, question_id: QuestionId) -> Result<Option<QuestionRating>> {
        let questions = self.questions.read().map_err(|_| lock_poisoned())?;
        Ok(questions
            .get(&question_id)
            .cloned()
            .map(|q| self.with_display(q)))
    }

    fn update_question_rating(&self, question_id: QuestionId, rating: f64) -> Result<()> {
        let mut questions = self.questions.write().map_err(|_| lock_poisoned())?;

        match questions.get_mut(&question_id) {
            Some(question) => {
                question.rating = rating;
                Ok(())
            }
            None => Err(QuizError::QuestionNotFound { question_id }.into()),
        }
    }
}
