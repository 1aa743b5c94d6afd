//! Common types used throughout the matchmaking crate

use crate::error::{QuizError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::Outcomes;

/// Identifier of one assessment instance
pub type AssessmentId = u64;

/// Identifier of a question inside a question list
pub type QuestionId = u64;

/// Identifier of a question list
pub type QuestionListId = u64;

/// Identifier of a learner
pub type UserId = u64;

/// Number of level thresholds carried by a question list
pub const LEVEL_COUNT: usize = 5;

/// Default level thresholds for a new question list
pub const DEFAULT_LEVEL_RATINGS: [f64; LEVEL_COUNT] = [1300.0, 1450.0, 1600.0, 1750.0, 1900.0];

/// Name shown when the backing question no longer exists
pub const MISSING_QUESTION_NAME: &str = "Missing question";

/// Text shown when the backing question no longer exists
pub const MISSING_QUESTION_TEXT: &str = "This question is missing.";

/// Judged result of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    /// Actual score of the learner (1 for correct, 0 for incorrect)
    pub fn score(self) -> f64 {
        match self {
            Outcome::Correct => 1.0,
            Outcome::Incorrect => 0.0,
        }
    }

    /// Outcome as seen from the learner's side of an Elo match
    pub fn as_learner_outcome(self) -> Outcomes {
        match self {
            Outcome::Correct => Outcomes::WIN,
            Outcome::Incorrect => Outcomes::LOSS,
        }
    }
}

impl From<bool> for Outcome {
    fn from(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Correct => write!(f, "correct"),
            Outcome::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Display fields of a question as stored in the external question bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionText {
    pub name: String,
    pub text: String,
}

/// A question's rating inside a question list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRating {
    pub question_id: QuestionId,
    pub question_list_id: QuestionListId,
    /// Reference into the external question bank
    pub bank_question_id: u64,
    pub rating: f64,
    pub name: String,
    pub text: String,
}

impl QuestionRating {
    /// Create a question rating with placeholder display fields
    pub fn new(
        question_id: QuestionId,
        question_list_id: QuestionListId,
        bank_question_id: u64,
        rating: f64,
    ) -> Self {
        Self {
            question_id,
            question_list_id,
            bank_question_id,
            rating,
            name: MISSING_QUESTION_NAME.to_string(),
            text: MISSING_QUESTION_TEXT.to_string(),
        }
    }

    /// Refresh name and text from the question bank, falling back to the
    /// missing-question sentinel when the bank no longer knows the question
    pub fn refresh_display(&mut self, bank: &dyn crate::question::QuestionBank) {
        match bank.lookup(self.bank_question_id) {
            Some(QuestionText { name, text }) => {
                self.name = name;
                self.text = text;
            }
            None => {
                self.name = MISSING_QUESTION_NAME.to_string();
                self.text = MISSING_QUESTION_TEXT.to_string();
            }
        }
    }

    /// Whether the backing bank question was found on the last refresh
    pub fn is_missing(&self) -> bool {
        self.name == MISSING_QUESTION_NAME && self.text == MISSING_QUESTION_TEXT
    }
}

/// A learner's rating within one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerRating {
    pub assessment_id: AssessmentId,
    pub user_id: UserId,
    pub rating: f64,
    pub highest_level_reached: u32,
}

impl LearnerRating {
    pub fn new(assessment_id: AssessmentId, user_id: UserId, rating: f64) -> Self {
        Self {
            assessment_id,
            user_id,
            rating,
            highest_level_reached: 0,
        }
    }

    /// Raise the highest level reached; never lowers it.
    ///
    /// Returns true when the level went up.
    pub fn record_level(&mut self, level: u32) -> bool {
        if level > self.highest_level_reached {
            self.highest_level_reached = level;
            true
        } else {
            false
        }
    }
}

/// A question list with its level thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionList {
    pub id: QuestionListId,
    pub title: String,
    level_ratings: [f64; LEVEL_COUNT],
}

impl QuestionList {
    pub fn new(id: QuestionListId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            level_ratings: DEFAULT_LEVEL_RATINGS,
        }
    }

    /// Level thresholds, lowest first
    pub fn level_ratings(&self) -> &[f64; LEVEL_COUNT] {
        &self.level_ratings
    }

    /// Replace the level thresholds.
    ///
    /// Exactly [`LEVEL_COUNT`] finite, strictly increasing values are required.
    pub fn set_level_ratings(&mut self, ratings: &[f64]) -> Result<()> {
        if ratings.len() != LEVEL_COUNT {
            return Err(QuizError::InvalidLevelRatings {
                reason: format!("expected {} ratings, got {}", LEVEL_COUNT, ratings.len()),
            }
            .into());
        }
        if let Some(bad) = ratings.iter().find(|r| !r.is_finite()) {
            return Err(QuizError::InvalidLevelRatings {
                reason: format!("rating {} is not finite", bad),
            }
            .into());
        }
        if ratings.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(QuizError::InvalidLevelRatings {
                reason: "ratings must be strictly increasing".to_string(),
            }
            .into());
        }

        self.level_ratings.copy_from_slice(ratings);
        Ok(())
    }

    /// Number of level thresholds at or below the given rating
    pub fn level_for_rating(&self, rating: f64) -> u32 {
        self.level_ratings
            .iter()
            .filter(|threshold| rating >= **threshold)
            .count() as u32
    }
}

/// Judged attempt produced by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub learner_id: UserId,
    pub question_id: QuestionId,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl AttemptOutcome {
    pub fn new(learner_id: UserId, question_id: QuestionId, correct: bool) -> Self {
        Self {
            learner_id,
            question_id,
            correct,
            timestamp: crate::utils::current_timestamp(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from(self.correct)
    }
}
