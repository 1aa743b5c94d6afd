//! Question bank lookup
//!
//! Display-only access to the host's question bank. Nothing algorithmic
//! depends on it.

use crate::types::QuestionText;
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for looking up question display fields
pub trait QuestionBank: Send + Sync {
    /// Name and text of a bank question, or `None` if it no longer exists
    fn lookup(&self, bank_question_id: u64) -> Option<QuestionText>;
}

/// In-memory question bank
#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    questions: RwLock<HashMap<u64, QuestionText>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, bank_question_id: u64, name: &str, text: &str) {
        if let Ok(mut questions) = self.questions.write() {
            questions.insert(
                bank_question_id,
                QuestionText {
                    name: name.to_string(),
                    text: text.to_string(),
                },
            );
        }
    }

    /// Remove a question, returning whether it existed
    pub fn remove(&self, bank_question_id: u64) -> bool {
        self.questions
            .write()
            .map(|mut questions| questions.remove(&bank_question_id).is_some())
            .unwrap_or(false)
    }
}

impl QuestionBank for InMemoryQuestionBank {
    fn lookup(&self, bank_question_id: u64) -> Option<QuestionText> {
        self.questions
            .read()
            .ok()
            .and_then(|questions| questions.get(&bank_question_id).cloned())
    }
}
