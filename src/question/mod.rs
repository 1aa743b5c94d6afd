//! Question pool and question bank access
//!
//! Ports through which the matchmaker reads and updates question ratings and
//! looks up question display text, with in-memory implementations.

pub mod bank;
pub mod pool;

// Re-export commonly used types
pub use bank::{InMemoryQuestionBank, QuestionBank};
pub use pool::{InMemoryQuestionPool, QuestionPool};
