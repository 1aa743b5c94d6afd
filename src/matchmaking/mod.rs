//! Question matchmaking
//!
//! Strategies that choose the next question for a learner, and the registry
//! they are looked up in.

pub mod n_closest;
pub mod registry;
pub mod strategy;

// Re-export commonly used types
pub use n_closest::{ideal_question_rating, NClosestConfig, NClosestSelector, N_CLOSEST_STRATEGY};
pub use registry::{MatchmakingStrategyFactory, MatchmakingStrategyRegistry};
pub use strategy::MatchmakingStrategy;
