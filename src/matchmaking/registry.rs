//! Matchmaking strategy registry

use crate::config::ConfigDocument;
use crate::error::{QuizError, Result};
use crate::matchmaking::n_closest::{NClosestSelector, N_CLOSEST_STRATEGY};
use crate::matchmaking::strategy::MatchmakingStrategy;
use std::collections::BTreeMap;

/// Constructor for a strategy with its default configuration
pub type MatchmakingStrategyFactory = fn() -> Box<dyn MatchmakingStrategy>;

/// Catalog of available matchmaking strategies
#[derive(Debug, Clone)]
pub struct MatchmakingStrategyRegistry {
    factories: BTreeMap<String, MatchmakingStrategyFactory>,
}

impl MatchmakingStrategyRegistry {
    /// Create a registry with the built-in strategies
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(N_CLOSEST_STRATEGY, || Box::new(NClosestSelector::new()));
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a strategy, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, factory: MatchmakingStrategyFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct the strategy registered under `name`
    pub fn strategy(&self, name: &str) -> Result<Box<dyn MatchmakingStrategy>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| QuizError::UnknownMatchmakingStrategy {
                name: name.to_string(),
            })?;

        Ok(factory())
    }

    /// Construct the named strategy and apply an optional configuration
    pub fn configured_strategy(
        &self,
        name: &str,
        config: Option<&ConfigDocument>,
    ) -> Result<Box<dyn MatchmakingStrategy>> {
        let mut strategy = self.strategy(name)?;
        if let Some(config) = config {
            strategy.configure(config);
        }
        Ok(strategy)
    }
}

impl Default for MatchmakingStrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
