//! Rating system registry
//!
//! Maps rating system names to factories. Implementations are registered at
//! start-up; looking up an unregistered name is an error, never a fallback.

use crate::config::{ConfigDocument, ConfigurationForm};
use crate::error::{QuizError, Result};
use crate::rating::elo::{EloRatingSystem, ELO_RATING_SYSTEM};
use crate::rating::system::RatingSystem;
use std::collections::BTreeMap;

/// Constructor for a fresh, unconfigured rating system
pub type RatingSystemFactory = fn() -> Box<dyn RatingSystem>;

/// Catalog of available rating systems
#[derive(Debug, Clone)]
pub struct RatingSystemRegistry {
    factories: BTreeMap<String, RatingSystemFactory>,
}

impl RatingSystemRegistry {
    /// Create a registry with the built-in rating systems
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ELO_RATING_SYSTEM, || Box::new(EloRatingSystem::new()));
        registry
    }

    /// Create a registry without any rating systems
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a rating system, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, factory: RatingSystemFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Names of all registered rating systems, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct the rating system registered under `name`
    pub fn rating_system(&self, name: &str) -> Result<Box<dyn RatingSystem>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| QuizError::UnknownRatingSystem {
                name: name.to_string(),
            })?;

        Ok(factory())
    }

    /// Build the configuration form of the named rating system
    pub fn configuration_form(
        &self,
        name: &str,
        config: &ConfigDocument,
        target_url: &str,
    ) -> Result<ConfigurationForm> {
        let system = self.rating_system(name)?;
        Ok(system.configuration_form(config, target_url))
    }
}

impl Default for RatingSystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}
