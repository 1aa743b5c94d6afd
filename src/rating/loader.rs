//! Active rating system of one assessment
//!
//! The loader reads the persisted selection of an assessment, rebuilds the
//! named rating system from the registry and applies its stored
//! configuration. Changes are written through to the store first and only
//! adopted in memory once the write succeeded.

use crate::config::{ConfigDocument, ConfigurationForm};
use crate::error::{QuizError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::registry::RatingSystemRegistry;
use crate::rating::storage::{ConfigurationEntry, ConfigurationStore};
use crate::rating::system::RatingSystem;
use crate::types::AssessmentId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads, persists and hot-swaps the rating system of one assessment
pub struct RatingSystemLoader {
    assessment_id: AssessmentId,
    registry: Arc<RatingSystemRegistry>,
    store: Arc<dyn ConfigurationStore>,
    entry: Option<ConfigurationEntry>,
    configuration: Option<ConfigDocument>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl std::fmt::Debug for RatingSystemLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingSystemLoader")
            .field("assessment_id", &self.assessment_id)
            .field("entry", &self.entry)
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl RatingSystemLoader {
    /// Load the persisted selection of an assessment.
    ///
    /// A failing read is returned as a persistence failure.
    pub fn load(
        assessment_id: AssessmentId,
        registry: Arc<RatingSystemRegistry>,
        store: Arc<dyn ConfigurationStore>,
    ) -> Result<Self> {
        let mut loader = Self {
            assessment_id,
            registry,
            store,
            entry: None,
            configuration: None,
            metrics: None,
        };
        loader.reload()?;
        Ok(loader)
    }

    /// Report configuration fallbacks and write failures to the given collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn assessment_id(&self) -> AssessmentId {
        self.assessment_id
    }

    /// Re-read the persisted entry, discarding the in-memory state
    pub fn reload(&mut self) -> Result<()> {
        match self.store.get_one_by_key(self.assessment_id)? {
            Some(entry) => self.adopt(entry),
            None => {
                self.entry = None;
                self.configuration = None;
            }
        }
        Ok(())
    }

    /// Whether a usable rating system is selected.
    ///
    /// True only if an entry exists, its rating system is registered and a
    /// stored configuration (if any) deserializes.
    pub fn has_rating_system(&self) -> bool {
        let Some(entry) = &self.entry else {
            return false;
        };

        if !self.registry.contains(&entry.rating_system_name) {
            return false;
        }

        entry.configuration.trim().is_empty() || self.configuration.is_some()
    }

    /// Name of the selected rating system
    pub fn current_rating_system_name(&self) -> Option<&str> {
        self.entry.as_ref().map(|e| e.rating_system_name.as_str())
    }

    /// Deserialized configuration of the selected rating system
    pub fn configuration(&self) -> Option<&ConfigDocument> {
        self.configuration.as_ref()
    }

    /// Rebuild the selected rating system with its persisted configuration.
    ///
    /// Returns `None` when no rating system was selected. A stored
    /// configuration that fails to deserialize is replaced by the system's
    /// default configuration.
    pub fn rating_system(&self) -> Result<Option<Box<dyn RatingSystem>>> {
        let Some(entry) = &self.entry else {
            return Ok(None);
        };

        let mut system = self.registry.rating_system(&entry.rating_system_name)?;

        match &self.configuration {
            Some(config) => system.configure(config),
            None if !entry.configuration.trim().is_empty() => {
                let defaults = system.default_configuration();
                system.configure(&defaults);
            }
            None => {}
        }

        Ok(Some(system))
    }

    /// Editable form for the selected rating system's configuration
    pub fn configuration_form(&self, target_url: &str) -> Result<Option<ConfigurationForm>> {
        let Some(entry) = &self.entry else {
            return Ok(None);
        };

        let config = match &self.configuration {
            Some(config) => config.clone(),
            None => self
                .registry
                .rating_system(&entry.rating_system_name)?
                .default_configuration(),
        };

        self.registry
            .configuration_form(&entry.rating_system_name, &config, target_url)
            .map(Some)
    }

    /// Select a rating system for the assessment.
    ///
    /// The given configuration is applied through the system and read back;
    /// without one the system's default configuration is stored. An existing
    /// selection is replaced, not migrated.
    pub fn set_rating_system(&mut self, name: &str, configuration: Option<&ConfigDocument>) -> Result<()> {
        let mut system = self.registry.rating_system(name)?;

        let document = match configuration {
            Some(candidate) => {
                system.configure(candidate);
                system
                    .configuration()
                    .unwrap_or_else(|| system.default_configuration())
            }
            None => system.default_configuration(),
        };

        let entry = ConfigurationEntry::new(self.assessment_id, name, document.to_json()?);

        // Decide against the store, another writer may have selected meanwhile
        let exists = self.store.get_one_by_key(self.assessment_id)?.is_some();
        if exists {
            self.write("update", entry.clone(), |store, e| store.update(e))?;
        } else {
            self.write("insert", entry.clone(), |store, e| store.insert(e))?;
        }

        info!(
            "Assessment {} now uses rating system {}",
            self.assessment_id, name
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_configuration_change(name);
        }

        self.adopt(entry);
        Ok(())
    }

    /// Apply a candidate configuration to the selected rating system and persist
    /// what the system reports back
    pub fn configure_current_rating_system(&mut self, candidate: &ConfigDocument) -> Result<()> {
        let Some(current) = &self.entry else {
            return Err(QuizError::NoRatingSystemSelected {
                assessment_id: self.assessment_id,
            }
            .into());
        };

        let mut system = self.registry.rating_system(&current.rating_system_name)?;
        if let Some(config) = &self.configuration {
            system.configure(config);
        }
        system.configure(candidate);

        let payload = match system.configuration() {
            Some(config) => config.to_json()?,
            None => String::new(),
        };

        let entry = ConfigurationEntry::new(self.assessment_id, &current.rating_system_name, payload);
        self.write("update", entry.clone(), |store, e| store.update(e))?;

        debug!(
            "Assessment {} reconfigured {}: {}",
            self.assessment_id, entry.rating_system_name, entry.configuration
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_configuration_change(&entry.rating_system_name);
        }

        self.adopt(entry);
        Ok(())
    }

    fn write<F>(&self, operation: &str, entry: ConfigurationEntry, op: F) -> Result<()>
    where
        F: FnOnce(&dyn ConfigurationStore, ConfigurationEntry) -> Result<()>,
    {
        op(self.store.as_ref(), entry).map_err(|e| {
            warn!(
                "Failed to {} rating system entry for assessment {}: {}",
                operation, self.assessment_id, e
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_persistence_failure(operation);
            }
            e
        })
    }

    fn adopt(&mut self, entry: ConfigurationEntry) {
        self.configuration = ConfigDocument::from_json(&entry.configuration);

        if self.configuration.is_none() && !entry.configuration.trim().is_empty() {
            warn!(
                "Assessment {} has an unreadable {} configuration, using defaults",
                self.assessment_id, entry.rating_system_name
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_configuration_fallback();
            }
        }

        self.entry = Some(entry);
    }
}
