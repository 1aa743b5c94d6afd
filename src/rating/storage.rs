//! Configuration storage interface and implementations
//!
//! This module defines the record store holding the active rating system of
//! each assessment, with an in-memory implementation and a mock for tests.

use crate::error::{QuizError, Result};
use crate::types::AssessmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Persisted rating system selection for one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    pub assessment_id: AssessmentId,
    pub rating_system_name: String,
    /// Serialized configuration document; empty means "absent"
    pub configuration: String,
    pub updated_at: DateTime<Utc>,
}

impl ConfigurationEntry {
    pub fn new(assessment_id: AssessmentId, rating_system_name: &str, configuration: String) -> Self {
        Self {
            assessment_id,
            rating_system_name: rating_system_name.to_string(),
            configuration,
            updated_at: crate::utils::current_timestamp(),
        }
    }
}

/// Trait for configuration storage operations
pub trait ConfigurationStore: Send + Sync {
    /// Get the entry of an assessment, if any
    fn get_one_by_key(&self, assessment_id: AssessmentId) -> Result<Option<ConfigurationEntry>>;

    /// Insert a new entry; fails if the assessment already has one
    fn insert(&self, entry: ConfigurationEntry) -> Result<()>;

    /// Replace an existing entry; fails if the assessment has none
    fn update(&self, entry: ConfigurationEntry) -> Result<()>;
}

fn lock_poisoned(operation: &str) -> anyhow::Error {
    QuizError::persistence(operation, "Failed to acquire configuration lock").into()
}

/// In-memory configuration storage implementation
#[derive(Debug, Default)]
pub struct InMemoryConfigurationStore {
    entries: RwLock<HashMap<AssessmentId, ConfigurationEntry>>,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(|_| lock_poisoned("len"))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ConfigurationStore for InMemoryConfigurationStore {
    fn get_one_by_key(&self, assessment_id: AssessmentId) -> Result<Option<ConfigurationEntry>> {
        let entries = self.entries.read().map_err(|_| lock_poisoned("get"))?;
        Ok(entries.get(&assessment_id).cloned())
    }

    fn insert(&self, entry: ConfigurationEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned("insert"))?;

        if entries.contains_key(&entry.assessment_id) {
            return Err(QuizError::persistence(
                "insert",
                format!("assessment {} already has an entry", entry.assessment_id),
            )
            .into());
        }

        entries.insert(entry.assessment_id, entry);
        Ok(())
    }

    fn update(&self, entry: ConfigurationEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned("update"))?;

        match entries.get_mut(&entry.assessment_id) {
            Some(existing) => {
                *existing = entry;
                Ok(())
            }
            None => Err(QuizError::persistence(
                "update",
                format!("assessment {} has no entry", entry.assessment_id),
            )
            .into()),
        }
    }
}

/// Mock configuration storage for testing
///
/// Records every write and can be told to fail reads or writes.
#[derive(Debug, Default)]
pub struct MockConfigurationStore {
    inner: InMemoryConfigurationStore,
    write_calls: RwLock<Vec<ConfigurationEntry>>,
    fail_reads: RwLock<bool>,
    fail_writes: RwLock<bool>,
}

impl MockConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset an entry without recording a write
    pub fn preset_entry(&self, entry: ConfigurationEntry) -> Result<()> {
        self.inner.insert(entry)
    }

    /// Make every following read fail
    pub fn set_fail_reads(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_reads.write() {
            *flag = fail;
        }
    }

    /// Make every following write fail
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.write() {
            *flag = fail;
        }
    }

    /// Get all write calls made (for testing)
    pub fn get_write_calls(&self) -> Vec<ConfigurationEntry> {
        self.write_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn check(&self, flag: &RwLock<bool>, operation: &str) -> Result<()> {
        if flag.read().map(|f| *f).unwrap_or(false) {
            return Err(QuizError::persistence(operation, "injected failure").into());
        }
        Ok(())
    }

    fn record(&self, entry: &ConfigurationEntry) {
        if let Ok(mut calls) = self.write_calls.write() {
            calls.push(entry.clone());
        }
    }
}

impl ConfigurationStore for MockConfigurationStore {
    fn get_one_by_key(&self, assessment_id: AssessmentId) -> Result<Option<ConfigurationEntry>> {
        self.check(&self.fail_reads, "get")?;
        self.inner.get_one_by_key(assessment_id)
    }

    fn insert(&self, entry: ConfigurationEntry) -> Result<()> {
        self.record(&entry);
        self.check(&self.fail_writes, "insert")?;
        self.inner.insert(entry)
    }

    fn update(&self, entry: ConfigurationEntry) -> Result<()> {
        self.record(&entry);
        self.check(&self.fail_writes, "update")?;
        self.inner.update(entry)
    }
}
