//! Administrative configuration forms
//!
//! Rating systems and matchmaking strategies describe their configuration as
//! a list of typed fields. The host renders the form however it likes and
//! hands the submitted values back to [`ConfigurationForm::parse_submission`].

use crate::config::document::{ConfigDocument, ConfigValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Kind of input a form field expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Number,
    Integer,
    Text,
}

/// One editable configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    /// Current value, if the configuration has one
    pub value: Option<ConfigValue>,
}

/// Editable representation of a configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationForm {
    pub target_url: String,
    pub fields: Vec<FormField>,
}

impl ConfigurationForm {
    pub fn new(target_url: &str) -> Self {
        Self {
            target_url: target_url.to_string(),
            fields: Vec::new(),
        }
    }

    /// Add a field, prefilled from the given configuration
    pub fn field(mut self, key: &str, label: &str, kind: FieldKind, config: &ConfigDocument) -> Self {
        self.fields.push(FormField {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            value: config.get(key).cloned(),
        });
        self
    }

    pub fn get_field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Turn submitted form values into a candidate configuration.
    ///
    /// Only keys declared by the form are read. Values that do not parse for
    /// their field kind are dropped so the implementation keeps its prior value.
    pub fn parse_submission(&self, submitted: &HashMap<String, String>) -> ConfigDocument {
        let mut candidate = ConfigDocument::new();

        for field in &self.fields {
            let Some(raw) = submitted.get(&field.key) else {
                continue;
            };
            let raw = raw.trim();

            match field.kind {
                FieldKind::Text => candidate.set(&field.key, raw),
                FieldKind::Number | FieldKind::Integer => match raw.parse::<f64>() {
                    Ok(n) if field.kind == FieldKind::Integer && n.fract() != 0.0 => {
                        warn!("Field {} expects an integer, got {}", field.key, raw);
                    }
                    Ok(n) => candidate.set(&field.key, n),
                    Err(_) => {
                        warn!("Field {} expects a number, got {:?}", field.key, raw);
                    }
                },
            }
        }

        candidate
    }
}
