//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! quiz-matchmaker, including environment variable and TOML file loading and
//! validation.

use crate::types::{DEFAULT_LEVEL_RATINGS, LEVEL_COUNT};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingSettings,
    pub matchmaking: MatchmakingSettings,
    pub levels: LevelSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Rating defaults applied to new learners, new questions and new assessments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Rating system selected for a new assessment
    pub default_rating_system: String,
    /// Rating given to a learner on first interaction
    pub default_learner_rating: f64,
    /// Rating given to a question when it is added to a list
    pub default_question_rating: f64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Strategy used to pick the next question
    pub strategy: String,
    /// Target probability that the learner answers correctly
    pub user_win_probability: f64,
    /// Size of the candidate set the random pick is drawn from
    pub number_of_questions_to_select: u32,
}

/// Level thresholds for new question lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub level_ratings: Vec<f64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "quiz-matchmaker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            default_rating_system: "elo".to_string(),
            default_learner_rating: 1200.0,
            default_question_rating: 1200.0,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            strategy: "n_closest".to_string(),
            user_win_probability: 0.75,
            number_of_questions_to_select: 10,
        }
    }
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            level_ratings: DEFAULT_LEVEL_RATINGS.to_vec(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing sections keep their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("QUIZ_SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("QUIZ_LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(system) = env::var("QUIZ_DEFAULT_RATING_SYSTEM") {
            self.rating.default_rating_system = system;
        }
        if let Ok(rating) = env::var("QUIZ_DEFAULT_LEARNER_RATING") {
            self.rating.default_learner_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid QUIZ_DEFAULT_LEARNER_RATING value: {}", rating))?;
        }
        if let Ok(rating) = env::var("QUIZ_DEFAULT_QUESTION_RATING") {
            self.rating.default_question_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid QUIZ_DEFAULT_QUESTION_RATING value: {}", rating))?;
        }

        // Matchmaking settings
        if let Ok(strategy) = env::var("QUIZ_MATCHMAKING_STRATEGY") {
            self.matchmaking.strategy = strategy;
        }
        if let Ok(probability) = env::var("QUIZ_USER_WIN_PROBABILITY") {
            self.matchmaking.user_win_probability = probability
                .parse()
                .map_err(|_| anyhow!("Invalid QUIZ_USER_WIN_PROBABILITY value: {}", probability))?;
        }
        if let Ok(count) = env::var("QUIZ_NUMBER_OF_QUESTIONS_TO_SELECT") {
            self.matchmaking.number_of_questions_to_select = count.parse().map_err(|_| {
                anyhow!("Invalid QUIZ_NUMBER_OF_QUESTIONS_TO_SELECT value: {}", count)
            })?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate rating settings
    if config.rating.default_rating_system.is_empty() {
        return Err(anyhow!("Default rating system cannot be empty"));
    }
    if !config.rating.default_learner_rating.is_finite() {
        return Err(anyhow!("Default learner rating must be finite"));
    }
    if !config.rating.default_question_rating.is_finite() {
        return Err(anyhow!("Default question rating must be finite"));
    }

    // Validate matchmaking settings
    if config.matchmaking.strategy.is_empty() {
        return Err(anyhow!("Matchmaking strategy cannot be empty"));
    }
    let p = config.matchmaking.user_win_probability;
    if !(p > 0.0 && p < 1.0) {
        return Err(anyhow!("User win probability must be strictly between 0 and 1"));
    }
    if config.matchmaking.number_of_questions_to_select == 0 {
        return Err(anyhow!("Number of questions to select must be greater than 0"));
    }

    // Validate level thresholds
    let levels = &config.levels.level_ratings;
    if levels.len() != LEVEL_COUNT {
        return Err(anyhow!(
            "Expected {} level ratings, got {}",
            LEVEL_COUNT,
            levels.len()
        ));
    }
    if levels.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(anyhow!("Level ratings must be strictly increasing"));
    }

    Ok(())
}
