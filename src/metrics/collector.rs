//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for question selection, rating
//! updates and configuration handling using Prometheus metrics.

use crate::types::Outcome;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Question selection metrics
    selection_metrics: SelectionMetrics,

    /// Rating update metrics
    rating_metrics: RatingMetrics,

    /// Configuration and persistence metrics
    configuration_metrics: ConfigurationMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Question selection metrics
#[derive(Clone)]
pub struct SelectionMetrics {
    /// Selections by result (selected, empty)
    pub selections_total: IntCounterVec,

    /// Number of candidates the random pick was drawn from
    pub candidate_pool_size: Histogram,
}

/// Rating update metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Rating updates by outcome
    pub rating_updates_total: IntCounterVec,

    /// Distribution of learner ratings after an update
    pub learner_rating_distribution: Histogram,

    /// Learners reaching a new level
    pub level_ups_total: IntCounter,

    /// Question-versus-question updates
    pub question_victories_total: IntCounter,
}

/// Configuration and persistence metrics
#[derive(Clone)]
pub struct ConfigurationMetrics {
    /// Stored configurations that could not be read and fell back to defaults
    pub fallbacks_total: IntCounter,

    /// Rating system selections and reconfigurations by system
    pub changes_total: IntCounterVec,

    /// Failed store operations by operation
    pub persistence_failures_total: IntCounterVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent selecting the next question
    pub selection_duration: Histogram,

    /// Time spent recording an attempt outcome
    pub outcome_duration: Histogram,

    /// Store operation durations
    pub store_operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let selection_metrics = SelectionMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let configuration_metrics = ConfigurationMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            selection_metrics,
            rating_metrics,
            configuration_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get metrics as Prometheus text format
    pub fn export_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        TextEncoder::new()
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }

    pub fn selection(&self) -> &SelectionMetrics {
        &self.selection_metrics
    }

    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    pub fn configuration(&self) -> &ConfigurationMetrics {
        &self.configuration_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record one question selection
    pub fn record_selection(&self, selected: bool, candidates: usize, duration: Duration) {
        let result = if selected { "selected" } else { "empty" };

        self.selection_metrics
            .selections_total
            .with_label_values(&[result])
            .inc();

        self.selection_metrics
            .candidate_pool_size
            .observe(candidates as f64);

        self.performance_metrics
            .selection_duration
            .observe(duration.as_secs_f64());
    }

    /// Record one rating update
    pub fn record_rating_update(&self, outcome: Outcome, learner_rating: f64, duration: Duration) {
        let outcome_str = match outcome {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
        };

        self.rating_metrics
            .rating_updates_total
            .with_label_values(&[outcome_str])
            .inc();

        self.rating_metrics
            .learner_rating_distribution
            .observe(learner_rating);

        self.performance_metrics
            .outcome_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a learner reaching a new level
    pub fn record_level_up(&self) {
        self.rating_metrics.level_ups_total.inc();
    }

    /// Record a question-versus-question update
    pub fn record_question_victory(&self) {
        self.rating_metrics.question_victories_total.inc();
    }

    /// Record a stored configuration falling back to defaults
    pub fn record_configuration_fallback(&self) {
        self.configuration_metrics.fallbacks_total.inc();
    }

    /// Record a rating system selection or reconfiguration
    pub fn record_configuration_change(&self, rating_system: &str) {
        self.configuration_metrics
            .changes_total
            .with_label_values(&[rating_system])
            .inc();
    }

    /// Record a failed store operation
    pub fn record_persistence_failure(&self, operation: &str) {
        self.configuration_metrics
            .persistence_failures_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record store operation duration
    pub fn record_store_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .store_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::start()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    /// Start timing now, with or without a collector at hand
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl SelectionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let selections_total = IntCounterVec::new(
            Opts::new(
                "quiz_matchmaker_selections_total",
                "Question selections by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(selections_total.clone()))?;

        let candidate_pool_size = Histogram::with_opts(
            HistogramOpts::new(
                "quiz_matchmaker_candidate_pool_size",
                "Number of candidates per selection",
            )
            .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
        )?;
        registry.register(Box::new(candidate_pool_size.clone()))?;

        Ok(Self {
            selections_total,
            candidate_pool_size,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_updates_total = IntCounterVec::new(
            Opts::new(
                "quiz_matchmaker_rating_updates_total",
                "Rating updates by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(rating_updates_total.clone()))?;

        let learner_rating_distribution = Histogram::with_opts(
            HistogramOpts::new(
                "quiz_matchmaker_learner_rating",
                "Learner rating after an update",
            )
            .buckets(vec![
                600.0, 800.0, 1000.0, 1200.0, 1400.0, 1600.0, 1800.0, 2000.0, 2400.0,
            ]),
        )?;
        registry.register(Box::new(learner_rating_distribution.clone()))?;

        let level_ups_total = IntCounter::new(
            "quiz_matchmaker_level_ups_total",
            "Learners reaching a new level",
        )?;
        registry.register(Box::new(level_ups_total.clone()))?;

        let question_victories_total = IntCounter::new(
            "quiz_matchmaker_question_victories_total",
            "Question-versus-question rating updates",
        )?;
        registry.register(Box::new(question_victories_total.clone()))?;

        Ok(Self {
            rating_updates_total,
            learner_rating_distribution,
            level_ups_total,
            question_victories_total,
        })
    }
}

impl ConfigurationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let fallbacks_total = IntCounter::new(
            "quiz_matchmaker_configuration_fallbacks_total",
            "Unreadable configurations replaced by defaults",
        )?;
        registry.register(Box::new(fallbacks_total.clone()))?;

        let changes_total = IntCounterVec::new(
            Opts::new(
                "quiz_matchmaker_configuration_changes_total",
                "Rating system selections and reconfigurations",
            ),
            &["rating_system"],
        )?;
        registry.register(Box::new(changes_total.clone()))?;

        let persistence_failures_total = IntCounterVec::new(
            Opts::new(
                "quiz_matchmaker_persistence_failures_total",
                "Failed store operations",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(persistence_failures_total.clone()))?;

        Ok(Self {
            fallbacks_total,
            changes_total,
            persistence_failures_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let selection_duration = Histogram::with_opts(
            HistogramOpts::new(
                "quiz_matchmaker_selection_duration_seconds",
                "Time spent selecting the next question",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(selection_duration.clone()))?;

        let outcome_duration = Histogram::with_opts(
            HistogramOpts::new(
                "quiz_matchmaker_outcome_duration_seconds",
                "Time spent recording an attempt outcome",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(outcome_duration.clone()))?;

        let store_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "quiz_matchmaker_store_operation_duration_seconds",
                "Store operation durations",
            )
            .buckets(vec![0.0001, 0.001, 0.01, 0.1, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(store_operation_duration.clone()))?;

        Ok(Self {
            selection_duration,
            outcome_duration,
            store_operation_duration,
        })
    }
}
