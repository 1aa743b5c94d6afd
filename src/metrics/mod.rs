//! Metrics for the quiz-matchmaker
//!
//! This module provides Prometheus metrics for question selection, rating
//! updates and rating system configuration.

pub mod collector;

pub use collector::{
    ConfigurationMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, RatingMetrics,
    SelectionMetrics,
};
