//! Common types and utilities shared by the tyrel crates.
//!
//! This crate provides:
//! - Centralized limits and thresholds (`limits`)
//! - Analyzer configuration (`AnalyzerOptions`)
//! - Tracing subscriber bootstrap (`tracing_config`)

// Centralized limits and thresholds
pub mod limits;

// Analyzer configuration
pub mod options;
pub use options::AnalyzerOptions;

// Tracing subscriber setup driven by TYREL_LOG / TYREL_LOG_FORMAT
pub mod tracing_config;
pub use tracing_config::{LogFormat, init_tracing};
