//! # Wattbook
//!
//! Household electricity cost tracking from the command line.
//!
//! ## Overview
//!
//! Two independent calculators share one storage layer:
//! - The equipment calculator prices a day from each appliance's wattage and
//!   hours of use, and keeps one history record per date
//! - The meter tracker prices the interval between two meter readings, with
//!   a service fee and a minimum charge, and keeps an append-only reading log
//!
//! Calculator data lives in a pluggable [`store::Store`]: a local SQLite
//! file, a REST API, or a document store that is not configured in this
//! build. Meter data always lives in the local store.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing and configuration
pub mod cli;

/// Display formatting for text and JSON output
pub mod display;

/// Meter interval billing and the reading log
pub mod meter;

/// Data models for equipment, history records, settings and export files
pub mod models;

/// Energy and cost arithmetic
pub mod pricing;

/// Typed persistence and whole-dataset operations
pub mod service;

/// Storage backends
pub mod store;

/// Equipment calculator state and operations
pub mod usage;

/// Formatting, ids and date helpers
pub mod utils;
