//! Reading ingestion and classification for the Troutwatch dashboard.
//!
//! This crate owns everything that turns the data producer's text dump
//! into typed values the dashboard can render. It has no knowledge of
//! tiles, HTTP, or the producer process.
//!
//! # Modules
//!
//! - [`reading`] -- Line-oriented `Name = value [unit]` parser.
//! - [`zone`] -- Threshold zone classification and the three-stop
//!   gradient used by the alert tiles.
//! - [`matcher`] -- Pluggable predicates that pick "the" water or air
//!   reading out of a free-text sensor list.
//! - [`config`] -- Configuration loading from `troutwatch.yaml` into
//!   strongly-typed structs.

pub mod config;
pub mod matcher;
pub mod reading;
pub mod zone;

pub use matcher::SensorMatcher;
pub use reading::{Reading, parse_line, parse_readings};
pub use zone::{DisplayRange, Gradient, Thresholds, Zone, classify, gradient};
