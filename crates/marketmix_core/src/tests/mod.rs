//! Integration tests for the sample generation pipeline
//!
//! Tests are organized by topic:
//! - `scenarios` - End-to-end market and constant-row packages
//! - `cache` - Package and market caching through the stores
//! - `properties` - Determinism and invariants across many markets
//! - `timeseries` - Markets fit from historical observations

mod fixtures;
mod timeseries;
