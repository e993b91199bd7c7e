//! Correlated sample generation for implicit LCA markets
//!
//! An implicit market is a set of alternative suppliers whose declared
//! shares to one consumer sum to about one. Sampling each supplier
//! independently breaks that constraint; this crate samples the shares
//! jointly from a Dirichlet distribution instead.
//!
//! The pipeline:
//! - detect markets in an exchange database ([`find_markets`]) or from a
//!   time series ([`find_timeseries_markets`], fitting marginals with
//!   [`fit_distributions`])
//! - derive a Dirichlet scale per market by matching the variance of the
//!   dominant suppliers ([`dirichlet_scales`])
//! - draw seeded, reproducible samples ([`generate_samples`]) and check
//!   that every draw keeps the market total ([`check_market_samples`])
//! - cache the result under `{name}-{seed}-{num_samples}`
//!   ([`generate_markets_package`])
//!
//! ```ignore
//! use marketmix_core::{DirStore, GeneratorConfig, generate_markets_package};
//!
//! let store = DirStore::new("cache");
//! let config = GeneratorConfig::new("implicit-markets");
//! let package = generate_markets_package(&store, &database, &config)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod detect;
pub mod error;
pub mod fit;
pub mod pipeline;
pub mod sample;
pub mod scale;
pub mod similarity;
pub mod source;
pub mod store;
pub mod validate;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::GeneratorConfig;
pub use detect::{DetectionConfig, find_markets, find_timeseries_markets};
pub use error::{PipelineError, Result};
pub use fit::{fit_distributions, fit_lognormal};
pub use pipeline::{generate_markets_package, generate_timeseries_package};
pub use sample::{DegenerateScalePolicy, SamplerConfig, generate_samples};
pub use scale::{DirichletScale, dirichlet_scale, dirichlet_scales};
pub use similarity::{FuzzySimilarity, Similarity};
pub use source::{Database, ExchangeSource, TimeSeries};
pub use store::{DirStore, MemoryStore, PackageKey, SampleStore};
pub use validate::check_market_samples;
