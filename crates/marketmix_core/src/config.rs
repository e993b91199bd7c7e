//! Run configuration for package generation

use serde::{Deserialize, Serialize};

use crate::detect::DetectionConfig;
use crate::model::AmountShift;
use crate::sample::{DegenerateScalePolicy, SamplerConfig};
use crate::store::PackageKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Package name, the first part of every cache key
    pub name: String,

    /// Number of Monte Carlo draws per sampled index
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub degenerate_scale: DegenerateScalePolicy,

    /// Also emit every technosphere exchange outside a market as a
    /// constant row
    #[serde(default)]
    pub include_non_market: bool,

    /// Value written into non-market constant rows
    #[serde(default)]
    pub non_market_amount: AmountShift,
}

fn default_num_samples() -> usize {
    2000
}

fn default_seed() -> u64 {
    42
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_samples: default_num_samples(),
            seed: default_seed(),
            detection: DetectionConfig::default(),
            degenerate_scale: DegenerateScalePolicy::default(),
            include_non_market: false,
            non_market_amount: AmountShift::default(),
        }
    }

    #[must_use]
    pub fn package_key(&self) -> PackageKey {
        PackageKey::new(self.name.clone(), self.seed, self.num_samples)
    }

    #[must_use]
    pub fn sampler(&self) -> SamplerConfig {
        SamplerConfig {
            num_samples: self.num_samples,
            seed: self.seed,
            degenerate_scale: self.degenerate_scale,
        }
    }
}
