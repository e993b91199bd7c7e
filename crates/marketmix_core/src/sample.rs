//! Correlated sampling of implicit markets
//!
//! Draw order is load-bearing for reproducibility and runs in three steps:
//!
//! 1. seed one generator with the run seed;
//! 2. draw one 32-bit sub-seed per market, in ascending consumer order;
//! 3. for each market, seed a fresh generator with its sub-seed and draw
//!    `num_samples` Dirichlet vectors.
//!
//! Step 2 is serial. Step 3 touches only the market's own rows and runs in
//! parallel under the `parallel` feature.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Gamma};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;
use crate::model::{ActivityId, Exchange, Index, Market, MarketSet, SampleMatrix, SamplePackage};
use crate::scale::DirichletScale;
use crate::validate::check_market_samples;

/// Below this largest concentration, gamma variates underflow to zero and
/// draws switch to stick-breaking.
const SMALL_ALPHA: f64 = 0.1;

/// What to do with a market whose Dirichlet scale is degenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateScalePolicy {
    /// Fail the run
    Reject,
    /// Replicate the declared amounts across every draw
    #[default]
    DeclaredShares,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub num_samples: usize,
    pub seed: u64,
    #[serde(default)]
    pub degenerate_scale: DegenerateScalePolicy,
}

/// Derive one sub-seed per market from the run seed.
///
/// The global generator is seeded once with `seed`; sub-seeds are then
/// drawn uniformly from `0..u32::MAX` in ascending consumer order. The
/// result depends only on `seed` and the set of consumers.
#[must_use]
pub fn derive_sub_seeds(seed: u64, markets: &MarketSet) -> Vec<(ActivityId, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    markets
        .consumers()
        .map(|consumer| (consumer, rng.random_range(0..u32::MAX)))
        .collect()
}

/// Per-component distributions of one Dirichlet.
enum DirichletDraw {
    /// Normalised `Gamma(alpha_i, 1)` variates
    Gamma(Vec<Gamma<f64>>),
    /// `Beta(alpha_i, sum(alpha_{i+1..}))` fractions of the remaining stick
    StickBreaking(Vec<Beta<f64>>),
}

impl DirichletDraw {
    fn new(alpha: &[f64]) -> Option<Self> {
        let max = alpha.iter().copied().fold(0.0, f64::max);
        if max < SMALL_ALPHA {
            // tails[i] = sum of alpha[i + 1..]
            let mut tails = vec![0.0; alpha.len()];
            let mut rest = 0.0;
            for (tail, a) in tails.iter_mut().zip(alpha).rev() {
                *tail = rest;
                rest += a;
            }
            let betas = alpha
                .iter()
                .zip(&tails)
                .take(alpha.len().saturating_sub(1))
                .map(|(a, tail)| Beta::new(*a, *tail).ok())
                .collect::<Option<Vec<_>>>()?;
            Some(DirichletDraw::StickBreaking(betas))
        } else {
            let gammas = alpha
                .iter()
                .map(|a| Gamma::new(*a, 1.0).ok())
                .collect::<Option<Vec<_>>>()?;
            Some(DirichletDraw::Gamma(gammas))
        }
    }

    /// Fill `out` with one draw. Returns `false` if the draw is unusable.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) -> bool {
        match self {
            DirichletDraw::Gamma(gammas) => {
                let mut sum = 0.0;
                for (x, g) in out.iter_mut().zip(gammas) {
                    *x = g.sample(rng);
                    sum += *x;
                }
                if !(sum > 0.0 && sum.is_finite()) {
                    return false;
                }
                out.iter_mut().for_each(|x| *x /= sum);
            }
            DirichletDraw::StickBreaking(betas) => {
                let mut stick = 1.0;
                for (x, b) in out.iter_mut().zip(betas) {
                    *x = stick * b.sample(rng);
                    stick -= *x;
                }
                if let Some(last) = out.last_mut() {
                    *last = stick;
                }
            }
        }
        out.iter().all(|x| x.is_finite())
    }
}

/// Draw `num_samples` vectors from `Dirichlet(alpha)`.
///
/// The result is laid out per component: `result[i][k]` is component `i`
/// of draw `k`. Returns `None` for a non-positive concentration or a draw
/// that is not a finite probability vector.
pub fn sample_dirichlet<R: Rng + ?Sized>(
    rng: &mut R,
    alpha: &[f64],
    num_samples: usize,
) -> Option<Vec<Vec<f64>>> {
    let dist = DirichletDraw::new(alpha)?;

    let mut rows = vec![Vec::with_capacity(num_samples); alpha.len()];
    let mut draw = vec![0.0; alpha.len()];
    for _ in 0..num_samples {
        if !dist.draw(rng, &mut draw) {
            return None;
        }
        for (row, x) in rows.iter_mut().zip(&draw) {
            row.push(*x);
        }
    }
    Some(rows)
}

/// Sample one market: rows aligned with the market's exchanges.
fn sample_market(
    market: &Market,
    scale: &DirichletScale,
    sub_seed: u32,
    config: &SamplerConfig,
) -> Result<Vec<Vec<f64>>, SampleError> {
    let consumer = market.consumer();
    let amounts = market.amounts();
    let total = market.total_amount();

    let scale = match (*scale, config.degenerate_scale) {
        (DirichletScale::Fitted(value), _) => value,
        (DirichletScale::Degenerate { reason, .. }, DegenerateScalePolicy::Reject) => {
            return Err(SampleError::DegenerateScale { consumer, reason });
        }
        (DirichletScale::Degenerate { reason, .. }, DegenerateScalePolicy::DeclaredShares) => {
            tracing::warn!(%consumer, %reason, "sampling declared shares for degenerate market");
            return Ok(amounts
                .iter()
                .map(|a| vec![*a; config.num_samples])
                .collect());
        }
    };

    let alpha: Vec<f64> = amounts.iter().map(|a| a * scale).collect();
    if let Some(bad) = alpha.iter().find(|a| !(a.is_finite() && **a > 0.0)) {
        return Err(SampleError::InvalidConcentration {
            consumer,
            alpha: *bad,
        });
    }

    let mut rng = StdRng::seed_from_u64(u64::from(sub_seed));
    let mut rows = sample_dirichlet(&mut rng, &alpha, config.num_samples).ok_or(
        SampleError::InvalidConcentration {
            consumer,
            alpha: alpha.iter().copied().fold(f64::INFINITY, f64::min),
        },
    )?;

    for row in &mut rows {
        row.iter_mut().for_each(|x| *x *= total);
    }

    tracing::debug!(%consumer, scale, sub_seed, "sampled market");
    Ok(rows)
}

/// Generate the sample package for a set of markets.
///
/// Market exchanges get Dirichlet rows, `extra` exchanges (inputs outside
/// any market) get their declared amount replicated across every draw.
/// The package is validated before it is returned.
pub fn generate_samples(
    name: &str,
    markets: &MarketSet,
    scales: &BTreeMap<ActivityId, DirichletScale>,
    extra: &[Exchange],
    config: &SamplerConfig,
) -> Result<SamplePackage, SampleError> {
    let mut seen = HashSet::new();
    for index in markets.indices().chain(extra.iter().map(Exchange::index)) {
        if !seen.insert(index) {
            return Err(SampleError::DuplicateIndex(index));
        }
    }

    let mut jobs = Vec::with_capacity(markets.len());
    for (consumer, sub_seed) in derive_sub_seeds(config.seed, markets) {
        let market = markets
            .get(consumer)
            .ok_or(SampleError::MissingScale(consumer))?;
        let scale = scales
            .get(&consumer)
            .ok_or(SampleError::MissingScale(consumer))?;
        jobs.push((market, scale, sub_seed));
    }

    #[cfg(feature = "parallel")]
    let sampled: Vec<Vec<Vec<f64>>> = jobs
        .par_iter()
        .map(|(market, scale, sub_seed)| sample_market(market, scale, *sub_seed, config))
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let sampled: Vec<Vec<Vec<f64>>> = jobs
        .iter()
        .map(|(market, scale, sub_seed)| sample_market(market, scale, *sub_seed, config))
        .collect::<Result<_, _>>()?;

    let num_rows = seen.len();
    let mut indices: Vec<Index> = Vec::with_capacity(num_rows);
    let mut flip = Vec::with_capacity(num_rows);
    let mut data = SampleMatrix::zeros(num_rows, config.num_samples);

    for ((market, _, _), rows) in jobs.iter().zip(sampled) {
        for (exc, row) in market.exchanges().iter().zip(rows) {
            data.row_mut(indices.len()).copy_from_slice(&row);
            indices.push(exc.index());
            flip.push(exc.flip());
        }
    }

    for exc in extra {
        data.row_mut(indices.len()).fill(exc.amount);
        indices.push(exc.index());
        flip.push(exc.flip());
    }

    let package = SamplePackage {
        name: name.to_string(),
        seed: config.seed,
        num_samples: config.num_samples,
        indices,
        data,
        flip,
    };

    check_market_samples(markets, &package)?;
    Ok(package)
}
