//! Implicit market detection
//!
//! A consumer's technosphere inputs are grouped by the supplier's reference
//! product. A group becomes a market when it has at least two exchanges, its
//! key is similar to the consumer's own reference product, and its declared
//! amounts sum to within the share band.
//!
//! Activities or exchanges with missing reference products or without a
//! declared distribution are skipped; these are expected gaps in the data.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::fit::fit_distributions;
use crate::model::{ActivityId, Exchange, Market, MarketSet, ShareBand};
use crate::similarity::{FuzzySimilarity, Similarity};
use crate::source::{ExchangeSource, TimeSeries};

/// Tunable detection policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub similarity: FuzzySimilarity,
    #[serde(default)]
    pub share_band: ShareBand,
}

/// Exchanges grouped by supplier reference product, in order of first
/// appearance.
#[derive(Default)]
struct Groups {
    groups: Vec<(String, Vec<Exchange>)>,
}

impl Groups {
    fn push(&mut self, key: &str, exc: Exchange) {
        match self.groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, list)) => list.push(exc),
            None => self.groups.push((key.to_string(), vec![exc])),
        }
    }

    /// Resolve the groups of one consumer into at most one market. When
    /// several groups qualify the last one wins.
    fn into_market<F: Similarity + ?Sized>(
        self,
        consumer: ActivityId,
        reference_product: &str,
        similarity: &F,
        band: &ShareBand,
    ) -> Option<Market> {
        let mut found = None;
        for (key, exchanges) in self.groups {
            if exchanges.len() < 2 || !similarity.similar(reference_product, &key) {
                continue;
            }
            match Market::new(consumer, exchanges, band) {
                Ok(market) => {
                    if found.is_some() {
                        tracing::debug!(%consumer, product = %key, "replacing earlier market group");
                    }
                    found = Some(market);
                }
                Err(e) => tracing::trace!(%consumer, product = %key, error = %e, "group rejected"),
            }
        }
        found
    }
}

fn detect_activity<S, F>(
    source: &S,
    consumer: ActivityId,
    similarity: &F,
    band: &ShareBand,
) -> Option<Market>
where
    S: ExchangeSource + ?Sized,
    F: Similarity + ?Sized,
{
    let rp = source.reference_product(consumer)?;

    let mut groups = Groups::default();
    for exc in source.technosphere(consumer) {
        if exc.is_self_loop() || !exc.uncertainty.is_uncertain() {
            continue;
        }
        let Some(key) = source.reference_product(exc.input) else {
            continue;
        };
        groups.push(key, exc.clone());
    }

    groups.into_market(consumer, rp, similarity, band)
}

/// Find all implicit markets in an exchange database.
///
/// The result depends only on the database content: markets are keyed by
/// consumer, so the order activities are visited in does not matter.
pub fn find_markets<S, F>(source: &S, similarity: &F, band: &ShareBand) -> MarketSet
where
    S: ExchangeSource + Sync + ?Sized,
    F: Similarity + Sync + ?Sized,
{
    let ids = source.activity_ids();

    #[cfg(feature = "parallel")]
    let markets: MarketSet = ids
        .par_iter()
        .filter_map(|id| detect_activity(source, *id, similarity, band))
        .collect::<Vec<_>>()
        .into();

    #[cfg(not(feature = "parallel"))]
    let markets: MarketSet = ids
        .iter()
        .filter_map(|id| detect_activity(source, *id, similarity, band))
        .collect();

    tracing::info!(
        activities = ids.len(),
        markets = markets.len(),
        "market detection finished"
    );
    markets
}

/// Find implicit markets among exchanges covered by a time series.
///
/// A distribution is fit to every series row and replaces the declared
/// uncertainty of the matching exchange. Only exchanges whose fitted
/// distribution is lognormal take part in grouping.
pub fn find_timeseries_markets<S, F>(
    source: &S,
    series: &TimeSeries,
    similarity: &F,
    band: &ShareBand,
) -> Result<MarketSet, FitError>
where
    S: ExchangeSource + ?Sized,
    F: Similarity + ?Sized,
{
    let fitted: HashMap<_, _> = fit_distributions(series)?.into_iter().collect();

    let mut markets = MarketSet::new();
    for consumer in series.consumers() {
        let Some(rp) = source.reference_product(consumer) else {
            continue;
        };
        let suppliers = series.suppliers(consumer);

        let mut groups = Groups::default();
        for exc in source.technosphere(consumer) {
            if !suppliers.contains(&exc.input) {
                continue;
            }
            let Some(uncertainty) = fitted.get(&exc.index()) else {
                continue;
            };
            if !uncertainty.is_lognormal() {
                continue;
            }
            let Some(key) = source.reference_product(exc.input) else {
                continue;
            };
            groups.push(key, exc.with_uncertainty(*uncertainty));
        }

        if let Some(market) = groups.into_market(consumer, rp, similarity, band) {
            markets.insert(market);
        }
    }

    tracing::info!(markets = markets.len(), "time series market detection finished");
    Ok(markets)
}
