//! End-to-end package generation
//!
//! detect -> scale -> sample -> validate -> store. The package is looked up
//! by `{name}-{seed}-{num_samples}` first; on a hit nothing else runs. The
//! detected market set is cached under its own key, so a new seed or sample
//! count reuses it.

use std::collections::HashSet;

use crate::config::GeneratorConfig;
use crate::detect::{find_markets, find_timeseries_markets};
use crate::error::Result;
use crate::model::{Exchange, MarketSet, SamplePackage};
use crate::sample::generate_samples;
use crate::scale::dirichlet_scales;
use crate::source::{ExchangeSource, TimeSeries};
use crate::store::{SampleStore, markets_key};

/// Technosphere exchanges of the source that belong to no market, once per
/// index.
pub fn non_market_exchanges<S>(source: &S, markets: &MarketSet) -> Vec<Exchange>
where
    S: ExchangeSource + ?Sized,
{
    let mut seen: HashSet<_> = markets.indices().collect();
    let mut extra = Vec::new();
    for id in source.activity_ids() {
        for exc in source.technosphere(id) {
            if seen.insert(exc.index()) {
                extra.push(exc.clone());
            } else {
                tracing::trace!(index = %exc.index(), "skipping already sampled index");
            }
        }
    }
    extra
}

fn generate_package<St, S, D>(
    store: &St,
    source: &S,
    config: &GeneratorConfig,
    detect: D,
) -> Result<SamplePackage>
where
    St: SampleStore,
    S: ExchangeSource + ?Sized,
    D: FnOnce() -> Result<MarketSet>,
{
    let key = config.package_key().file_name();
    store.get_or_compute(&key, || {
        let markets: MarketSet = store.get_or_compute(&markets_key(&config.name), detect)?;
        let scales = dirichlet_scales(&markets);

        let extra = if config.include_non_market {
            non_market_exchanges(source, &markets)
                .into_iter()
                .map(|exc| Exchange {
                    amount: exc.shifted_amount(config.non_market_amount),
                    ..exc
                })
                .collect()
        } else {
            Vec::new()
        };

        let package =
            generate_samples(&config.name, &markets, &scales, &extra, &config.sampler())?;
        tracing::info!(
            name = %config.name,
            markets = markets.len(),
            rows = package.indices.len(),
            num_samples = package.num_samples,
            "generated sample package"
        );
        Ok(package)
    })
}

/// Generate (or load) the sample package of the implicit markets in a
/// database.
pub fn generate_markets_package<St, S>(
    store: &St,
    source: &S,
    config: &GeneratorConfig,
) -> Result<SamplePackage>
where
    St: SampleStore,
    S: ExchangeSource + Sync + ?Sized,
{
    generate_package(store, source, config, || {
        let detection = &config.detection;
        Ok(find_markets(
            source,
            &detection.similarity,
            &detection.share_band,
        ))
    })
}

/// Like [`generate_markets_package`], with markets and their marginals
/// derived from a time series.
pub fn generate_timeseries_package<St, S>(
    store: &St,
    source: &S,
    series: &TimeSeries,
    config: &GeneratorConfig,
) -> Result<SamplePackage>
where
    St: SampleStore,
    S: ExchangeSource + ?Sized,
{
    generate_package(store, source, config, || {
        let detection = &config.detection;
        Ok(find_timeseries_markets(
            source,
            series,
            &detection.similarity,
            &detection.share_band,
        )?)
    })
}
