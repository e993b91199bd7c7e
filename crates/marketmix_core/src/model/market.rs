use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::exchange::Exchange;
use super::ids::{ActivityId, Index};
use crate::error::MarketError;

/// Accepted range for the sum of declared shares of one market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareBand {
    pub min: f64,
    pub max: f64,
}

impl Default for ShareBand {
    fn default() -> Self {
        Self {
            min: 0.98,
            max: 1.02,
        }
    }
}

impl ShareBand {
    #[must_use]
    pub fn contains(&self, total: f64) -> bool {
        self.min <= total && total <= self.max
    }
}

/// An implicit market: alternative suppliers of one reference product to a
/// single consumer, whose declared shares sum to roughly one.
///
/// Exchange order is kept as found; it only affects the order in which
/// scaling factors are averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    consumer: ActivityId,
    exchanges: Vec<Exchange>,
}

impl Market {
    pub fn new(
        consumer: ActivityId,
        exchanges: Vec<Exchange>,
        band: &ShareBand,
    ) -> Result<Self, MarketError> {
        if exchanges.len() < 2 {
            return Err(MarketError::TooFewExchanges {
                consumer,
                count: exchanges.len(),
            });
        }

        let mut seen = Vec::with_capacity(exchanges.len());
        for exc in &exchanges {
            if exc.output != consumer {
                return Err(MarketError::ForeignExchange {
                    consumer,
                    index: exc.index(),
                });
            }
            if seen.contains(&exc.input) {
                return Err(MarketError::DuplicateSupplier {
                    consumer,
                    supplier: exc.input,
                });
            }
            seen.push(exc.input);
        }

        let total: f64 = exchanges.iter().map(|e| e.amount).sum();
        if !band.contains(total) {
            return Err(MarketError::SharesOutOfBand { consumer, total });
        }

        Ok(Self {
            consumer,
            exchanges,
        })
    }

    #[must_use]
    pub fn consumer(&self) -> ActivityId {
        self.consumer
    }

    #[must_use]
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Always false; a market holds at least two exchanges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    #[must_use]
    pub fn amounts(&self) -> Vec<f64> {
        self.exchanges.iter().map(|e| e.amount).collect()
    }

    #[must_use]
    pub fn total_amount(&self) -> f64 {
        self.exchanges.iter().map(|e| e.amount).sum()
    }

    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.exchanges.iter().map(Exchange::index)
    }
}

/// Markets keyed by consumer.
///
/// Iteration is in ascending consumer order, so anything derived from the
/// iteration order (sub-seeds, index layout) depends only on content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Market>", into = "Vec<Market>")]
pub struct MarketSet {
    markets: BTreeMap<ActivityId, Market>,
}

impl MarketSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a market, replacing any earlier market for the same consumer.
    pub fn insert(&mut self, market: Market) -> Option<Market> {
        self.markets.insert(market.consumer, market)
    }

    #[must_use]
    pub fn get(&self, consumer: ActivityId) -> Option<&Market> {
        self.markets.get(&consumer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    pub fn consumers(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.markets.keys().copied()
    }

    /// Every exchange index covered by the set, market by market.
    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.markets.values().flat_map(Market::indices)
    }
}

impl From<Vec<Market>> for MarketSet {
    fn from(markets: Vec<Market>) -> Self {
        markets.into_iter().collect()
    }
}

impl From<MarketSet> for Vec<Market> {
    fn from(set: MarketSet) -> Self {
        set.markets.into_values().collect()
    }
}

impl FromIterator<Market> for MarketSet {
    fn from_iter<I: IntoIterator<Item = Market>>(iter: I) -> Self {
        let mut set = MarketSet::new();
        for market in iter {
            set.insert(market);
        }
        set
    }
}
