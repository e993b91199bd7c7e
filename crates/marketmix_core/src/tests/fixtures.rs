//! Shared databases for the integration tests

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::{Activity, ActivityId, Exchange, ExchangeKind, Uncertainty};
use crate::source::{Database, ExchangeSource};

pub fn lognormal(median: f64, sigma: f64) -> Uncertainty {
    Uncertainty::Lognormal {
        loc: median.ln(),
        scale: sigma,
    }
}

pub fn supplier(id: u32, product: &str) -> Activity {
    Activity {
        id: ActivityId(id),
        name: format!("{product} production {id}"),
        reference_product: Some(product.to_string()),
        exchanges: vec![Exchange {
            input: ActivityId(id),
            output: ActivityId(id),
            amount: 1.0,
            uncertainty: Uncertainty::NoUncertainty,
            kind: ExchangeKind::Production,
        }],
    }
}

pub fn input(from: u32, to: u32, amount: f64, uncertainty: Uncertainty) -> Exchange {
    Exchange {
        input: ActivityId(from),
        output: ActivityId(to),
        amount,
        uncertainty,
        kind: ExchangeKind::Technosphere,
    }
}

pub fn consumer(id: u32, product: &str, inputs: Vec<Exchange>) -> Activity {
    Activity {
        id: ActivityId(id),
        name: format!("market for {product}"),
        reference_product: Some(product.to_string()),
        exchanges: inputs,
    }
}

/// One electricity market split 0.6 / 0.4 between suppliers 1 and 2, and a
/// steel consumer with supplier 3 as its only input.
pub fn two_supplier_database() -> Database {
    Database::from(vec![
        supplier(1, "electricity, high voltage"),
        supplier(2, "electricity, high voltage"),
        supplier(3, "steel, low-alloyed"),
        consumer(
            10,
            "electricity, high voltage",
            vec![
                input(1, 10, 0.6, lognormal(0.6, 0.1)),
                input(2, 10, 0.4, lognormal(0.4, 0.1)),
            ],
        ),
        consumer(
            20,
            "steel, low-alloyed",
            vec![input(3, 20, 1.0, Uncertainty::NoUncertainty)],
        ),
    ])
}

/// Counts full database scans so tests can tell whether detection ran.
pub struct CountingSource {
    inner: Database,
    scans: AtomicUsize,
}

impl CountingSource {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            scans: AtomicUsize::new(0),
        }
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}

impl ExchangeSource for CountingSource {
    fn activity_ids(&self) -> Vec<ActivityId> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.inner.activity_ids()
    }

    fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.inner.activity(id)
    }
}
