//! Read-only data sources consumed by market detection
//!
//! The exchange database is abstracted behind [`ExchangeSource`] so that the
//! detector works against any store keyed by numeric activity ids.
//! [`Database`] is the in-memory implementation, loadable from YAML or JSON.
//! [`TimeSeries`] carries historical observations per supplier/consumer pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::model::{Activity, ActivityId, Exchange, ExchangeKind, Index, SampleMatrix};

/// Lookup interface over an exchange database.
pub trait ExchangeSource {
    /// All activity ids, in a stable order.
    fn activity_ids(&self) -> Vec<ActivityId>;

    fn activity(&self, id: ActivityId) -> Option<&Activity>;

    /// Non-empty reference product of an activity, if it has one.
    fn reference_product(&self, id: ActivityId) -> Option<&str> {
        self.activity(id).and_then(Activity::reference_product)
    }

    /// Technosphere input exchanges of an activity.
    fn technosphere(&self, id: ActivityId) -> Vec<&Exchange> {
        self.activity(id)
            .map(|act| {
                act.exchanges
                    .iter()
                    .filter(|e| e.kind == ExchangeKind::Technosphere)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// In-memory exchange database snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Activity>", into = "Vec<Activity>")]
pub struct Database {
    activities: BTreeMap<ActivityId, Activity>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, activity: Activity) {
        self.activities.insert(activity.id, activity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn get(&self, id: ActivityId) -> Result<&Activity, SourceError> {
        self.activities
            .get(&id)
            .ok_or(SourceError::ActivityNotFound(id))
    }
}

impl From<Vec<Activity>> for Database {
    fn from(activities: Vec<Activity>) -> Self {
        Self {
            activities: activities.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

impl From<Database> for Vec<Activity> {
    fn from(db: Database) -> Self {
        db.activities.into_values().collect()
    }
}

impl ExchangeSource for Database {
    fn activity_ids(&self) -> Vec<ActivityId> {
        self.activities.keys().copied().collect()
    }

    fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.get(&id)
    }
}

/// Historical observations: one row of `values` per index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    indices: Vec<Index>,
    values: SampleMatrix,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    indices: Vec<Index>,
    values: SampleMatrix,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = SourceError;

    fn try_from(raw: RawTimeSeries) -> Result<Self, Self::Error> {
        Self::new(raw.indices, raw.values)
    }
}

impl TimeSeries {
    pub fn new(indices: Vec<Index>, values: SampleMatrix) -> Result<Self, SourceError> {
        if indices.len() != values.rows() {
            return Err(SourceError::ShapeMismatch {
                indices: indices.len(),
                rows: values.rows(),
            });
        }
        Ok(Self { indices, values })
    }

    #[must_use]
    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    #[must_use]
    pub fn values(&self) -> &SampleMatrix {
        &self.values
    }

    /// Distinct consumer columns, ascending.
    #[must_use]
    pub fn consumers(&self) -> Vec<ActivityId> {
        let mut cols: Vec<_> = self.indices.iter().map(|i| i.col).collect();
        cols.sort();
        cols.dedup();
        cols
    }

    /// Suppliers observed for one consumer, ascending.
    #[must_use]
    pub fn suppliers(&self, consumer: ActivityId) -> Vec<ActivityId> {
        let mut rows: Vec<_> = self
            .indices
            .iter()
            .filter(|i| i.col == consumer)
            .map(|i| i.row)
            .collect();
        rows.sort();
        rows
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &[f64])> {
        self.indices.iter().copied().zip(self.values.iter_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Uncertainty;

    fn activity(id: u32, rp: Option<&str>, exchanges: Vec<Exchange>) -> Activity {
        Activity {
            id: ActivityId(id),
            name: format!("activity {id}"),
            reference_product: rp.map(str::to_string),
            exchanges,
        }
    }

    #[test]
    fn test_technosphere_filters_by_kind() {
        let production = Exchange {
            input: ActivityId(1),
            output: ActivityId(1),
            amount: 1.0,
            uncertainty: Uncertainty::Undefined,
            kind: ExchangeKind::Production,
        };
        let input = Exchange {
            input: ActivityId(2),
            kind: ExchangeKind::Technosphere,
            ..production.clone()
        };
        let emission = Exchange {
            input: ActivityId(3),
            kind: ExchangeKind::Biosphere,
            ..production.clone()
        };
        let db = Database::from(vec![activity(1, Some("x"), vec![production, input, emission])]);

        let techno = db.technosphere(ActivityId(1));
        assert_eq!(techno.len(), 1);
        assert_eq!(techno[0].input, ActivityId(2));
        assert!(db.technosphere(ActivityId(42)).is_empty());
    }

    #[test]
    fn test_empty_reference_product_is_absent() {
        let db = Database::from(vec![activity(1, Some(""), vec![]), activity(2, None, vec![])]);
        assert_eq!(db.reference_product(ActivityId(1)), None);
        assert_eq!(db.reference_product(ActivityId(2)), None);
        assert!(db.get(ActivityId(3)).is_err());
    }

    #[test]
    fn test_time_series_shape_is_checked() {
        let values = SampleMatrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let indices = vec![
            Index::new(ActivityId(1), ActivityId(9)),
            Index::new(ActivityId(2), ActivityId(9)),
        ];
        assert_eq!(
            TimeSeries::new(indices, values),
            Err(SourceError::ShapeMismatch {
                indices: 2,
                rows: 1
            })
        );
    }

    #[test]
    fn test_time_series_shape_is_checked_on_load() {
        let json = r#"{
            "indices": [{"row": 1, "col": 9}, {"row": 2, "col": 9}],
            "values": {"rows": 1, "cols": 2, "data": [1.0, 2.0]}
        }"#;
        let err = serde_json::from_str::<TimeSeries>(json).unwrap_err();
        assert!(err.to_string().contains("2 indices but 1 value rows"));
    }

    #[test]
    fn test_time_series_consumers_and_suppliers() {
        let values = SampleMatrix::zeros(3, 4);
        let indices = vec![
            Index::new(ActivityId(5), ActivityId(9)),
            Index::new(ActivityId(1), ActivityId(7)),
            Index::new(ActivityId(2), ActivityId(9)),
        ];
        let ts = TimeSeries::new(indices, values).unwrap();
        assert_eq!(ts.consumers(), vec![ActivityId(7), ActivityId(9)]);
        assert_eq!(ts.suppliers(ActivityId(9)), vec![ActivityId(2), ActivityId(5)]);
    }
}
