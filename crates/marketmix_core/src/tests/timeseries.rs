//! Markets derived from historical observations

use crate::config::GeneratorConfig;
use crate::model::{ActivityId, Index, SampleMatrix, Uncertainty};
use crate::pipeline::generate_timeseries_package;
use crate::source::{Database, TimeSeries};
use crate::store::MemoryStore;

use super::fixtures::{consumer, input, supplier};

fn grid_mix() -> (Database, TimeSeries) {
    let db = Database::from(vec![
        supplier(1, "electricity, low voltage"),
        supplier(2, "electricity, low voltage"),
        supplier(3, "electricity, low voltage"),
        consumer(
            10,
            "electricity, low voltage",
            vec![
                input(1, 10, 0.55, Uncertainty::Undefined),
                input(2, 10, 0.45, Uncertainty::Undefined),
                input(3, 10, 0.0, Uncertainty::Undefined),
            ],
        ),
    ]);
    let indices = vec![
        Index::new(ActivityId(1), ActivityId(10)),
        Index::new(ActivityId(2), ActivityId(10)),
        Index::new(ActivityId(3), ActivityId(10)),
    ];
    let values = SampleMatrix::from_rows(&[
        vec![0.50, 0.55, 0.60, 0.52, 0.58],
        vec![0.50, 0.45, 0.40, 0.48, 0.42],
        vec![0.0, 0.0, 0.0, 0.0, 0.0],
    ])
    .unwrap();
    (db, TimeSeries::new(indices, values).unwrap())
}

#[test]
fn test_timeseries_package() {
    let (db, series) = grid_mix();
    let config = GeneratorConfig {
        num_samples: 200,
        ..GeneratorConfig::new("entsoe")
    };

    let package = generate_timeseries_package(&MemoryStore::new(), &db, &series, &config).unwrap();

    // The constant series is fit as no uncertainty and stays out
    assert_eq!(
        package.indices,
        vec![
            Index::new(ActivityId(1), ActivityId(10)),
            Index::new(ActivityId(2), ActivityId(10)),
        ]
    );
    for draw in 0..200 {
        let sum = package.data.row(0)[draw] + package.data.row(1)[draw];
        assert!((sum - 1.0).abs() <= 1e-9);
    }
    // Fitted marginals give a real scale, so draws vary
    assert!(package.data.row(0).windows(2).any(|w| w[0] != w[1]));
}
