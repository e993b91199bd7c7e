//! Post-condition check on generated samples
//!
//! Within each market the per-draw sum over its exchanges must be the same
//! for every draw. A failure means the sampler or the scale solver is
//! broken and the package must not be used.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::model::{MarketSet, SamplePackage};

const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

/// Approximate equality with the tolerances of numpy's `allclose`.
#[must_use]
#[inline]
pub fn all_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Check that every market's per-draw sums are constant.
pub fn check_market_samples(
    markets: &MarketSet,
    package: &SamplePackage,
) -> Result<(), ValidationError> {
    let positions: HashMap<_, _> = package
        .indices
        .iter()
        .enumerate()
        .map(|(row, index)| (*index, row))
        .collect();

    for market in markets.iter() {
        let rows = market
            .indices()
            .map(|index| {
                positions
                    .get(&index)
                    .copied()
                    .ok_or(ValidationError::MissingIndex(index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut sums = vec![0.0; package.data.cols()];
        for row in rows {
            for (sum, x) in sums.iter_mut().zip(package.data.row(row)) {
                *sum += x;
            }
        }

        if sums.is_empty() {
            continue;
        }

        let min = sums.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let finite = sums.iter().all(|s| s.is_finite());
        if !finite || !all_close(min, max) {
            return Err(ValidationError::NonConstantSum {
                consumer: market.consumer(),
                min,
                max,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActivityId, Exchange, ExchangeKind, Index, Market, SampleMatrix, ShareBand, Uncertainty,
    };

    fn markets() -> MarketSet {
        let exchanges = [(1, 0.5), (2, 0.5)]
            .iter()
            .map(|(input, amount)| Exchange {
                input: ActivityId(*input),
                output: ActivityId(9),
                amount: *amount,
                uncertainty: Uncertainty::Undefined,
                kind: ExchangeKind::Technosphere,
            })
            .collect();
        vec![Market::new(ActivityId(9), exchanges, &ShareBand::default()).unwrap()].into()
    }

    fn package(rows: &[Vec<f64>]) -> SamplePackage {
        SamplePackage {
            name: "test".to_string(),
            seed: 0,
            num_samples: rows[0].len(),
            indices: vec![
                Index::new(ActivityId(1), ActivityId(9)),
                Index::new(ActivityId(2), ActivityId(9)),
            ],
            data: SampleMatrix::from_rows(rows).unwrap(),
            flip: vec![true, true],
        }
    }

    #[test]
    fn test_constant_sums_pass() {
        let p = package(&[vec![0.3, 0.7, 0.1], vec![0.7, 0.3, 0.9]]);
        assert_eq!(check_market_samples(&markets(), &p), Ok(()));
    }

    #[test]
    fn test_varying_sums_fail() {
        let p = package(&[vec![0.3, 0.7], vec![0.7, 0.2]]);
        assert!(matches!(
            check_market_samples(&markets(), &p),
            Err(ValidationError::NonConstantSum { .. })
        ));
    }

    #[test]
    fn test_nan_sums_fail() {
        let p = package(&[vec![f64::NAN, f64::NAN], vec![0.5, 0.5]]);
        assert!(check_market_samples(&markets(), &p).is_err());
    }

    #[test]
    fn test_missing_index_fails() {
        let mut p = package(&[vec![0.5], vec![0.5]]);
        p.indices[1] = Index::new(ActivityId(3), ActivityId(9));
        assert_eq!(
            check_market_samples(&markets(), &p),
            Err(ValidationError::MissingIndex(Index::new(
                ActivityId(2),
                ActivityId(9)
            )))
        );
    }

    #[test]
    fn test_all_close() {
        assert!(all_close(1.0, 1.0 + 1e-9));
        assert!(!all_close(1.0, 1.001));
    }
}
