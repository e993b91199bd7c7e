//! Distribution fitting for observed series
//!
//! Fits a two-parameter lognormal (location pinned at zero) by maximum
//! likelihood. With the location fixed the estimator is closed form: the
//! log-space mean and the log-space population standard deviation.

use crate::error::FitError;
use crate::model::{Index, Uncertainty};
use crate::source::TimeSeries;

/// Fit an uncertainty distribution to one observed series.
///
/// Returns [`Uncertainty::NoUncertainty`] when the series has no positive
/// value or when every value is identical. Otherwise the lognormal is fit to
/// the positive values only and reported as `loc = ln(median)`,
/// `scale = shape`.
pub fn fit_lognormal(values: &[f64]) -> Result<Uncertainty, FitError> {
    let logs: Vec<f64> = values.iter().filter(|v| **v > 0.0).map(|v| v.ln()).collect();

    let constant = values.windows(2).all(|w| w[0] == w[1]);
    if logs.is_empty() || constant {
        return Ok(Uncertainty::NoUncertainty);
    }

    let n = logs.len() as f64;
    let loc = logs.iter().sum::<f64>() / n;
    let shape = (logs.iter().map(|l| (l - loc).powi(2)).sum::<f64>() / n).sqrt();

    if !loc.is_finite() || !shape.is_finite() {
        return Err(FitError::NonConvergence {
            shape,
            scale: loc.exp(),
        });
    }

    Ok(Uncertainty::Lognormal { loc, scale: shape })
}

/// Fit one distribution per row of a time series, keyed by its index.
pub fn fit_distributions(series: &TimeSeries) -> Result<Vec<(Index, Uncertainty)>, FitError> {
    series
        .iter()
        .map(|(index, values)| {
            let fitted = fit_lognormal(values)?;
            tracing::trace!(%index, kind = fitted.id(), "fitted distribution");
            Ok((index, fitted))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityId, SampleMatrix};

    #[test]
    fn test_constant_series_has_no_uncertainty() {
        assert_eq!(
            fit_lognormal(&[0.3, 0.3, 0.3]).unwrap(),
            Uncertainty::NoUncertainty
        );
    }

    #[test]
    fn test_non_positive_series_has_no_uncertainty() {
        assert_eq!(
            fit_lognormal(&[0.0, -1.0, -2.0]).unwrap(),
            Uncertainty::NoUncertainty
        );
        assert_eq!(fit_lognormal(&[]).unwrap(), Uncertainty::NoUncertainty);
    }

    #[test]
    fn test_lognormal_fit_matches_closed_form() {
        let values = [0.2, 0.4, 0.8];
        let fitted = fit_lognormal(&values).unwrap();

        // ln values are ln(0.4) - ln 2, ln(0.4), ln(0.4) + ln 2
        let expected_loc = 0.4_f64.ln();
        let expected_shape = (2.0_f64 / 3.0).sqrt() * 2.0_f64.ln();
        match fitted {
            Uncertainty::Lognormal { loc, scale } => {
                assert!((loc - expected_loc).abs() < 1e-12);
                assert!((scale - expected_shape).abs() < 1e-12);
            }
            other => panic!("expected lognormal, got {other:?}"),
        }
    }

    #[test]
    fn test_zeros_make_a_series_non_constant() {
        // Degeneracy is judged on the whole series, the fit on positives only
        assert_eq!(
            fit_lognormal(&[0.0, 0.5, 0.5]).unwrap(),
            Uncertainty::Lognormal {
                loc: 0.5_f64.ln(),
                scale: 0.0
            }
        );
        assert_eq!(
            fit_lognormal(&[0.0, 0.0, 0.7]).unwrap(),
            Uncertainty::Lognormal {
                loc: 0.7_f64.ln(),
                scale: 0.0
            }
        );
    }

    #[test]
    fn test_fit_ignores_non_positive_values() {
        let with_zeros = fit_lognormal(&[0.0, 0.2, 0.4, 0.8, 0.0]).unwrap();
        let without = fit_lognormal(&[0.2, 0.4, 0.8]).unwrap();
        assert_eq!(with_zeros, without);
    }

    #[test]
    fn test_fit_distributions_per_row() {
        let indices = vec![
            Index::new(ActivityId(1), ActivityId(3)),
            Index::new(ActivityId(2), ActivityId(3)),
        ];
        let values =
            SampleMatrix::from_rows(&[vec![0.5, 0.5, 0.5], vec![0.2, 0.3, 0.4]]).unwrap();
        let series = TimeSeries::new(indices.clone(), values).unwrap();

        let fitted = fit_distributions(&series).unwrap();
        assert_eq!(fitted.len(), 2);
        assert_eq!(fitted[0], (indices[0], Uncertainty::NoUncertainty));
        assert!(fitted[1].1.is_lognormal());
    }
}
