//! Dirichlet scale derivation by moment matching
//!
//! For a market with declared shares `a_i` and total `beta`, the Dirichlet
//! with concentration `a_i * s` gives supplier `i` the marginal
//! Beta(`a_i * s`, `(beta - a_i) * s`). The scale `s` is chosen so that this
//! variance matches the variance of each dominant supplier's own lognormal
//! marginal. Per-supplier factors `2 * Var_beta(a_i, beta - a_i) / Var_ln`
//! are averaged; suppliers below the mean share are left out because their
//! individual variances are dominated by noise.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::beta_variance;
use crate::model::{ActivityId, Exchange, Market, MarketSet};

/// Why a market has no usable scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// No dominant supplier with a lognormal marginal
    NoCandidates,
    /// Every candidate has zero marginal variance
    ZeroVariance,
    /// The averaged factor is not finite
    NonFinite,
    /// The averaged factor is zero or negative
    NonPositive,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::NoCandidates => write!(f, "no dominant lognormal supplier"),
            Degeneracy::ZeroVariance => write!(f, "all candidate variances are zero"),
            Degeneracy::NonFinite => write!(f, "scale is not finite"),
            Degeneracy::NonPositive => write!(f, "scale is not positive"),
        }
    }
}

/// Result of the scale solver for one market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirichletScale {
    Fitted(f64),
    /// `value` is the raw numeric outcome, `NaN` when nothing was averaged.
    Degenerate { value: f64, reason: Degeneracy },
}

impl DirichletScale {
    #[must_use]
    pub fn value(&self) -> f64 {
        match *self {
            DirichletScale::Fitted(v) => v,
            DirichletScale::Degenerate { value, .. } => value,
        }
    }

    #[must_use]
    pub fn fitted(&self) -> Option<f64> {
        match *self {
            DirichletScale::Fitted(v) => Some(v),
            DirichletScale::Degenerate { .. } => None,
        }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, DirichletScale::Degenerate { .. })
    }
}

/// Dominant lognormal suppliers: amount at or above the market's mean
/// amount.
#[must_use]
pub fn select_higher_amount_exchanges(market: &Market) -> Vec<&Exchange> {
    let threshold = market.total_amount() / market.len() as f64;
    market
        .exchanges()
        .iter()
        .filter(|e| e.amount >= threshold && e.uncertainty.is_lognormal())
        .collect()
}

/// Compute the Dirichlet scale of one market.
#[must_use]
pub fn dirichlet_scale(market: &Market) -> DirichletScale {
    let beta = market.total_amount();
    let selected = select_higher_amount_exchanges(market);
    if selected.is_empty() {
        return DirichletScale::Degenerate {
            value: f64::NAN,
            reason: Degeneracy::NoCandidates,
        };
    }

    let factors: Vec<f64> = selected
        .iter()
        .filter_map(|exc| {
            let marginal = exc.uncertainty.variance()?;
            if marginal == 0.0 {
                return None;
            }
            Some(beta_variance(exc.amount, beta - exc.amount) / marginal * 2.0)
        })
        .collect();

    if factors.is_empty() {
        return DirichletScale::Degenerate {
            value: f64::NAN,
            reason: Degeneracy::ZeroVariance,
        };
    }

    let value = factors.iter().sum::<f64>() / factors.len() as f64;
    if !value.is_finite() {
        DirichletScale::Degenerate {
            value,
            reason: Degeneracy::NonFinite,
        }
    } else if value <= 0.0 {
        DirichletScale::Degenerate {
            value,
            reason: Degeneracy::NonPositive,
        }
    } else {
        DirichletScale::Fitted(value)
    }
}

/// Compute the scale of every market in the set.
#[must_use]
pub fn dirichlet_scales(markets: &MarketSet) -> BTreeMap<ActivityId, DirichletScale> {
    markets
        .iter()
        .map(|market| {
            let scale = dirichlet_scale(market);
            match scale {
                DirichletScale::Fitted(value) => {
                    tracing::debug!(consumer = %market.consumer(), scale = value, "dirichlet scale");
                }
                DirichletScale::Degenerate { value, reason } => {
                    tracing::warn!(
                        consumer = %market.consumer(),
                        value,
                        %reason,
                        "degenerate dirichlet scale"
                    );
                }
            }
            (market.consumer(), scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExchangeKind, ShareBand, Uncertainty, lognormal_variance};

    fn market(entries: &[(f64, Uncertainty)]) -> Market {
        let exchanges = entries
            .iter()
            .enumerate()
            .map(|(i, (amount, uncertainty))| Exchange {
                input: ActivityId(i as u32 + 1),
                output: ActivityId(100),
                amount: *amount,
                uncertainty: *uncertainty,
                kind: ExchangeKind::Technosphere,
            })
            .collect();
        Market::new(ActivityId(100), exchanges, &ShareBand::default()).unwrap()
    }

    fn ln(loc: f64, scale: f64) -> Uncertainty {
        Uncertainty::Lognormal { loc, scale }
    }

    #[test]
    fn test_selects_dominant_lognormal_suppliers() {
        let m = market(&[
            (0.5, ln(0.0, 0.1)),
            (0.3, ln(0.0, 0.1)),
            (0.2, ln(0.0, 0.1)),
        ]);
        let selected = select_higher_amount_exchanges(&m);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].amount, 0.5);

        // Dominant but not lognormal
        let m = market(&[(0.7, Uncertainty::NoUncertainty), (0.3, ln(0.0, 0.1))]);
        assert!(select_higher_amount_exchanges(&m).is_empty());
    }

    #[test]
    fn test_two_supplier_closed_form() {
        let (loc, s) = (0.6_f64.ln(), 0.05);
        let m = market(&[(0.6, ln(loc, s)), (0.4, ln(0.4_f64.ln(), 0.05))]);

        let expected = beta_variance(0.6, 0.4) / lognormal_variance(loc, s) * 2.0;
        let scale = dirichlet_scale(&m);
        assert_eq!(scale, DirichletScale::Fitted(expected));
        // Var Beta(0.6, 0.4) = 0.24 / 2 = 0.12
        assert!((beta_variance(0.6, 0.4) - 0.12).abs() < 1e-15);
    }

    #[test]
    fn test_mean_over_equal_shares() {
        let m = market(&[(0.5, ln(0.0, 0.1)), (0.5, ln(0.0, 0.2))]);
        let f1 = beta_variance(0.5, 0.5) / lognormal_variance(0.0, 0.1) * 2.0;
        let f2 = beta_variance(0.5, 0.5) / lognormal_variance(0.0, 0.2) * 2.0;
        let value = dirichlet_scale(&m).fitted().unwrap();
        assert!((value - (f1 + f2) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_candidates_are_excluded() {
        let m = market(&[(0.5, ln(0.0, 0.0)), (0.5, ln(0.0, 0.1))]);
        let expected = beta_variance(0.5, 0.5) / lognormal_variance(0.0, 0.1) * 2.0;
        assert_eq!(dirichlet_scale(&m), DirichletScale::Fitted(expected));
    }

    #[test]
    fn test_all_zero_variance_is_degenerate_nan() {
        let m = market(&[(0.5, ln(0.0, 0.0)), (0.5, ln(-1.0, 0.0))]);
        let scale = dirichlet_scale(&m);
        assert!(scale.is_degenerate());
        assert!(scale.value().is_nan());
        assert!(matches!(
            scale,
            DirichletScale::Degenerate {
                reason: Degeneracy::ZeroVariance,
                ..
            }
        ));
    }

    #[test]
    fn test_no_candidates_is_degenerate() {
        let m = market(&[
            (0.6, Uncertainty::Triangular {
                loc: 0.6,
                minimum: 0.5,
                maximum: 0.7,
            }),
            (0.4, ln(0.0, 0.1)),
        ]);
        assert_eq!(
            dirichlet_scale(&m).fitted(),
            None,
            "only the minor supplier is lognormal"
        );
    }

    #[test]
    fn test_scales_for_every_market() {
        let set: MarketSet = vec![market(&[(0.5, ln(0.0, 0.1)), (0.5, ln(0.0, 0.1))])].into();
        let scales = dirichlet_scales(&set);
        assert_eq!(scales.len(), 1);
        assert!(scales[&ActivityId(100)].fitted().is_some());
    }
}
