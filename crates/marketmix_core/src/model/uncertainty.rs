use serde::{Deserialize, Serialize};

/// Declared or fitted uncertainty of one exchange amount.
///
/// Numeric ids follow the stats-array convention used by LCA databases:
/// 0 undefined, 1 no uncertainty, 2 lognormal, 3 normal, 4 uniform,
/// 5 triangular. Lognormal `loc` is the log of the median and `scale` the
/// standard deviation of the underlying normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Uncertainty {
    #[default]
    Undefined,
    NoUncertainty,
    Lognormal {
        loc: f64,
        scale: f64,
    },
    Normal {
        loc: f64,
        scale: f64,
    },
    Uniform {
        minimum: f64,
        maximum: f64,
    },
    Triangular {
        loc: f64,
        minimum: f64,
        maximum: f64,
    },
}

impl Uncertainty {
    #[must_use]
    pub fn id(&self) -> u8 {
        match self {
            Uncertainty::Undefined => 0,
            Uncertainty::NoUncertainty => 1,
            Uncertainty::Lognormal { .. } => 2,
            Uncertainty::Normal { .. } => 3,
            Uncertainty::Uniform { .. } => 4,
            Uncertainty::Triangular { .. } => 5,
        }
    }

    /// True for every kind that describes an actual distribution.
    #[must_use]
    pub fn is_uncertain(&self) -> bool {
        self.id() >= 2
    }

    #[must_use]
    pub fn is_lognormal(&self) -> bool {
        matches!(self, Uncertainty::Lognormal { .. })
    }

    /// Expected value, or `None` for point-valued kinds.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        match *self {
            Uncertainty::Undefined | Uncertainty::NoUncertainty => None,
            Uncertainty::Lognormal { loc, scale } => Some((loc + scale * scale / 2.0).exp()),
            Uncertainty::Normal { loc, .. } => Some(loc),
            Uncertainty::Uniform { minimum, maximum } => Some((minimum + maximum) / 2.0),
            Uncertainty::Triangular {
                loc,
                minimum,
                maximum,
            } => Some((minimum + maximum + loc) / 3.0),
        }
    }

    /// Median, or `None` for point-valued kinds.
    #[must_use]
    pub fn median(&self) -> Option<f64> {
        match *self {
            Uncertainty::Undefined | Uncertainty::NoUncertainty => None,
            Uncertainty::Lognormal { loc, .. } => Some(loc.exp()),
            Uncertainty::Normal { loc, .. } => Some(loc),
            Uncertainty::Uniform { minimum, maximum } => Some((minimum + maximum) / 2.0),
            Uncertainty::Triangular {
                loc,
                minimum,
                maximum,
            } => {
                let (a, b, c) = (minimum, maximum, loc);
                if c >= (a + b) / 2.0 {
                    Some(a + ((b - a) * (c - a) / 2.0).sqrt())
                } else {
                    Some(b - ((b - a) * (b - c) / 2.0).sqrt())
                }
            }
        }
    }

    /// Closed-form variance, or `None` for point-valued kinds.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        match *self {
            Uncertainty::Undefined | Uncertainty::NoUncertainty => None,
            Uncertainty::Lognormal { loc, scale } => Some(lognormal_variance(loc, scale)),
            Uncertainty::Normal { scale, .. } => Some(scale * scale),
            Uncertainty::Uniform { minimum, maximum } => {
                Some((maximum - minimum).powi(2) / 12.0)
            }
            Uncertainty::Triangular {
                loc,
                minimum,
                maximum,
            } => {
                let (a, b, c) = (minimum, maximum, loc);
                Some((a * a + b * b + c * c - a * b - a * c - b * c) / 18.0)
            }
        }
    }
}

/// Variance of a lognormal distribution with log-space mean `loc` and
/// log-space standard deviation `scale`.
#[must_use]
#[inline]
pub fn lognormal_variance(loc: f64, scale: f64) -> f64 {
    let s2 = scale * scale;
    (s2.exp() - 1.0) * (2.0 * loc + s2).exp()
}

/// Variance of a Beta(`a`, `b`) distribution.
#[must_use]
#[inline]
pub fn beta_variance(a: f64, b: f64) -> f64 {
    let total = a + b;
    a * b / (total * total) / (total + 1.0)
}
