use serde::{Deserialize, Serialize};

use super::ids::{ActivityId, Index};
use super::uncertainty::Uncertainty;

/// Role of an exchange in the matrices it is written into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    Production,
    #[default]
    Technosphere,
    Biosphere,
}

impl ExchangeKind {
    /// Whether the sampled value is negated when written into the signed
    /// technosphere matrix.
    #[must_use]
    pub fn flip(self) -> bool {
        self != ExchangeKind::Production
    }
}

/// Which point of an exchange's distribution a constant row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountShift {
    /// The amount as declared in the database
    #[default]
    Declared,
    Median,
    Mean,
}

/// Directed edge from a supplying activity (`input`) to a consuming
/// activity (`output`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub input: ActivityId,
    pub output: ActivityId,
    pub amount: f64,
    #[serde(default)]
    pub uncertainty: Uncertainty,
    #[serde(default)]
    pub kind: ExchangeKind,
}

impl Exchange {
    #[must_use]
    pub fn index(&self) -> Index {
        Index::new(self.input, self.output)
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.input == self.output
    }

    #[must_use]
    pub fn flip(&self) -> bool {
        self.kind.flip()
    }

    /// Amount moved to the median or mean of the declared distribution.
    /// Point-valued kinds keep the declared amount.
    #[must_use]
    pub fn shifted_amount(&self, shift: AmountShift) -> f64 {
        let shifted = match shift {
            AmountShift::Declared => None,
            AmountShift::Median => self.uncertainty.median(),
            AmountShift::Mean => self.uncertainty.mean(),
        };
        shifted.unwrap_or(self.amount)
    }

    /// Copy of this exchange carrying a different uncertainty.
    #[must_use]
    pub fn with_uncertainty(&self, uncertainty: Uncertainty) -> Self {
        Self {
            uncertainty,
            ..self.clone()
        }
    }
}

/// An activity as read from the exchange database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reference_product: Option<String>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

impl Activity {
    /// Reference product, treating an empty string as absent.
    #[must_use]
    pub fn reference_product(&self) -> Option<&str> {
        self.reference_product.as_deref().filter(|rp| !rp.is_empty())
    }
}
