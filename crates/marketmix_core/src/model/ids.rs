//! Identifiers for activities and sampled quantities
//!
//! Activity identifiers are opaque numbers handed out by the exchange
//! database. An [`Index`] names one sampled quantity by its supplier and
//! consumer activity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an activity in the exchange database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub u32);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matrix coordinate of one sampled exchange.
///
/// `row` is the supplying activity, `col` the consuming activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Index {
    pub row: ActivityId,
    pub col: ActivityId,
}

impl Index {
    #[must_use]
    pub fn new(row: ActivityId, col: ActivityId) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
