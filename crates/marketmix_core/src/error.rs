use std::fmt;

use crate::model::{ActivityId, Index};
use crate::scale::Degeneracy;

/// Errors raised while fitting a distribution to an observed series
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// The fit produced non-finite parameters
    NonConvergence { shape: f64, scale: f64 },
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::NonConvergence { shape, scale } => write!(
                f,
                "lognormal fit did not converge (shape={shape}, scale={scale})"
            ),
        }
    }
}

impl std::error::Error for FitError {}

/// Errors related to malformed source data or stored artifacts
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Time series index count does not match the number of value rows
    ShapeMismatch { indices: usize, rows: usize },
    /// Matrix buffer length is not `rows * cols`
    MatrixShape { rows: usize, cols: usize, len: usize },
    /// Package indices, flips and sample rows do not line up
    PackageShape {
        indices: usize,
        flip: usize,
        rows: usize,
        cols: usize,
        num_samples: usize,
    },
    ActivityNotFound(ActivityId),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ShapeMismatch { indices, rows } => write!(
                f,
                "time series has {indices} indices but {rows} value rows"
            ),
            SourceError::MatrixShape { rows, cols, len } => write!(
                f,
                "matrix of {rows}x{cols} cannot hold {len} values"
            ),
            SourceError::PackageShape {
                indices,
                flip,
                rows,
                cols,
                num_samples,
            } => write!(
                f,
                "package has {indices} indices, {flip} flips and a {rows}x{cols} matrix for {num_samples} samples"
            ),
            SourceError::ActivityNotFound(id) => write!(f, "activity {id} not found"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors related to market construction
#[derive(Debug, Clone, PartialEq)]
pub enum MarketError {
    TooFewExchanges {
        consumer: ActivityId,
        count: usize,
    },
    SharesOutOfBand {
        consumer: ActivityId,
        total: f64,
    },
    /// Exchange whose output is not the market's consumer
    ForeignExchange {
        consumer: ActivityId,
        index: Index,
    },
    DuplicateSupplier {
        consumer: ActivityId,
        supplier: ActivityId,
    },
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::TooFewExchanges { consumer, count } => {
                write!(f, "market {consumer} has {count} exchanges, need at least 2")
            }
            MarketError::SharesOutOfBand { consumer, total } => {
                write!(f, "market {consumer} shares sum to {total}")
            }
            MarketError::ForeignExchange { consumer, index } => {
                write!(f, "exchange {index} does not belong to market {consumer}")
            }
            MarketError::DuplicateSupplier { consumer, supplier } => {
                write!(f, "supplier {supplier} appears twice in market {consumer}")
            }
        }
    }
}

impl std::error::Error for MarketError {}

/// Post-condition failures of a sample matrix
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingIndex(Index),
    /// Per-draw sums of a market are not constant
    NonConstantSum {
        consumer: ActivityId,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingIndex(index) => {
                write!(f, "index {index} missing from sample package")
            }
            ValidationError::NonConstantSum { consumer, min, max } => write!(
                f,
                "samples of market {consumer} do not sum to a constant (min={min}, max={max})"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while drawing samples
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    MissingScale(ActivityId),
    DegenerateScale {
        consumer: ActivityId,
        reason: Degeneracy,
    },
    /// A Dirichlet concentration was not finite and positive
    InvalidConcentration {
        consumer: ActivityId,
        alpha: f64,
    },
    /// An extra exchange collides with a market index
    DuplicateIndex(Index),
    Validation(ValidationError),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::MissingScale(consumer) => {
                write!(f, "no Dirichlet scale computed for market {consumer}")
            }
            SampleError::DegenerateScale { consumer, reason } => {
                write!(f, "Dirichlet scale of market {consumer} is degenerate: {reason}")
            }
            SampleError::InvalidConcentration { consumer, alpha } => write!(
                f,
                "invalid Dirichlet concentration {alpha} in market {consumer}"
            ),
            SampleError::DuplicateIndex(index) => {
                write!(f, "index {index} is sampled twice")
            }
            SampleError::Validation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SampleError {
    fn from(err: ValidationError) -> Self {
        SampleError::Validation(err)
    }
}

/// Errors from the sample store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Io(String),
    Serialize(String),
    Parse(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "IO error: {msg}"),
            StoreError::Serialize(msg) => write!(f, "serialization error: {msg}"),
            StoreError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Top-level error of the package generation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Source(SourceError),
    Fit(FitError),
    Sample(SampleError),
    Store(StoreError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Source(e) => write!(f, "{e}"),
            PipelineError::Fit(e) => write!(f, "{e}"),
            PipelineError::Sample(e) => write!(f, "{e}"),
            PipelineError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Source(e) => Some(e),
            PipelineError::Fit(e) => Some(e),
            PipelineError::Sample(e) => Some(e),
            PipelineError::Store(e) => Some(e),
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        PipelineError::Source(err)
    }
}

impl From<FitError> for PipelineError {
    fn from(err: FitError) -> Self {
        PipelineError::Fit(err)
    }
}

impl From<SampleError> for PipelineError {
    fn from(err: SampleError) -> Self {
        PipelineError::Sample(err)
    }
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        PipelineError::Sample(SampleError::Validation(err))
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
