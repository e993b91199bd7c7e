use serde::{Deserialize, Serialize};

use super::ids::Index;
use crate::error::SourceError;

/// Dense row-major matrix of samples: one row per [`Index`], one column per
/// Monte Carlo draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleMatrix")]
pub struct SampleMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked wire form of [`SampleMatrix`].
#[derive(Deserialize)]
struct RawSampleMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawSampleMatrix> for SampleMatrix {
    type Error = SourceError;

    fn try_from(raw: RawSampleMatrix) -> Result<Self, Self::Error> {
        Self::from_data(raw.rows, raw.cols, raw.data)
    }
}

impl SampleMatrix {
    /// Create a matrix filled with zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a matrix from row-major data.
    pub fn from_data(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, SourceError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(SourceError::MatrixShape {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Stack equally long rows.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics, and a zero-column matrix has no data to yield anyway
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }
}

/// The persisted result of one sample-generation run.
///
/// `indices`, the rows of `data` and `flip` are aligned element for element,
/// and `data` has `num_samples` columns. Deserialization enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSamplePackage")]
pub struct SamplePackage {
    pub name: String,
    pub seed: u64,
    pub num_samples: usize,
    pub indices: Vec<Index>,
    pub data: SampleMatrix,
    pub flip: Vec<bool>,
}

#[derive(Deserialize)]
struct RawSamplePackage {
    name: String,
    seed: u64,
    num_samples: usize,
    indices: Vec<Index>,
    data: SampleMatrix,
    flip: Vec<bool>,
}

impl TryFrom<RawSamplePackage> for SamplePackage {
    type Error = SourceError;

    fn try_from(raw: RawSamplePackage) -> Result<Self, Self::Error> {
        let package = Self {
            name: raw.name,
            seed: raw.seed,
            num_samples: raw.num_samples,
            indices: raw.indices,
            data: raw.data,
            flip: raw.flip,
        };
        package.check_shape()?;
        Ok(package)
    }
}

impl SamplePackage {
    pub fn check_shape(&self) -> Result<(), SourceError> {
        let rows = self.indices.len();
        if self.flip.len() != rows
            || self.data.rows() != rows
            || (rows > 0 && self.data.cols() != self.num_samples)
        {
            return Err(SourceError::PackageShape {
                indices: rows,
                flip: self.flip.len(),
                rows: self.data.rows(),
                cols: self.data.cols(),
                num_samples: self.num_samples,
            });
        }
        Ok(())
    }

    /// Row of `data` for the given index.
    #[must_use]
    pub fn position(&self, index: Index) -> Option<usize> {
        self.indices.iter().position(|i| *i == index)
    }

    #[must_use]
    pub fn samples(&self, index: Index) -> Option<&[f64]> {
        self.position(index).map(|r| self.data.row(r))
    }
}
