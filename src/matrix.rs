//! The returns matrix consumed by the CSCV engine.

use crate::error::{CscvError, Result};
use serde::{Deserialize, Serialize};

/// A matrix of historical returns: S candidate strategies (rows) by
/// C time-ordered observations (columns), stored row-major.
///
/// The matrix is owned by the caller and read-only to the engine.
/// Observation order is time order and must not be permuted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsMatrix {
    data: Vec<f64>,
    n_strategies: usize,
    n_observations: usize,
}

impl ReturnsMatrix {
    /// Create a matrix from a flat row-major buffer.
    ///
    /// `data.len()` must equal `n_strategies * n_observations`, and both
    /// dimensions must be at least 1.
    pub fn new(data: Vec<f64>, n_strategies: usize, n_observations: usize) -> Result<Self> {
        if n_strategies == 0 {
            return Err(CscvError::ConfigError(
                "Returns matrix needs at least one strategy".to_string(),
            ));
        }
        if n_observations == 0 {
            return Err(CscvError::ConfigError(
                "Returns matrix needs at least one observation".to_string(),
            ));
        }
        if data.len() != n_strategies * n_observations {
            return Err(CscvError::DataError(format!(
                "Returns buffer has {} values, expected {} ({} strategies x {} observations)",
                data.len(),
                n_strategies * n_observations,
                n_strategies,
                n_observations
            )));
        }

        Ok(Self {
            data,
            n_strategies,
            n_observations,
        })
    }

    /// Create a matrix from per-strategy rows, which must all be the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_strategies = rows.len();
        if n_strategies == 0 {
            return Err(CscvError::ConfigError(
                "Returns matrix needs at least one strategy".to_string(),
            ));
        }

        let n_observations = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_observations {
                return Err(CscvError::DataError(format!(
                    "Strategy {} has {} observations, expected {}",
                    i,
                    row.len(),
                    n_observations
                )));
            }
        }

        let mut data = Vec::with_capacity(n_strategies * n_observations);
        for row in rows {
            data.extend_from_slice(&row);
        }

        Self::new(data, n_strategies, n_observations)
    }

    /// Number of candidate strategies (rows).
    pub fn n_strategies(&self) -> usize {
        self.n_strategies
    }

    /// Number of time-ordered return observations per strategy (columns).
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// The full return series of one strategy, in time order.
    pub fn row(&self, strategy: usize) -> &[f64] {
        let start = strategy * self.n_observations;
        &self.data[start..start + self.n_observations]
    }
}
