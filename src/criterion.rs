//! Performance criterion functions for scoring return sequences.
//!
//! The CSCV engine is agnostic to how a strategy's performance is scored:
//! it only requires a pure function from a non-empty return sequence to a
//! scalar. Implement [`Criterion`] for custom scoring, use one of the
//! stock criteria below, or wrap a plain closure with [`CriterionFn`].

use crate::matrix::ReturnsMatrix;

/// A scalar performance score over a sequence of returns.
///
/// Implementations must be deterministic for identical input and defined
/// for any non-empty sequence. The engine never passes an empty slice.
pub trait Criterion {
    /// Score the given return sequence. Higher is better.
    fn evaluate(&self, returns: &[f64]) -> f64;
}

/// Adapter turning any `Fn(&[f64]) -> f64` closure into a [`Criterion`].
#[derive(Debug, Clone, Copy)]
pub struct CriterionFn<F>(pub F);

impl<F> Criterion for CriterionFn<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, returns: &[f64]) -> f64 {
        (self.0)(returns)
    }
}

/// Mean return per observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReturn;

impl Criterion for MeanReturn {
    fn evaluate(&self, returns: &[f64]) -> f64 {
        returns.iter().sum::<f64>() / returns.len() as f64
    }
}

/// Sharpe-like ratio: mean return over standard deviation.
///
/// Returns 0.0 for sequences too short to have a spread, or whose spread
/// is numerically zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharpeRatio;

impl Criterion for SharpeRatio {
    fn evaluate(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();

        if std > 1e-10 {
            mean / std
        } else {
            0.0
        }
    }
}

/// Profit factor: gross gains over gross losses.
///
/// A sequence with no losses scores the gross gain itself, so that
/// all-winning sequences still order sensibly among themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitFactor;

impl Criterion for ProfitFactor {
    fn evaluate(&self, returns: &[f64]) -> f64 {
        let gains: f64 = returns.iter().filter(|&&r| r > 0.0).sum();
        let losses: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| -r).sum();

        if losses > 1e-10 {
            gains / losses
        } else {
            gains
        }
    }
}

/// Score every strategy on its full return history and report the best.
///
/// Returns `(strategy_index, criterion_value)` with the first strategy kept
/// on ties. Useful for printing the grand full-sample winner next to the
/// overfitting probability.
pub fn grand_best<C: Criterion>(matrix: &ReturnsMatrix, criterion: &C) -> (usize, f64) {
    let mut best = f64::NEG_INFINITY;
    let mut ibest = 0;
    for isys in 0..matrix.n_strategies() {
        let crit = criterion.evaluate(matrix.row(isys));
        if crit > best {
            best = crit;
            ibest = isys;
        }
    }
    (ibest, best)
}
