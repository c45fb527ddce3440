//! Combinatorially Symmetric Cross-Validation (CSCV) for overfitting detection.
//!
//! CSCV estimates the probability that a strategy selection procedure is
//! overfit to historical data:
//!
//! - Partitions the observation axis into contiguous blocks
//! - Enumerates every balanced assignment of blocks to train/test halves
//! - Selects the in-sample best strategy for each combination
//! - Measures how often that strategy ranks at or below the out-of-sample
//!   median
//!
//! The fraction of combinations where the in-sample winner is out-of-sample
//! mediocre is the overfitting probability.
//!
//! # References
//! - Bailey, Borwein, Lopez de Prado, Zhu, "The Probability of Backtest
//!   Overfitting" (2015)

use crate::blocks::{n_combinations, BlockPartition, TrainTestFlags};
use crate::criterion::Criterion;
use crate::error::{CscvError, Result};
use crate::matrix::ReturnsMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for a CSCV run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CscvConfig {
    /// Number of blocks to partition the observations into (even; an odd
    /// value is rounded down). The run enumerates
    /// `C(n_blocks, n_blocks/2)` combinations, so this grows fast.
    pub n_blocks: usize,
    /// Whether to record the logit of each combination's relative rank for
    /// downstream distributional analysis.
    pub collect_logits: bool,
}

impl Default for CscvConfig {
    fn default() -> Self {
        Self {
            n_blocks: 8,
            collect_logits: false,
        }
    }
}

impl CscvConfig {
    /// Create a new CSCV configuration.
    pub fn new(n_blocks: usize) -> Self {
        assert!(n_blocks >= 2, "Number of blocks must be at least 2");

        Self {
            n_blocks,
            ..Default::default()
        }
    }

    /// Record per-combination relative-rank logits in the result.
    pub fn with_logits(mut self) -> Self {
        self.collect_logits = true;
        self
    }
}

/// Results from a CSCV run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CscvResult {
    /// Configuration used.
    pub config: CscvConfig,
    /// Overfitting probability: fraction of combinations where the
    /// in-sample best strategy was at or below the out-of-sample median.
    pub probability: f64,
    /// Total combinations enumerated, `C(n_blocks, n_blocks/2)`.
    pub n_combinations: u64,
    /// Combinations where the in-sample best ranked at or below the
    /// out-of-sample median.
    pub n_below_median: u64,
    /// Number of candidate strategies ranked.
    pub n_strategies: usize,
    /// Per-combination relative-rank logits, in enumeration order.
    /// Empty unless `collect_logits` was set.
    pub logits: Vec<f64>,
}

impl CscvResult {
    /// Get a summary of the CSCV analysis.
    pub fn summary(&self) -> String {
        format!(
            "CSCV Analysis Summary:\n\
             Strategies: {}\n\
             Blocks: {}\n\
             Combinations: {}\n\
             Below-median count: {}\n\
             Overfitting probability: {:.4}",
            self.n_strategies,
            self.config.n_blocks,
            self.n_combinations,
            self.n_below_median,
            self.probability
        )
    }

    /// Check whether the selection procedure looks overfit at the given
    /// probability threshold (0.5 is the conventional cutoff).
    pub fn is_likely_overfit(&self, threshold: f64) -> bool {
        self.probability >= threshold
    }

    /// Serialize the result to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Combinatorially symmetric cross-validation analyzer.
pub struct CscvAnalyzer {
    config: CscvConfig,
}

impl CscvAnalyzer {
    /// Create a new CSCV analyzer.
    pub fn new(config: CscvConfig) -> Self {
        Self { config }
    }

    /// Run the full CSCV enumeration over a returns matrix.
    ///
    /// Every balanced train/test block assignment is visited exactly once.
    /// For each, all strategies are scored on both halves with `criterion`,
    /// the in-sample winner's out-of-sample relative rank is computed, and
    /// ranks at or below 0.5 count toward the overfitting probability.
    ///
    /// Configuration problems (too few strategies or observations, bad
    /// block count) are reported before any combination is processed. A
    /// non-finite criterion value aborts the run with its combination
    /// index; substituting or skipping would bias the estimate.
    pub fn run<C: Criterion>(&self, matrix: &ReturnsMatrix, criterion: &C) -> Result<CscvResult> {
        let n_strategies = matrix.n_strategies();
        let n_observations = matrix.n_observations();

        let partition = BlockPartition::new(n_observations, self.config.n_blocks)?;
        let n_blocks = partition.n_blocks();
        let expected = n_combinations(n_blocks);

        info!(
            "Running CSCV: {} strategies, {} observations, {} blocks, {} combinations",
            n_strategies, n_observations, n_blocks, expected
        );

        let mut flags = TrainTestFlags::new(n_blocks);

        // Working buffers reused across combinations. The gather below
        // always rewrites `work` from index 0 and scores only the filled
        // prefix, so no combination sees a predecessor's data.
        let mut work = vec![0.0; n_observations];
        let mut is_crits = vec![0.0; n_strategies];
        let mut oos_crits = vec![0.0; n_strategies];
        let mut logits = Vec::new();

        let mut n_below_median: u64 = 0;
        let mut n_combos: u64 = 0;

        loop {
            // In-sample criterion for each candidate strategy
            for isys in 0..n_strategies {
                is_crits[isys] =
                    gather_and_score(matrix, &partition, &flags, true, isys, &mut work, criterion)
                        .map_err(|value| CscvError::NonFiniteCriterion {
                            combination: n_combos as usize,
                            strategy: isys,
                            value,
                        })?;
            }

            // Out-of-sample criterion for each candidate strategy
            for isys in 0..n_strategies {
                oos_crits[isys] =
                    gather_and_score(matrix, &partition, &flags, false, isys, &mut work, criterion)
                        .map_err(|value| CscvError::NonFiniteCriterion {
                            combination: n_combos as usize,
                            strategy: isys,
                            value,
                        })?;
            }

            // Find the in-sample best; strict comparison keeps the first
            // strategy on ties
            let mut best = f64::NEG_INFINITY;
            let mut ibest = 0;
            for (isys, &crit) in is_crits.iter().enumerate() {
                if crit > best {
                    best = crit;
                    ibest = isys;
                }
            }

            // Relative rank of the in-sample winner's out-of-sample score.
            // The winner itself is always counted; insurance against
            // floating-point error when its score fails to compare equal to
            // itself through an equivalent computation path.
            let best_oos = oos_crits[ibest];
            let mut n = 0;
            for (isys, &crit) in oos_crits.iter().enumerate() {
                if isys == ibest || best_oos >= crit {
                    n += 1;
                }
            }

            let rel_rank = n as f64 / (n_strategies as f64 + 1.0);

            if rel_rank <= 0.5 {
                // In-sample best is at or below the out-of-sample median
                n_below_median += 1;
            }

            if self.config.collect_logits {
                logits.push((rel_rank / (1.0 - rel_rank)).ln());
            }

            n_combos += 1;

            if !flags.advance() {
                break;
            }
        }

        debug_assert_eq!(n_combos as u128, expected);

        let probability = n_below_median as f64 / n_combos as f64;

        info!(
            "CSCV complete: {}/{} combinations below median, probability {:.4}",
            n_below_median, n_combos, probability
        );

        Ok(CscvResult {
            config: self.config.clone(),
            probability,
            n_combinations: n_combos,
            n_below_median,
            n_strategies,
            logits,
        })
    }
}

/// Gather one strategy's observations from the blocks on the requested side
/// of the split into the working buffer, in original time order, and score
/// the filled prefix.
///
/// Returns `Err(value)` if the criterion produced a non-finite value.
fn gather_and_score<C: Criterion>(
    matrix: &ReturnsMatrix,
    partition: &BlockPartition,
    flags: &TrainTestFlags,
    training: bool,
    strategy: usize,
    work: &mut [f64],
    criterion: &C,
) -> std::result::Result<f64, f64> {
    let row = matrix.row(strategy);
    let mut n = 0;

    for block in 0..partition.n_blocks() {
        if flags.is_training(block) == training {
            for i in partition.range(block) {
                work[n] = row[i];
                n += 1;
            }
        }
    }

    let crit = criterion.evaluate(&work[..n]);
    if crit.is_finite() {
        Ok(crit)
    } else {
        Err(crit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{CriterionFn, MeanReturn};

    fn matrix(rows: Vec<Vec<f64>>) -> ReturnsMatrix {
        ReturnsMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = CscvConfig::new(6).with_logits();
        assert_eq!(config.n_blocks, 6);
        assert!(config.collect_logits);
    }

    #[test]
    #[should_panic(expected = "Number of blocks must be at least 2")]
    fn test_config_rejects_tiny_block_count() {
        CscvConfig::new(1);
    }

    #[test]
    fn test_single_strategy_always_at_median() {
        // With S = 1 the winner is trivially itself and the relative rank
        // is exactly 1/2 every combination, so the probability is 1.0.
        let m = matrix(vec![vec![0.1, -0.2, 0.3, 0.05, -0.1, 0.2, 0.0, 0.15]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(4));

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(result.n_combinations, 6);
        assert_eq!(result.n_below_median, 6);
        assert_eq!(result.probability, 1.0);
    }

    #[test]
    fn test_dominant_strategy_never_overfit() {
        // Strategy 0 wins in-sample and out-of-sample on every split
        let m = matrix(vec![vec![0.1; 8], vec![-0.1; 8]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(4));

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(result.n_combinations, 6);
        assert_eq!(result.probability, 0.0);
    }

    #[test]
    fn test_identical_strategies_are_stable() {
        // All strategies tie everywhere: the first is selected, and the
        // tie-counting rule puts its rank at S/(S+1), above the median.
        let m = matrix(vec![vec![0.05; 12]; 5]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(4));

        let first = analyzer.run(&m, &MeanReturn).unwrap();
        let second = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(first.probability, second.probability);
        assert_eq!(first.probability, 0.0);
    }

    #[test]
    fn test_combination_count_matches_binomial() {
        let m = matrix(vec![vec![0.01; 24], vec![0.02; 24], vec![0.0; 24]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(6));

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(result.n_combinations, 20); // C(6, 3)
    }

    #[test]
    fn test_odd_block_count_rounds_down() {
        let m = matrix(vec![vec![0.01; 20]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(5));

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(result.n_combinations, 6); // C(4, 2) after rounding
    }

    #[test]
    fn test_config_errors_reported_before_enumeration() {
        let m = matrix(vec![vec![0.01; 4]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(6));

        match analyzer.run(&m, &MeanReturn) {
            Err(CscvError::ConfigError(_)) => {}
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_criterion_aborts_with_location() {
        let m = matrix(vec![vec![0.1; 8], vec![0.2; 8]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(4));
        let bad = CriterionFn(|_: &[f64]| f64::NAN);

        match analyzer.run(&m, &bad) {
            Err(CscvError::NonFiniteCriterion {
                combination,
                strategy,
                ..
            }) => {
                assert_eq!(combination, 0);
                assert_eq!(strategy, 0);
            }
            other => panic!("Expected NonFiniteCriterion, got {:?}", other),
        }
    }

    #[test]
    fn test_logit_collection() {
        let m = matrix(vec![vec![0.1; 8], vec![-0.1; 8], vec![0.05; 8]]);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(4).with_logits());

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert_eq!(result.logits.len(), result.n_combinations as usize);
        assert!(result.logits.iter().all(|l| l.is_finite()));

        // Without the flag no logits are recorded
        let quiet = CscvAnalyzer::new(CscvConfig::new(4))
            .run(&m, &MeanReturn)
            .unwrap();
        assert!(quiet.logits.is_empty());
    }

    #[test]
    fn test_probability_bounds() {
        let rows: Vec<Vec<f64>> = (0..7)
            .map(|s| {
                (0..16)
                    .map(|i| ((s * 16 + i) as f64 * 0.73).sin() * 0.02)
                    .collect()
            })
            .collect();
        let m = matrix(rows);
        let analyzer = CscvAnalyzer::new(CscvConfig::new(8));

        let result = analyzer.run(&m, &MeanReturn).unwrap();
        assert!(result.probability >= 0.0 && result.probability <= 1.0);
        assert_eq!(result.n_combinations, 70); // C(8, 4)
    }

    #[test]
    fn test_result_summary_and_json() {
        let m = matrix(vec![vec![0.1; 8], vec![-0.1; 8]]);
        let result = CscvAnalyzer::new(CscvConfig::new(4))
            .run(&m, &MeanReturn)
            .unwrap();

        let summary = result.summary();
        assert!(summary.contains("CSCV Analysis"));
        assert!(summary.contains("Combinations: 6"));

        let json = result.to_json().unwrap();
        assert!(json.contains("\"probability\""));

        assert!(!result.is_likely_overfit(0.5));
    }
}
