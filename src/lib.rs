//! CSCV - Combinatorially symmetric cross-validation for backtest
//! overfitting detection.
//!
//! # Overview
//!
//! Given a matrix of historical returns for many candidate strategies, this
//! crate estimates the probability that picking the best-looking strategy
//! is overfit to the data. It partitions time into contiguous blocks,
//! enumerates every balanced assignment of blocks to a training half and a
//! testing half, selects the in-sample winner for each assignment, and
//! measures how often that winner lands at or below the out-of-sample
//! median. A probability near 1 means in-sample winners routinely flop
//! out-of-sample; near 0 means selection is finding genuine edge.
//!
//! The enumeration is exhaustive and in-place: all
//! `C(n_blocks, n_blocks/2)` combinations are visited exactly once using a
//! fixed-size flag vector, with no recursion and no stored combination
//! lists, so memory stays small even when the combination count is huge.
//!
//! # Quick Start
//!
//! ```
//! use cscv::{CscvAnalyzer, CscvConfig, MeanReturn, ReturnsMatrix};
//!
//! // Two candidate strategies, twelve time-ordered return observations
//! let matrix = ReturnsMatrix::from_rows(vec![
//!     vec![0.01, -0.02, 0.03, 0.01, 0.00, 0.02, -0.01, 0.01, 0.02, -0.01, 0.01, 0.00],
//!     vec![0.02, 0.01, -0.01, 0.00, 0.01, -0.02, 0.02, 0.00, -0.01, 0.01, 0.00, 0.02],
//! ]).unwrap();
//!
//! let analyzer = CscvAnalyzer::new(CscvConfig::new(4));
//! let result = analyzer.run(&matrix, &MeanReturn).unwrap();
//!
//! println!("Overfitting probability: {:.4}", result.probability);
//! assert_eq!(result.n_combinations, 6); // C(4, 2)
//! ```
//!
//! # Custom criteria
//!
//! The engine scores return sequences through the [`criterion::Criterion`]
//! trait. Stock criteria cover mean return, a Sharpe-like ratio, and profit
//! factor; any `Fn(&[f64]) -> f64` closure works via [`CriterionFn`]:
//!
//! ```
//! use cscv::{CriterionFn, CscvAnalyzer, CscvConfig, ReturnsMatrix};
//!
//! let matrix = ReturnsMatrix::from_rows(vec![vec![0.01; 8], vec![-0.01; 8]]).unwrap();
//! let total_return = CriterionFn(|returns: &[f64]| returns.iter().sum::<f64>());
//!
//! let result = CscvAnalyzer::new(CscvConfig::new(4))
//!     .run(&matrix, &total_return)
//!     .unwrap();
//! assert_eq!(result.probability, 0.0);
//! ```
//!
//! # Modules
//!
//! - [`matrix`]: The strategies-by-observations returns matrix
//! - [`criterion`]: Pluggable performance criterion functions
//! - [`blocks`]: Block partitioning and balanced combination enumeration
//! - [`cscv`]: The CSCV engine and its results
//! - [`data`]: Market file loading and the MA-crossover returns provider
//! - [`config`]: TOML configuration file support
//!
//! # References
//! - Bailey, Borwein, Lopez de Prado, Zhu, "The Probability of Backtest
//!   Overfitting", Journal of Computational Finance (2015)

pub mod blocks;
pub mod config;
pub mod criterion;
pub mod cscv;
pub mod data;
pub mod error;
pub mod matrix;

// Re-exports for convenience
pub use blocks::{n_combinations, BlockPartition, TrainTestFlags};
pub use config::CscvFileConfig;
pub use criterion::{grand_best, Criterion, CriterionFn, MeanReturn, ProfitFactor, SharpeRatio};
pub use cscv::{CscvAnalyzer, CscvConfig, CscvResult};
pub use data::{crossover_returns, load_market_file};
pub use error::{CscvError, Result};
pub use matrix::ReturnsMatrix;
