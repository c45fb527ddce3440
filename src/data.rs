//! Market data loading and the moving-average-crossover returns provider.
//!
//! These are the external collaborators that feed the CSCV engine: a price
//! file reader and a routine that turns a log-price series into a returns
//! matrix with one row per candidate moving-average-crossover system. The
//! engine itself never touches files or price data.

use crate::error::{CscvError, Result};
use crate::matrix::ReturnsMatrix;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Detect the record delimiter from the first line of a market file.
///
/// Market history files carry `YYYYMMDD price` records separated by a
/// comma, tab, or spaces.
fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;

    for &delim in &[b',', b'\t', b' '] {
        if first_line.as_bytes().contains(&delim) {
            debug!("Detected delimiter {:?}", delim as char);
            return Ok(delim);
        }
    }

    Err(CscvError::DataError(format!(
        "Cannot detect delimiter in {}",
        path.display()
    )))
}

/// Load a market history file into a natural-log price series.
///
/// Each record is a `YYYYMMDD price` pair. The date is validated but only
/// record order matters; prices must be positive. Empty lines are skipped.
/// Errors name the offending record.
pub fn load_market_file<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let delimiter = detect_delimiter(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let mut prices = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;

        // Runs of spaces produce empty fields; ignore them
        let mut fields = record.iter().filter(|f| !f.trim().is_empty());

        let date_field = match fields.next() {
            Some(f) => f.trim(),
            None => continue, // Blank line
        };
        let price_field = fields.next().ok_or_else(|| {
            CscvError::DataError(format!("Missing price on line {} of {}", line + 1, path.display()))
        })?;

        NaiveDate::parse_from_str(date_field, "%Y%m%d")?;

        let price: f64 = price_field.trim().parse().map_err(|_| {
            CscvError::DataError(format!(
                "Invalid price '{}' on line {} of {}",
                price_field,
                line + 1,
                path.display()
            ))
        })?;
        if price <= 0.0 {
            return Err(CscvError::DataError(format!(
                "Non-positive price {} on line {} of {}",
                price,
                line + 1,
                path.display()
            )));
        }

        prices.push(price.ln());
    }

    if prices.is_empty() {
        return Err(CscvError::DataError(format!(
            "No price records in {}",
            path.display()
        )));
    }

    info!("Loaded {} prices from {}", prices.len(), path.display());
    Ok(prices)
}

/// One-bar returns of a primitive moving-average-crossover system for a
/// single `(short, long)` lookback pair.
///
/// Decision bars run from `max_lookback - 1` (the first bar with enough
/// history for the longest lookback) to one before the last price. Short MA
/// above long MA takes a long position for the next bar; below takes a
/// short position; equal stays flat. Sums are updated incrementally.
fn crossover_row(prices: &[f64], max_lookback: usize, short: usize, long: usize) -> Vec<f64> {
    let nprices = prices.len();
    let mut row = Vec::with_capacity(nprices - max_lookback);

    let mut short_sum = 0.0;
    let mut long_sum = 0.0;

    for i in (max_lookback - 1)..(nprices - 1) {
        if i == max_lookback - 1 {
            short_sum = prices[i + 1 - short..=i].iter().sum();
            long_sum = prices[i + 1 - long..=i].iter().sum();
        } else {
            short_sum += prices[i] - prices[i - short];
            long_sum += prices[i] - prices[i - long];
        }

        let short_mean = short_sum / short as f64;
        let long_mean = long_sum / long as f64;

        let ret = if short_mean > long_mean {
            prices[i + 1] - prices[i] // Long position
        } else if short_mean < long_mean {
            prices[i] - prices[i + 1] // Short position
        } else {
            0.0
        };

        row.push(ret);
    }

    row
}

/// Build the returns matrix for every moving-average-crossover system with
/// lookbacks up to `max_lookback`.
///
/// One row per `(short, long)` pair with `1 <= short < long <= max_lookback`,
/// ordered by long then short lookback, giving
/// `max_lookback * (max_lookback - 1) / 2` candidate strategies over
/// `prices.len() - max_lookback` observations. Rows are independent and
/// computed in parallel.
pub fn crossover_returns(prices: &[f64], max_lookback: usize) -> Result<ReturnsMatrix> {
    if max_lookback < 2 {
        return Err(CscvError::ConfigError(format!(
            "Maximum lookback must be at least 2, got {}",
            max_lookback
        )));
    }
    if prices.len() <= max_lookback {
        return Err(CscvError::DataError(format!(
            "Need more than {} prices for lookback {}, got {}",
            max_lookback,
            max_lookback,
            prices.len()
        )));
    }

    let mut pairs = Vec::with_capacity(max_lookback * (max_lookback - 1) / 2);
    for long in 2..=max_lookback {
        for short in 1..long {
            pairs.push((short, long));
        }
    }

    let rows: Vec<Vec<f64>> = pairs
        .par_iter()
        .map(|&(short, long)| crossover_row(prices, max_lookback, short, long))
        .collect();

    info!(
        "Built crossover returns matrix: {} systems x {} observations",
        rows.len(),
        prices.len() - max_lookback
    );

    ReturnsMatrix::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_crossover_matrix_dimensions() {
        let prices: Vec<f64> = (0..50).map(|i| (100.0 + i as f64).ln()).collect();
        let m = crossover_returns(&prices, 5).unwrap();

        assert_eq!(m.n_strategies(), 10); // 5 * 4 / 2
        assert_eq!(m.n_observations(), 45); // 50 - 5
    }

    #[test]
    fn test_uptrend_rewards_long_positions() {
        // Strictly rising prices keep every short MA above every long MA,
        // so each system stays long and captures the positive increments
        let prices: Vec<f64> = (0..30).map(|i| 1.0 + 0.01 * i as f64).collect();
        let m = crossover_returns(&prices, 4).unwrap();

        for s in 0..m.n_strategies() {
            assert!(m.row(s).iter().all(|&r| r > 0.0));
        }
    }

    #[test]
    fn test_flat_prices_stay_flat() {
        let prices = vec![2.5; 20];
        let m = crossover_returns(&prices, 4).unwrap();

        for s in 0..m.n_strategies() {
            assert!(m.row(s).iter().all(|&r| r == 0.0));
        }
    }

    #[test]
    fn test_crossover_rejects_bad_inputs() {
        let prices = vec![1.0; 10];
        assert!(crossover_returns(&prices, 1).is_err());
        assert!(crossover_returns(&prices, 10).is_err());
        assert!(crossover_returns(&prices, 15).is_err());
    }

    #[test]
    fn test_load_market_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "20240102 100.0").unwrap();
        writeln!(file, "20240103 101.5").unwrap();
        writeln!(file, "20240104 99.75").unwrap();
        drop(file);

        let prices = load_market_file(&path).unwrap();
        assert_eq!(prices.len(), 3);
        assert!((prices[0] - 100.0_f64.ln()).abs() < 1e-12);
        assert!((prices[2] - 99.75_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_load_market_file_comma_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "20240102,100.0").unwrap();
        writeln!(file, "20240103,101.5").unwrap();
        drop(file);

        let prices = load_market_file(&path).unwrap();
        assert_eq!(prices.len(), 2);
    }

    #[test]
    fn test_load_market_file_rejects_bad_records() {
        let dir = tempfile::tempdir().unwrap();

        let bad_date = dir.path().join("bad_date.txt");
        let mut file = File::create(&bad_date).unwrap();
        writeln!(file, "2024010X 100.0").unwrap();
        drop(file);
        assert!(load_market_file(&bad_date).is_err());

        let bad_price = dir.path().join("bad_price.txt");
        let mut file = File::create(&bad_price).unwrap();
        writeln!(file, "20240102 -5.0").unwrap();
        drop(file);
        assert!(load_market_file(&bad_price).is_err());
    }
}
