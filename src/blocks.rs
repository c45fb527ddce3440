//! Time-block partitioning and balanced train/test combinations.
//!
//! The CSCV engine splits the observation axis into `n_blocks` contiguous
//! blocks and walks every way of assigning exactly half of them to the
//! training set. [`BlockPartition`] computes the block boundaries;
//! [`TrainTestFlags`] enumerates the `C(n_blocks, n_blocks/2)` balanced
//! assignments in place, one flag vector at a time, without recursion or a
//! stored combination list.

use crate::error::{CscvError, Result};
use std::ops::Range;

/// A partition of `[0, n_observations)` into contiguous blocks.
///
/// Blocks cover the observation range exactly, with no gaps or overlaps.
/// Lengths differ by at most one; earlier blocks receive the larger
/// remainder allocation, so the same `(n_observations, n_blocks)` always
/// yields the same partition.
#[derive(Debug, Clone)]
pub struct BlockPartition {
    starts: Vec<usize>,
    lengths: Vec<usize>,
}

impl BlockPartition {
    /// Partition `n_observations` cases into `n_blocks` contiguous blocks.
    ///
    /// An odd `n_blocks` is rounded down to the nearest even value; this is
    /// documented behavior, not an error. Fails if the rounded count is
    /// below 2 or exceeds `n_observations`.
    pub fn new(n_observations: usize, n_blocks: usize) -> Result<Self> {
        let n_blocks = n_blocks / 2 * 2; // Must be even

        if n_blocks < 2 {
            return Err(CscvError::ConfigError(format!(
                "Need at least 2 blocks, got {}",
                n_blocks
            )));
        }
        if n_blocks > n_observations {
            return Err(CscvError::ConfigError(format!(
                "Cannot partition {} observations into {} blocks",
                n_observations, n_blocks
            )));
        }

        let base = n_observations / n_blocks;
        let remainder = n_observations % n_blocks;

        let mut starts = Vec::with_capacity(n_blocks);
        let mut lengths = Vec::with_capacity(n_blocks);
        let mut istart = 0;
        for i in 0..n_blocks {
            let len = if i < remainder { base + 1 } else { base };
            starts.push(istart);
            lengths.push(len);
            istart += len;
        }

        Ok(Self { starts, lengths })
    }

    /// Number of blocks in the partition (always even).
    pub fn n_blocks(&self) -> usize {
        self.starts.len()
    }

    /// The half-open observation index range of one block.
    pub fn range(&self, block: usize) -> Range<usize> {
        self.starts[block]..self.starts[block] + self.lengths[block]
    }

    /// Block lengths, in block order.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}

/// In-place enumerator of balanced train/test block assignments.
///
/// Holds one boolean flag per block (`true` = training). The initial state
/// flags the first `n_blocks/2` blocks as training, the lexicographically
/// smallest combination under this encoding. [`advance`](Self::advance)
/// steps to the next combination using only the flag vector itself as
/// state, visiting every combination exactly once.
#[derive(Debug, Clone)]
pub struct TrainTestFlags {
    flags: Vec<bool>,
}

impl TrainTestFlags {
    /// Start the enumeration for an even, positive block count.
    pub fn new(n_blocks: usize) -> Self {
        debug_assert!(n_blocks >= 2 && n_blocks % 2 == 0);
        let mut flags = vec![false; n_blocks];
        for flag in flags.iter_mut().take(n_blocks / 2) {
            *flag = true;
        }
        Self { flags }
    }

    /// Whether the given block is in the training set.
    pub fn is_training(&self, block: usize) -> bool {
        self.flags[block]
    }

    /// The current flag vector (`true` = training).
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Step to the next combination.
    ///
    /// Scans from the lowest block counting training flags; at the first
    /// (training, testing) adjacent pair, moves that training flag up one
    /// position and packs the flags counted below it back into the lowest
    /// positions. Returns `false` when no such pair exists below the last
    /// block, meaning the combination just processed was the final one.
    pub fn advance(&mut self) -> bool {
        let n_blocks = self.flags.len();
        let mut n = 0;

        for iradix in 0..n_blocks - 1 {
            if self.flags[iradix] {
                n += 1; // Training flags up to and including iradix
                if !self.flags[iradix + 1] {
                    self.flags[iradix] = false;
                    self.flags[iradix + 1] = true;

                    // Reset everything below the change point
                    for i in 0..iradix {
                        n -= 1;
                        self.flags[i] = n > 0;
                    }

                    return true;
                }
            }
        }

        false
    }
}

/// Total number of balanced combinations, `C(n_blocks, n_blocks/2)`.
///
/// Computed with the multiplicative formula in `u128`; exact for every
/// block count that could plausibly be enumerated.
pub fn n_combinations(n_blocks: usize) -> u128 {
    let k = (n_blocks / 2) as u128;
    let n = n_blocks as u128;
    let mut result: u128 = 1;
    for i in 1..=k {
        result = result * (n - k + i) / i;
    }
    result
}
