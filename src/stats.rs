//! Bucket occupancy statistics.
//!
//! Dispersion is the population variance of the per-bucket entry counts:
//! `D = (Σ count_i²) / k − (n / k)²` for `k` buckets holding `n` entries.
//! A perfectly uniform hash scores 0.

use std::io::{self, Write};

use crate::table::HashTable;

/// Population variance of `counts`; 0.0 for an empty slice
pub fn dispersion(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }

    let k = counts.len() as f64;
    let (total, sum_of_squares) = counts.iter().fold((0u128, 0u128), |(n, sq), &c| {
        let c = c as u128;
        (n + c, sq + c * c)
    });

    let mean = total as f64 / k;
    sum_of_squares as f64 / k - mean * mean
}

/// Snapshot of how a table's entries are spread over its buckets
#[derive(Clone, Debug, PartialEq)]
pub struct BucketStats {
    counts: Vec<usize>,
    total: usize,
}

impl BucketStats {
    /// Build from explicit per-bucket counts
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let total = counts.iter().sum();
        Self { counts, total }
    }

    /// Count every bucket of `table`; buckets never created count as 0
    pub fn from_table<H>(table: &HashTable<H>) -> Self {
        Self {
            counts: table.bucket_counts().collect(),
            total: table.len(),
        }
    }

    /// Entry count per bucket, in bucket order
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Total number of entries
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Average entries per bucket
    pub fn mean(&self) -> f64 {
        if self.counts.is_empty() {
            0.0
        } else {
            self.total as f64 / self.counts.len() as f64
        }
    }

    /// Fullest bucket's entry count
    pub fn max(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Buckets holding no entries
    pub fn empty_buckets(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }

    #[inline]
    pub fn dispersion(&self) -> f64 {
        dispersion(&self.counts)
    }

    /// Write one `"<bucket> <count>"` line per bucket
    pub fn write_counts<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (bucket, count) in self.counts.iter().enumerate() {
            writeln!(out, "{bucket} {count}")?;
        }
        out.flush()
    }
}
