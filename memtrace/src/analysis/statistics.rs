//! Aggregate allocation statistics
//!
//! Counters, the size histogram and the set of oversized blocks. All of it
//! is cumulative over the whole trace: frees decrement nothing except the
//! ledger, which lives elsewhere.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use crate::domain::{Address, Backtrace};

/// How many rankings to show at each end of the size histogram
pub const RANKED_SIZES: usize = 10;

/// All allocations of one size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    pub count: u64,
    /// Backtrace of the first allocation of this size; never replaced
    pub exemplar: Backtrace,
}

/// An allocation that met the oversized threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedBlock {
    pub size: u64,
    pub backtrace: Backtrace,
}

/// Counters, size histogram and oversized set
#[derive(Debug)]
pub struct AggregateStats {
    threshold: u64,
    total_allocations: u64,
    total_frees: u64,
    histogram: BTreeMap<u64, SizeBucket>,
    /// Every address that was ever given an oversized block
    ///
    /// Entries survive the block being freed: this answers "what was ever
    /// this large", not "what is this large now".
    oversized: BTreeMap<Address, OversizedBlock>,
}

impl AggregateStats {
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            total_allocations: 0,
            total_frees: 0,
            histogram: BTreeMap::new(),
            oversized: BTreeMap::new(),
        }
    }

    /// Account for one allocation
    pub fn observe(&mut self, address: Address, size: u64, backtrace: &Backtrace) {
        self.total_allocations += 1;

        self.histogram
            .entry(size)
            .and_modify(|bucket| bucket.count += 1)
            .or_insert_with(|| SizeBucket { count: 1, exemplar: Backtrace::clone(backtrace) });

        if size >= self.threshold {
            self.oversized
                .insert(address, OversizedBlock { size, backtrace: Backtrace::clone(backtrace) });
        }
    }

    /// Account for one free, whether or not the address was live
    pub fn observe_free(&mut self) {
        self.total_frees += 1;
    }

    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    #[must_use]
    pub fn total_allocations(&self) -> u64 {
        self.total_allocations
    }

    #[must_use]
    pub fn total_frees(&self) -> u64 {
        self.total_frees
    }

    /// Size buckets in ascending size order
    #[must_use]
    pub fn histogram(&self) -> &BTreeMap<u64, SizeBucket> {
        &self.histogram
    }

    #[must_use]
    pub fn oversized(&self) -> &BTreeMap<Address, OversizedBlock> {
        &self.oversized
    }

    /// Share of all allocations, in percent
    #[must_use]
    pub fn percentage(&self, count: u64) -> f64 {
        if self.total_allocations == 0 {
            return 0.0;
        }
        count as f64 / self.total_allocations as f64 * 100.0
    }

    /// Buckets sorted by ascending count
    ///
    /// The sort is stable, so buckets with equal counts stay in size order.
    #[must_use]
    pub fn ranked_by_count(&self) -> Vec<(u64, &SizeBucket)> {
        let mut ranked: Vec<_> = self.histogram.iter().map(|(&size, bucket)| (size, bucket)).collect();
        ranked.sort_by_key(|(_, bucket)| bucket.count);
        ranked
    }

    /// The `n` most frequent sizes: the tail of [`AggregateStats::ranked_by_count`]
    #[must_use]
    pub fn most_frequent(&self, n: usize) -> Vec<(u64, &SizeBucket)> {
        let mut ranked = self.ranked_by_count();
        let skip = ranked.len().saturating_sub(n);
        ranked.drain(..skip);
        ranked
    }

    /// The `n` least frequent sizes: the head of [`AggregateStats::ranked_by_count`]
    #[must_use]
    pub fn least_frequent(&self, n: usize) -> Vec<(u64, &SizeBucket)> {
        let mut ranked = self.ranked_by_count();
        ranked.truncate(n);
        ranked
    }
}
