//! Streaming median over a bounded histogram.
//!
//! Every value fed in is a small non-negative integer (unique words in one
//! line), so instead of keeping the values sorted we count how many times each
//! value in `0..=max_value` has been seen. Updates are O(1); a median query
//! walks the histogram once, which is O(max_value).

/// Default largest value the histogram tracks.
pub const DEFAULT_MAX_WORDS: usize = 69;

/// Largest bound a histogram may be built with.
pub const MAX_WORDS_LIMIT: usize = u16::MAX as usize;

/// A running median of integers in a fixed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningMedian {
    /// `slots[v]` is how many updates had value `v` (after clamping)
    slots: Vec<u64>,
    /// Sum of all slots
    total: u64,
    /// Updates that were above the bound
    clamped: u64,
}

impl RunningMedian {
    /// Create an empty estimator tracking values `0..=max_value`.
    ///
    /// Bounds above [`MAX_WORDS_LIMIT`] are lowered to it.
    pub fn new(max_value: usize) -> Self {
        let max_value = max_value.min(MAX_WORDS_LIMIT);
        Self {
            slots: vec![0; max_value + 1],
            total: 0,
            clamped: 0,
        }
    }

    /// Build an estimator from existing histogram slots.
    ///
    /// The record count is the sum of the slots, so the histogram and the
    /// count can never disagree. An empty slice yields a histogram with a
    /// single slot.
    pub fn from_slots(slots: &[u64]) -> Self {
        let mut slots = slots.to_vec();
        if slots.is_empty() {
            slots.push(0);
        }
        let total = slots.iter().sum();
        Self {
            slots,
            total,
            clamped: 0,
        }
    }

    /// Record one value. Values above the bound are counted at the bound.
    ///
    /// Returns `true` if the value had to be clamped.
    pub fn update(&mut self, value: usize) -> bool {
        let max = self.max_value();
        let was_clamped = value > max;
        let slot = value.min(max);

        self.slots[slot] += 1;
        self.total += 1;
        if was_clamped {
            self.clamped += 1;
        }
        was_clamped
    }

    /// Current median of everything recorded, `0.0` if nothing was recorded.
    pub fn median(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        // 1-based ranks of the order statistics we need
        let upper_rank = self.total / 2 + 1;
        let lower_rank = if self.total % 2 == 0 {
            self.total / 2
        } else {
            upper_rank
        };

        let mut seen = 0u64;
        let mut lower = None;
        for (value, &count) in self.slots.iter().enumerate() {
            // A rank can only be reached inside a bucket that holds records.
            if count == 0 {
                continue;
            }
            seen += count;
            if lower.is_none() && seen >= lower_rank {
                lower = Some(value);
            }
            if seen >= upper_rank {
                let lower = lower.unwrap_or(value);
                return (lower + value) as f64 / 2.0;
            }
        }

        // Unreachable while `total` is the sum of the slots.
        0.0
    }

    /// Number of values recorded
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of recorded values that exceeded the bound
    pub fn clamped(&self) -> u64 {
        self.clamped
    }

    /// Largest value tracked without clamping
    pub fn max_value(&self) -> usize {
        self.slots.len() - 1
    }

    /// Histogram slots, indexed by value
    pub fn slots(&self) -> &[u64] {
        &self.slots
    }
}

impl Default for RunningMedian {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

/// Format a median the way it is written to the output: one decimal digit.
pub fn format_median(median: f64) -> String {
    format!("{median:.1}")
}
