//! Restores input order for results that finish out of order.
//!
//! Workers tag every result with the sequence number of the line it came
//! from. The resequencer holds results that arrive early and releases them
//! strictly in sequence order:
//!
//! ```
//! use tweet_stats::resequencer::Resequencer;
//!
//! let mut reseq = Resequencer::new();
//! reseq.insert(2, "third").unwrap();
//! assert_eq!(reseq.pop_ready(), None);
//! reseq.insert(0, "first").unwrap();
//! reseq.insert(1, "second").unwrap();
//!
//! let ready: Vec<_> = reseq.drain_ready().collect();
//! assert_eq!(ready, vec!["first", "second", "third"]);
//! ```

use std::collections::HashMap;

use crate::error::{Result, StatsError};

/// Buffer of early results keyed by sequence number.
///
/// Every buffered key is at least `next_expected`, and `next_expected` itself
/// is never buffered for longer than it takes to pop it.
#[derive(Debug)]
pub struct Resequencer<T> {
    pending: HashMap<u64, T>,
    next_expected: u64,
    high_water: usize,
}

impl<T> Resequencer<T> {
    /// Create an empty resequencer expecting sequence number 0 first
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_expected: 0,
            high_water: 0,
        }
    }

    /// Buffer `item` under `seq`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::SequenceError`] if `seq` was already released or
    /// is already buffered. Either means a record was dispatched twice.
    pub fn insert(&mut self, seq: u64, item: T) -> Result<()> {
        if seq < self.next_expected {
            return Err(StatsError::SequenceError(format!(
                "sequence {seq} arrived after it was released (next expected {})",
                self.next_expected
            )));
        }
        if self.pending.contains_key(&seq) {
            return Err(StatsError::SequenceError(format!(
                "sequence {seq} arrived twice"
            )));
        }

        self.pending.insert(seq, item);
        self.high_water = self.high_water.max(self.pending.len());
        Ok(())
    }

    /// Release the next item in sequence if it has arrived
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next_expected)?;
        self.next_expected += 1;
        Some(item)
    }

    /// Release every item that is ready, stopping at the first gap
    pub fn drain_ready(&mut self) -> DrainReady<'_, T> {
        DrainReady { reseq: self }
    }

    /// Sequence number that will be released next
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// Number of items waiting on an earlier sequence number
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Largest number of items that were ever waiting at once
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Check that nothing is left behind once input has ended.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::SequenceError`] if items are still waiting,
    /// which means some sequence number before them never arrived.
    pub fn finish(&self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let lowest = self.pending.keys().min().copied().unwrap_or_default();
        Err(StatsError::SequenceError(format!(
            "sequence {} never arrived; {} later results were stranded starting at {lowest}",
            self.next_expected,
            self.pending.len()
        )))
    }
}

impl<T> Default for Resequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`Resequencer::drain_ready`]
pub struct DrainReady<'a, T> {
    reseq: &'a mut Resequencer<T>,
}

impl<T> Iterator for DrainReady<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.reseq.pop_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order() {
        let mut reseq = Resequencer::new();
        for seq in 0..3 {
            reseq.insert(seq, seq * 10).unwrap();
            assert_eq!(reseq.pop_ready(), Some(seq * 10));
        }
        assert_eq!(reseq.next_expected(), 3);
        assert_eq!(reseq.high_water(), 1);
    }

    #[test]
    fn test_out_of_order_2_0_1() {
        let mut reseq = Resequencer::new();
        let mut released = Vec::new();
        for seq in [2u64, 0, 1] {
            reseq.insert(seq, seq).unwrap();
            released.extend(reseq.drain_ready());
        }
        assert_eq!(released, vec![0, 1, 2]);
        assert_eq!(reseq.pending(), 0);
        assert_eq!(reseq.high_water(), 2);
        assert!(reseq.finish().is_ok());
    }

    #[test]
    fn test_drain_stops_at_gap() {
        let mut reseq = Resequencer::new();
        reseq.insert(0, 'a').unwrap();
        reseq.insert(1, 'b').unwrap();
        reseq.insert(3, 'd').unwrap();
        let ready: Vec<_> = reseq.drain_ready().collect();
        assert_eq!(ready, vec!['a', 'b']);
        assert_eq!(reseq.next_expected(), 2);
        assert_eq!(reseq.pending(), 1);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut reseq = Resequencer::new();
        reseq.insert(4, ()).unwrap();
        let err = reseq.insert(4, ()).unwrap_err();
        assert!(matches!(err, StatsError::SequenceError(_)));
    }

    #[test]
    fn test_late_arrival_is_rejected() {
        let mut reseq = Resequencer::new();
        reseq.insert(0, ()).unwrap();
        assert_eq!(reseq.pop_ready(), Some(()));
        let err = reseq.insert(0, ()).unwrap_err();
        assert!(err.to_string().contains("after it was released"));
    }

    #[test]
    fn test_finish_reports_gap() {
        let mut reseq = Resequencer::new();
        reseq.insert(1, ()).unwrap();
        let err = reseq.finish().unwrap_err();
        assert!(err.to_string().contains("sequence 0 never arrived"));
    }
}
