use crossbeam::channel::Receiver;
use std::collections::HashMap;
use std::time::Instant;

use crate::accumulator::WordCounts;
use crate::channel::{BlockingSender, Message};
use crate::cleaner::WordCleaner;
use crate::error::Result;
use crate::metrics::StageMetrics;

/// Name of the worker pool in errors and logs
pub const WORKER_STAGE: &str = "worker";

/// Name of the stage that resequences unique counts and writes medians
pub const MEDIAN_STAGE: &str = "median";

/// Name of the stage that merges word counts and writes the totals
pub const ACCUMULATOR_STAGE: &str = "accumulator";

/// One input line and its position in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub sequence: u64,
    pub line: String,
}

impl Record {
    pub fn new(sequence: u64, line: impl Into<String>) -> Self {
        Self {
            sequence,
            line: line.into(),
        }
    }
}

/// Distinct valid words in the line with the given sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueCount {
    pub sequence: u64,
    pub count: usize,
}

/// Count the valid words of one record.
///
/// The unique count is the number of keys in the returned map.
pub fn analyze(record: &Record, cleaner: &dyn WordCleaner) -> (UniqueCount, WordCounts) {
    let mut counts: WordCounts = HashMap::new();
    for word in cleaner.valid_words(&record.line) {
        *counts.entry(word).or_insert(0) += 1;
    }
    let unique = UniqueCount {
        sequence: record.sequence,
        count: counts.len(),
    };
    (unique, counts)
}

/// Pulls records off the work queue and fans results out to both
/// downstream stages.
pub struct Worker {
    id: usize,
    input: Receiver<Record>,
    unique_counts: BlockingSender<Message<UniqueCount>>,
    word_counts: BlockingSender<Message<WordCounts>>,
    metrics: StageMetrics,
}

impl Worker {
    pub fn new(
        id: usize,
        input: Receiver<Record>,
        unique_counts: BlockingSender<Message<UniqueCount>>,
        word_counts: BlockingSender<Message<WordCounts>>,
        metrics: StageMetrics,
    ) -> Self {
        Self {
            id,
            input,
            unique_counts,
            word_counts,
            metrics,
        }
    }

    /// Process records until the work queue is closed and empty, then send
    /// one terminal message to each downstream stage.
    ///
    /// Returns the number of records this worker handled.
    pub fn run(self, cleaner: &dyn WordCleaner) -> Result<u64> {
        let mut handled = 0;

        for record in self.input.iter() {
            let start = Instant::now();
            let (unique, counts) = analyze(&record, cleaner);
            let valid_words = counts.values().sum::<u64>() as usize;

            self.unique_counts.send_item(MEDIAN_STAGE, unique)?;
            self.word_counts.send_item(ACCUMULATOR_STAGE, counts)?;

            self.metrics.record(valid_words, start.elapsed());
            handled += 1;
        }

        self.unique_counts.finish(MEDIAN_STAGE)?;
        self.word_counts.finish(ACCUMULATOR_STAGE)?;
        log::debug!("Worker {} finished after {} records", self.id, handled);
        Ok(handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::bounded;
    use crate::cleaner::StandardCleaner;
    use crate::error::StatsError;

    #[test]
    fn test_analyze_counts_valid_words() {
        let cleaner = StandardCleaner::with_stop_words(["the"]);
        let record = Record::new(7, "The cat saw the CAT, 42 times!");
        let (unique, counts) = analyze(&record, &cleaner);

        assert_eq!(unique, UniqueCount { sequence: 7, count: 3 });
        assert_eq!(counts.get("cat"), Some(&2));
        assert_eq!(counts.get("saw"), Some(&1));
        assert_eq!(counts.get("times"), Some(&1));
        assert_eq!(counts.get("the"), None);
        assert_eq!(counts.get("42"), None);
    }

    #[test]
    fn test_analyze_empty_line() {
        let (unique, counts) = analyze(&Record::new(0, ""), &StandardCleaner::new());
        assert_eq!(unique.count, 0);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_worker_sends_results_then_done() {
        let (work_tx, work_rx) = bounded(4);
        let (unique_tx, unique_rx) = bounded(4);
        let (counts_tx, counts_rx) = bounded(4);
        let metrics = StageMetrics::new();

        work_tx.send(Record::new(0, "a b b")).unwrap();
        drop(work_tx);

        let worker = Worker::new(0, work_rx, unique_tx, counts_tx, metrics.clone());
        let handled = worker.run(&StandardCleaner::new()).unwrap();

        assert_eq!(handled, 1);
        assert_eq!(
            unique_rx.recv().unwrap(),
            Message::Item(UniqueCount { sequence: 0, count: 2 })
        );
        assert_eq!(unique_rx.recv().unwrap(), Message::Done);
        match counts_rx.recv().unwrap() {
            Message::Item(counts) => assert_eq!(counts.get("b"), Some(&2)),
            Message::Done => panic!("expected counts before done"),
        }
        assert_eq!(counts_rx.recv().unwrap(), Message::Done);
        assert_eq!(metrics.total_records(), 1);
        assert_eq!(metrics.total_words(), 3);
    }

    #[test]
    fn test_worker_fails_when_downstream_gone() {
        let (work_tx, work_rx) = bounded(4);
        let (unique_tx, unique_rx) = bounded(4);
        let (counts_tx, _counts_rx) = bounded(4);
        drop(unique_rx);

        work_tx.send(Record::new(0, "hello")).unwrap();
        drop(work_tx);

        let worker = Worker::new(1, work_rx, unique_tx, counts_tx, StageMetrics::new());
        let err = worker.run(&StandardCleaner::new()).unwrap_err();
        assert!(matches!(err, StatsError::Disconnected(MEDIAN_STAGE)));
    }
}
