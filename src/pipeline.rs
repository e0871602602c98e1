use crossbeam::channel::Receiver;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use crate::accumulator::{WordCounts, WordTotals};
use crate::channel::{self, drain_until_done, Message};
use crate::cleaner::{StandardCleaner, WordCleaner};
use crate::dispatcher::{dispatch, DispatchReport};
use crate::error::{Result, StatsError};
use crate::median::{format_median, RunningMedian, DEFAULT_MAX_WORDS, MAX_WORDS_LIMIT};
use crate::metrics::{MetricsSnapshot, StageMetrics};
use crate::resequencer::Resequencer;
use crate::worker::{UniqueCount, Worker, ACCUMULATOR_STAGE, MEDIAN_STAGE, WORKER_STAGE};

/// Number of workers used when none is configured
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    workers: Option<usize>,
    max_words: usize,
    queue_capacity: Option<usize>,
    cleaner: Option<Arc<dyn WordCleaner>>,
}

impl PipelineBuilder {
    /// Start with default settings
    pub fn new() -> Self {
        Self {
            workers: None,
            max_words: DEFAULT_MAX_WORDS,
            queue_capacity: None,
            cleaner: None,
        }
    }

    /// Number of worker threads (default: available parallelism)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Largest unique-word count tracked exactly; larger counts are clamped
    pub fn max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    /// Capacity of the work queue (default: twice the worker count)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Word cleaner shared by all workers (default: [`StandardCleaner`])
    pub fn cleaner(mut self, cleaner: impl WordCleaner + 'static) -> Self {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    /// Validate the settings and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        let workers = self.workers.unwrap_or_else(default_workers);
        if workers == 0 {
            return Err(StatsError::Config("worker count must be at least 1".into()));
        }

        let queue_capacity = self.queue_capacity.unwrap_or(workers * 2);
        if queue_capacity == 0 {
            return Err(StatsError::Config("queue capacity must be at least 1".into()));
        }

        if self.max_words > MAX_WORDS_LIMIT {
            return Err(StatsError::Config(format!(
                "max words {} is above the limit of {}",
                self.max_words, MAX_WORDS_LIMIT
            )));
        }

        Ok(Pipeline {
            config: PipelineConfig {
                workers,
                max_words: self.max_words,
                queue_capacity,
            },
            cleaner: self
                .cleaner
                .unwrap_or_else(|| Arc::new(StandardCleaner::new())),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated pipeline settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub workers: usize,
    pub max_words: usize,
    pub queue_capacity: usize,
}

/// Totals reported once a run has fully drained
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Lines read and processed
    pub records: u64,
    /// Distinct valid words in the totals table
    pub distinct_words: usize,
    /// Lines whose unique-word count was clamped to the histogram bound
    pub clamped: u64,
    /// Most results ever waiting in the resequencing buffer at once
    pub max_pending: usize,
    /// Times the dispatcher waited on a full work queue
    pub dispatch_blocks: u64,
    /// Whether input ended on a read error
    pub read_error: bool,
    /// Worker pool counters
    pub workers: MetricsSnapshot,
}

/// Result of the median stage
#[derive(Debug, Clone, Copy)]
struct MedianReport {
    records: u64,
    clamped: u64,
    max_pending: usize,
}

/// Computes the running median of unique words per line and the word totals
pub struct Pipeline {
    config: PipelineConfig,
    cleaner: Arc<dyn WordCleaner>,
}

impl Pipeline {
    /// Settings this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to the end of `lines`.
    ///
    /// One median per line is written to `medians`, in input order, while the
    /// input is consumed. The sorted word totals are written to `totals` once
    /// every line has been processed. Both sinks are flushed before this
    /// returns successfully.
    pub fn run<I, A, B>(&self, lines: I, medians: A, totals: B) -> Result<RunSummary>
    where
        I: IntoIterator<Item = io::Result<String>>,
        A: Write + Send,
        B: Write + Send,
    {
        let config = self.config;
        let cleaner: &dyn WordCleaner = self.cleaner.as_ref();
        let metrics = StageMetrics::new();

        log::info!(
            "Starting pipeline with {} workers, max words {}, queue capacity {}",
            config.workers,
            config.max_words,
            config.queue_capacity
        );

        thread::scope(|scope| {
            let (work_tx, work_rx) = channel::bounded(config.queue_capacity);
            let downstream_capacity = config.queue_capacity.max(config.workers);
            let (unique_tx, unique_rx) = channel::bounded(downstream_capacity);
            let (counts_tx, counts_rx) = channel::bounded(downstream_capacity);

            let median_handle = scope.spawn(move || {
                run_median_stage(unique_rx, config.workers, config.max_words, medians)
            });
            let accumulator_handle =
                scope.spawn(move || run_accumulator_stage(counts_rx, config.workers, totals));

            let worker_handles: Vec<_> = (0..config.workers)
                .map(|id| {
                    let worker = Worker::new(
                        id,
                        work_rx.clone(),
                        unique_tx.clone(),
                        counts_tx.clone(),
                        metrics.clone(),
                    );
                    scope.spawn(move || worker.run(cleaner))
                })
                .collect();
            drop(work_rx);

            let report = dispatch(lines, &work_tx);
            // Closing the work queue lets the workers run dry and finish.
            drop(work_tx);
            log::debug!("Dispatched {} lines", report.records);

            let mut errors = Vec::new();
            for handle in worker_handles {
                if let Err(e) = join_stage(handle, WORKER_STAGE) {
                    errors.push(e);
                }
            }

            // Every worker has sent its terminal messages; close the fan-in.
            drop(unique_tx);
            drop(counts_tx);

            let median = join_stage(median_handle, MEDIAN_STAGE);
            let distinct_words = join_stage(accumulator_handle, ACCUMULATOR_STAGE);

            let (median, distinct_words) = match (median, distinct_words) {
                (Ok(median), Ok(distinct_words)) if errors.is_empty() => (median, distinct_words),
                (median, distinct_words) => {
                    errors.extend(median.err());
                    errors.extend(distinct_words.err());
                    return Err(root_cause(errors));
                }
            };

            finish(report, median, distinct_words, metrics.snapshot())
        })
    }
}

fn finish(
    report: DispatchReport,
    median: MedianReport,
    distinct_words: usize,
    workers: MetricsSnapshot,
) -> Result<RunSummary> {
    if median.records != report.records {
        return Err(StatsError::SequenceError(format!(
            "dispatched {} lines but released {} medians",
            report.records, median.records
        )));
    }

    let summary = RunSummary {
        records: report.records,
        distinct_words,
        clamped: median.clamped,
        max_pending: median.max_pending,
        dispatch_blocks: report.blocked,
        read_error: report.read_error,
        workers,
    };

    if summary.clamped > 0 {
        log::warn!(
            "{} lines had more unique words than the histogram tracks and were clamped",
            summary.clamped
        );
    }
    log::info!(
        "Processed {} lines, {} distinct words, resequencing buffer peaked at {}, dispatcher blocked {} times",
        summary.records,
        summary.distinct_words,
        summary.max_pending,
        summary.dispatch_blocks
    );
    log::info!("Workers: {}", summary.workers.format());
    Ok(summary)
}

/// Pick the error that explains the others.
///
/// A panic starves consumers of terminal messages, a consumer that stops
/// early makes producers' sends fail, and a producer that stops early leaves
/// consumers short of terminal messages. Ties go to the earliest collected.
fn root_cause(errors: Vec<StatsError>) -> StatsError {
    fn rank(e: &StatsError) -> u8 {
        match e {
            StatsError::StagePanicked(_) => 0,
            StatsError::IncompleteShutdown { .. } => 2,
            StatsError::Disconnected(_) => 3,
            _ => 1,
        }
    }

    errors
        .into_iter()
        .min_by_key(rank)
        .unwrap_or(StatsError::StagePanicked("pipeline"))
}

fn join_stage<T>(handle: ScopedJoinHandle<'_, Result<T>>, stage: &'static str) -> Result<T> {
    handle
        .join()
        .unwrap_or(Err(StatsError::StagePanicked(stage)))
}

fn run_median_stage<W: Write>(
    input: Receiver<Message<UniqueCount>>,
    producers: usize,
    max_words: usize,
    out: W,
) -> Result<MedianReport> {
    let mut out = BufWriter::new(out);
    let mut reseq = Resequencer::new();
    let mut median = RunningMedian::new(max_words);

    drain_until_done(MEDIAN_STAGE, &input, producers, |unique| {
        reseq.insert(unique.sequence, unique.count)?;
        for count in reseq.drain_ready() {
            if median.update(count) {
                log::debug!("Clamped a line with {count} unique words to {max_words}");
            }
            writeln!(out, "{}", format_median(median.median()))?;
        }
        Ok(())
    })?;

    reseq.finish()?;
    out.flush()?;

    Ok(MedianReport {
        records: median.total(),
        clamped: median.clamped(),
        max_pending: reseq.high_water(),
    })
}

fn run_accumulator_stage<W: Write>(
    input: Receiver<Message<WordCounts>>,
    producers: usize,
    out: W,
) -> Result<usize> {
    let mut totals = WordTotals::new();
    drain_until_done(ACCUMULATOR_STAGE, &input, producers, |counts| {
        totals.merge(counts);
        Ok(())
    })?;

    let mut out = BufWriter::new(out);
    totals.write_to(&mut out)?;
    out.flush()?;
    Ok(totals.len())
}
