//! Parallel line statistics: a running median of unique words per line and
//! a global word-frequency table.
//!
//! Lines are numbered as they are read and fanned out to a pool of worker
//! threads. Each worker counts the valid words of a line and sends two
//! results downstream: the number of distinct words, tagged with the line's
//! sequence number, and the line's word counts. A resequencer puts the
//! distinct counts back in input order before feeding a histogram-based
//! running median, while an accumulator adds up word counts in whatever order
//! they arrive.
//!
//! # Features
//!
//! - Bounded crossbeam channels between every stage, so a slow consumer slows
//!   the reader down instead of growing memory
//! - Counted terminal messages: a consumer finishes only after every worker
//!   has said it is done
//! - O(1) median updates over a fixed-size histogram, with clamping
//! - Per-run summary: worker throughput and latency, resequencing depth
//!
//! # Example
//!
//! ```
//! use tweet_stats::{LineSource, PipelineBuilder};
//!
//! let pipeline = PipelineBuilder::new().workers(2).build()?;
//! let input = LineSource::from_reader("a\na b\nc c c\n".as_bytes());
//!
//! let mut medians = Vec::new();
//! let mut totals = Vec::new();
//! pipeline.run(input, &mut medians, &mut totals)?;
//!
//! assert_eq!(String::from_utf8(medians).unwrap(), "1.0\n1.5\n1.0\n");
//! # Ok::<(), tweet_stats::StatsError>(())
//! ```

pub mod accumulator;
pub mod channel;
pub mod cleaner;
pub mod dispatcher;
pub mod error;
pub mod median;
pub mod metrics;
pub mod pipeline;
pub mod resequencer;
pub mod source;
pub mod worker;

// Re-exports for convenience
pub use accumulator::{WordCounts, WordTotals};
pub use cleaner::{Classification, StandardCleaner, WordCleaner};
pub use error::{Result, StatsError};
pub use median::{RunningMedian, DEFAULT_MAX_WORDS, MAX_WORDS_LIMIT};
pub use metrics::{MetricsSnapshot, StageMetrics};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineConfig, RunSummary};
pub use resequencer::Resequencer;
pub use source::LineSource;
pub use worker::{Record, UniqueCount, ACCUMULATOR_STAGE, MEDIAN_STAGE, WORKER_STAGE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
