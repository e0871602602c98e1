use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ring of the most recent per-line latencies.
///
/// Workers overwrite the oldest slot once the ring is full.
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    ring: Arc<Mutex<Ring>>,
}

#[derive(Debug)]
struct Ring {
    /// Nanoseconds
    samples: Vec<u64>,
    next: usize,
    capacity: usize,
}

/// Median and tail latency of a window, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyPercentiles {
    pub p50_us: f64,
    pub p99_us: f64,
}

impl LatencyWindow {
    /// Create a window keeping at most `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(Mutex::new(Ring {
                samples: Vec::with_capacity(capacity),
                next: 0,
                capacity,
            })),
        }
    }

    /// Add the time one line took
    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        let mut ring = self.ring.lock();
        if ring.samples.len() < ring.capacity {
            ring.samples.push(nanos);
        } else {
            let slot = ring.next;
            ring.samples[slot] = nanos;
        }
        ring.next = (ring.next + 1) % ring.capacity;
    }

    /// Nearest-rank p50 and p99 over the samples currently held
    pub fn percentiles(&self) -> LatencyPercentiles {
        let mut sorted = self.ring.lock().samples.clone();
        if sorted.is_empty() {
            return LatencyPercentiles::default();
        }
        sorted.sort_unstable();

        let rank = |p: f64| ((sorted.len() as f64 * p).ceil() as usize).saturating_sub(1);
        LatencyPercentiles {
            p50_us: sorted[rank(0.50)] as f64 / 1000.0,
            p99_us: sorted[rank(0.99)] as f64 / 1000.0,
        }
    }
}

/// Counters shared by every thread of one stage
#[derive(Debug, Clone)]
pub struct StageMetrics {
    records: Arc<AtomicU64>,
    words: Arc<AtomicU64>,
    latency: LatencyWindow,
    start_time: Instant,
}

impl StageMetrics {
    /// Create a collector; throughput is measured from this moment
    pub fn new() -> Self {
        Self {
            records: Arc::new(AtomicU64::new(0)),
            words: Arc::new(AtomicU64::new(0)),
            latency: LatencyWindow::new(1024),
            start_time: Instant::now(),
        }
    }

    /// Record one processed line with its valid word count and latency
    pub fn record(&self, valid_words: usize, elapsed: Duration) {
        self.records.fetch_add(1, Ordering::Relaxed);
        self.words.fetch_add(valid_words as u64, Ordering::Relaxed);
        self.latency.record(elapsed);
    }

    /// Lines processed so far
    pub fn total_records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Valid words seen so far
    pub fn total_words(&self) -> u64 {
        self.words.load(Ordering::Relaxed)
    }

    /// Lines per second since creation
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            self.total_records() as f64 / elapsed
        }
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.latency.percentiles();
        MetricsSnapshot {
            records: self.total_records(),
            words: self.total_words(),
            throughput: self.throughput(),
            latency_p50_us: latency.p50_us,
            latency_p99_us: latency.p99_us,
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for StageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage counters at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub records: u64,
    pub words: u64,
    pub throughput: f64,
    pub latency_p50_us: f64,
    pub latency_p99_us: f64,
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    /// Human-readable one-line summary
    pub fn format(&self) -> String {
        format!(
            "Lines: {}, Words: {}, Throughput: {:.2} lines/s, \
             Latency P50: {:.2}µs, P99: {:.2}µs, Elapsed: {:.2}s",
            self.records,
            self.words,
            self.throughput,
            self.latency_p50_us,
            self.latency_p99_us,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_percentiles() {
        let window = LatencyWindow::new(16);
        for i in 1..=10 {
            window.record(Duration::from_micros(i));
        }
        let latency = window.percentiles();
        assert_eq!(latency.p50_us, 5.0);
        assert_eq!(latency.p99_us, 10.0);
    }

    #[test]
    fn test_window_overwrites_oldest() {
        let window = LatencyWindow::new(3);
        for i in 1..=5 {
            window.record(Duration::from_micros(i * 100));
        }
        // 100 and 200 were overwritten by 400 and 500
        assert_eq!(window.percentiles().p50_us, 400.0);
        assert_eq!(window.percentiles().p99_us, 500.0);
    }

    #[test]
    fn test_empty_window() {
        let window = LatencyWindow::new(0);
        assert_eq!(window.percentiles(), LatencyPercentiles::default());
        window.record(Duration::from_micros(7));
        window.record(Duration::from_micros(9));
        assert_eq!(window.percentiles().p50_us, 9.0);
    }

    #[test]
    fn test_stage_metrics_shared_across_clones() {
        let metrics = StageMetrics::new();
        let clone = metrics.clone();
        for _ in 0..100 {
            clone.record(3, Duration::from_micros(2));
        }
        assert_eq!(metrics.total_records(), 100);
        assert_eq!(metrics.total_words(), 300);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records, 100);
        assert!(snapshot.format().contains("Lines: 100"));
    }
}
