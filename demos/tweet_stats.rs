//! Running median of unique words per line, with a custom word cleaner
//!
//! Reads lines from stdin, prints one running median per line, then the ten
//! most frequent words of three letters or more.
//!
//! Usage: cargo run --example tweet_stats --release
//!        (Then type lines of text and press Ctrl-D to finish)

use std::io;
use tweet_stats::{
    Classification, LineSource, PipelineBuilder, Result, StandardCleaner, WordCleaner,
};

/// Standard cleaning, but words shorter than three letters don't count
struct LongWordCleaner(StandardCleaner);

impl WordCleaner for LongWordCleaner {
    fn clean(&self, raw: &str) -> (String, Classification) {
        let (word, class) = self.0.clean(raw);
        if class.is_valid() && word.chars().count() < 3 {
            (word, Classification::RejectedEmpty)
        } else {
            (word, class)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let pipeline = PipelineBuilder::new()
        .cleaner(LongWordCleaner(StandardCleaner::with_stop_words([
            "the", "and", "for",
        ])))
        .build()?;

    let mut totals = Vec::new();
    let summary = pipeline.run(LineSource::stdin(), io::stdout(), &mut totals)?;

    let mut top: Vec<(&str, u64)> = std::str::from_utf8(&totals)
        .unwrap_or_default()
        .lines()
        .filter_map(|line| {
            let (word, count) = line.rsplit_once(' ')?;
            Some((word.trim_end(), count.parse().ok()?))
        })
        .collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    println!("\n=== Top words ({} lines) ===", summary.records);
    for (i, (word, count)) in top.iter().take(10).enumerate() {
        println!("{:2}. {:<20} {}", i + 1, word, count);
    }
    println!("Workers: {}", summary.workers.format());
    Ok(())
}
