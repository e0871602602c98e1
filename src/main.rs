#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tweet_stats::median::DEFAULT_MAX_WORDS;
use tweet_stats::{LineSource, PipelineBuilder, StandardCleaner, VERSION};

/// File receiving the sorted word totals
const TOTALS_FILE: &str = "ft1.txt";
/// File receiving one running median per input line
const MEDIANS_FILE: &str = "ft2.txt";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Running median of unique words per line, and word totals, over a text stream.
#[derive(Parser, Debug)]
#[command(version, styles = STYLES)]
struct Args {
    /// File or directory of files to read; standard input when omitted
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Directory to write ft1.txt (word totals) and ft2.txt (running medians) to
    #[arg(short = 'o', long, default_value = "tweet_output")]
    output: PathBuf,

    /// File of stop words to exclude from both statistics
    #[arg(short = 's', long)]
    stop_words: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Largest unique-word count tracked exactly; larger counts are clamped
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Lines that may wait for a worker (default: twice the worker count)
    #[arg(long)]
    queue_capacity: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Running tweet-stats version {VERSION}");
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let cleaner = match &args.stop_words {
        Some(path) => load_stop_words(path)?,
        None => StandardCleaner::new(),
    };

    let mut builder = PipelineBuilder::new()
        .max_words(args.max_words)
        .cleaner(cleaner);
    if let Some(threads) = args.threads {
        builder = builder.workers(threads);
    }
    if let Some(capacity) = args.queue_capacity {
        builder = builder.queue_capacity(capacity);
    }
    let pipeline = builder.build()?;

    prepare_output_dir(&args.output)?;
    let totals_path = args.output.join(TOTALS_FILE);
    let medians_path = args.output.join(MEDIANS_FILE);
    let totals = File::create(&totals_path)
        .with_context(|| format!("Failed to create {}", totals_path.display()))?;
    let medians = File::create(&medians_path)
        .with_context(|| format!("Failed to create {}", medians_path.display()))?;

    let input = LineSource::open_or_stdin(args.input.as_deref()).with_context(|| {
        format!(
            "Failed to open input {}",
            args.input
                .as_deref()
                .map_or_else(|| "<stdin>".into(), |p| p.display().to_string())
        )
    })?;

    let summary = pipeline.run(input, medians, totals)?;
    info!(
        "Wrote {} medians to {} and {} word totals to {}",
        summary.records,
        medians_path.display(),
        summary.distinct_words,
        totals_path.display()
    );
    Ok(())
}

fn load_stop_words(path: &Path) -> Result<StandardCleaner> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open stop words {}", path.display()))?;
    let cleaner = StandardCleaner::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read stop words {}", path.display()))?;
    info!(
        "Loaded {} stop words from {}",
        cleaner.stop_word_count(),
        path.display()
    );
    Ok(cleaner)
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            bail!("Output path {} is not a directory", dir.display());
        }
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}
