//! conveyor CLI: run the producer/consumer pipeline from the command line.

use std::fmt;
use std::ops::RangeInclusive;

use clap::{Parser, Subcommand};
use conveyor_core::cancel::CancelToken;
use conveyor_core::config::PipelineConfig;
use conveyor_exec::{Pipeline, PipelineReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(about = "Move a finite sequence through a bounded blocking queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one producer and one consumer over a bounded queue
    Run {
        /// Queue capacity (overrides CONVEYOR_CAPACITY)
        #[arg(short, long, allow_negative_numbers = true)]
        capacity: Option<i64>,

        /// Comma-separated source items
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, conflicts_with = "count")]
        items: Option<Vec<i64>>,

        /// Use 1..=COUNT as the source
        #[arg(long)]
        count: Option<i64>,

        /// Per-put timeout in milliseconds (overrides CONVEYOR_PUT_TIMEOUT_MS)
        #[arg(long)]
        put_timeout_ms: Option<u64>,

        /// Per-take timeout in milliseconds (overrides CONVEYOR_TAKE_TIMEOUT_MS)
        #[arg(long)]
        take_timeout_ms: Option<u64>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Queue capacity (overrides CONVEYOR_CAPACITY)
        #[arg(short, long, allow_negative_numbers = true)]
        capacity: Option<i64>,
    },
}

/// Source used when neither `--items` nor `--count` is given.
const DEFAULT_COUNT: i64 = 9;

/// Sources longer than this are summarised instead of printed in full.
const PRINT_LIMIT: usize = 64;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            capacity,
            items,
            count,
            put_timeout_ms,
            take_timeout_ms,
        } => {
            let mut cfg = PipelineConfig::from_env();
            apply_overrides(&mut cfg, capacity, put_timeout_ms, take_timeout_ms);
            let source = resolve_source(items, count);
            if let Err(e) = run_pipeline(cfg, source) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Config { capacity } => {
            let mut cfg = PipelineConfig::from_env();
            apply_overrides(&mut cfg, capacity, None, None);
            match cfg.to_json_pretty() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn run_pipeline(cfg: PipelineConfig, source: Source) -> Result<(), Box<dyn std::error::Error>> {
    let len = source.len();
    tracing::info!(capacity = cfg.capacity, items = len, "starting pipeline");

    let pipeline = Pipeline::new(cfg);
    let report = if len <= PRINT_LIMIT {
        let source: Vec<i64> = source.into_iter().collect();
        println!("Source data : {:?}", source);
        let run = pipeline.run(source)?;
        println!("Destination data : {:?}", run.destination);
        run.report
    } else {
        println!("Source data : {}", source);
        let mut tally = Tally::default();
        let report = pipeline.run_into(source, &mut tally, &CancelToken::new())?;
        println!("Destination data : {}", tally);
        report
    };
    print_summary(&report, pipeline.config().capacity);

    if !report.is_completed() {
        return Err("pipeline did not complete".into());
    }
    Ok(())
}

fn print_summary(report: &PipelineReport, capacity: i64) {
    println!(
        "producer {} ({} items), consumer {} ({} items), peak occupancy {}/{}",
        report.producer.status,
        report.producer.produced,
        report.consumer.status,
        report.consumer.consumed,
        report.queue.peak_occupancy,
        capacity,
    );
}

/// CLI flags win over environment values.
fn apply_overrides(
    cfg: &mut PipelineConfig,
    capacity: Option<i64>,
    put_timeout_ms: Option<u64>,
    take_timeout_ms: Option<u64>,
) {
    if let Some(capacity) = capacity {
        cfg.capacity = capacity;
    }
    if let Some(ms) = put_timeout_ms {
        cfg.put_timeout_ms = Some(ms);
    }
    if let Some(ms) = take_timeout_ms {
        cfg.take_timeout_ms = Some(ms);
    }
}

fn resolve_source(items: Option<Vec<i64>>, count: Option<i64>) -> Source {
    match (items, count) {
        (Some(items), _) => Source::Listed(items),
        (None, Some(count)) => Source::Range(1..=count),
        (None, None) => Source::Range(1..=DEFAULT_COUNT),
    }
}

/// Items given on the command line, or a lazily generated range.
#[derive(Debug, Clone, PartialEq)]
enum Source {
    Listed(Vec<i64>),
    Range(RangeInclusive<i64>),
}

impl Source {
    fn len(&self) -> usize {
        match self {
            Source::Listed(items) => items.len(),
            Source::Range(range) => range.size_hint().0,
        }
    }
}

impl IntoIterator for Source {
    type Item = i64;
    type IntoIter = Box<dyn Iterator<Item = i64> + Send>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Source::Listed(items) => Box::new(items.into_iter()),
            Source::Range(range) => Box::new(range),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Listed(items) => write!(f, "{} listed items", items.len()),
            Source::Range(range) => {
                write!(f, "{}..={} ({} items)", range.start(), range.end(), self.len())
            }
        }
    }
}

/// Destination that keeps only the count and the first and last values.
#[derive(Debug, Default)]
struct Tally {
    count: usize,
    first: Option<i64>,
    last: Option<i64>,
}

impl Extend<i64> for Tally {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for v in iter {
            self.first.get_or_insert(v);
            self.last = Some(v);
            self.count += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first, self.last) {
            (Some(first), Some(last)) => {
                write!(f, "{} items, first {} last {}", self.count, first, last)
            }
            _ => write!(f, "0 items"),
        }
    }
}
