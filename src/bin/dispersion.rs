//! Load the words of a text file into a hash table and report how evenly a
//! hash function spreads them over the buckets.
//!
//! Bucket counts go to stdout as `<bucket> <count>` lines, the dispersion to
//! stderr, so the counts can be piped straight into a plotting tool.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use chaintable::{logger::initialize_logger, workload::load_file, BucketStats, HashFunction};
use clap::Parser;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text file to split into words
    file: PathBuf,

    /// Number of buckets in the table
    #[arg(short, long, default_value_t = 1024)]
    buckets: usize,

    /// Hash function, by name (djb2, crc32, ...) or catalogue index
    #[arg(short = 'f', long = "hash", default_value_t = HashFunction::Crc32)]
    hash: HashFunction,

    /// Also log total, mean, fullest bucket and empty buckets
    #[arg(short, long)]
    summary: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_file(&args.file, args.buckets, args.hash)?;
    let stats = BucketStats::from_table(&table);

    stats.write_counts(io::stdout().lock())?;
    writeln!(io::stderr(), "Dispersion {:.6}", stats.dispersion())?;

    if args.summary {
        info!(
            "{}: {} words, mean {:.3}, max {}, {} of {} buckets empty",
            args.hash,
            stats.total(),
            stats.mean(),
            stats.max(),
            stats.empty_buckets(),
            stats.bucket_count()
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    initialize_logger();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
