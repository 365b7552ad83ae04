use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;

use ferry_core::logger::{log_dir, Logger, RunLogger};
use ferry_core::pool::WorkerPool;
use ferry_core::stats::SharedStats;
use ferry_core::traverse::copy_tree;
use ferry_core::CopyConfig;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Mirror a directory tree using size-adaptive transfer strategies")]
struct Cli {
    /// Source directory to copy from
    source: PathBuf,
    /// Destination directory to copy into
    destination: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = CopyConfig::default();

    // A sink that cannot be created is the one fatal condition of a run.
    let logger = Arc::new(RunLogger::create(&log_dir())?);
    let sink: Arc<dyn Logger> = logger.clone();

    let stats = SharedStats::new();
    let pool = WorkerPool::new(config.workers, stats.clone(), sink)?;

    logger.run_start(&cli.source, &cli.destination);
    copy_tree(&cli.source, &cli.destination, &pool, logger.as_ref())?;
    pool.drain();
    logger.run_complete(&stats.snapshot());

    // Per-file failures were reported through the sink; they do not change
    // the exit status.
    Ok(())
}
