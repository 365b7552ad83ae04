//! Bounded worker pool driving per-file copies.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use eyre::{eyre, Context, Result};

use crate::copy;
use crate::logger::Logger;
use crate::stats::SharedStats;
use crate::task::CopyTask;

/// Fixed-size pool of persistent copy workers.
///
/// The task channel is bounded at the worker count, so at most `workers`
/// copies run at once and a saturated pool exerts backpressure on the
/// submitting traversal. The pool is shared across the entire traversal;
/// it is not reset per directory.
pub struct WorkerPool {
    tx: Sender<CopyTask>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` worker threads (at least one).
    pub fn new(workers: usize, stats: SharedStats, logger: Arc<dyn Logger>) -> Result<Self> {
        let workers = workers.max(1);
        let (tx, rx) = bounded::<CopyTask>(workers);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx = rx.clone();
            let stats = stats.clone();
            let logger = Arc::clone(&logger);
            let handle = thread::Builder::new()
                .name(format!("ferry-worker-{idx}"))
                .spawn(move || worker_loop(&rx, &stats, logger.as_ref()))
                .context("spawning copy worker")?;
            handles.push(handle);
        }

        Ok(Self { tx, handles })
    }

    /// Hand one task to the pool. Blocks while every worker is busy and the
    /// queue is full.
    pub fn submit(&self, task: CopyTask) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|_| eyre!("worker pool shut down before the traversal finished"))
    }

    /// Close the queue and wait for every in-flight copy to finish.
    pub fn drain(self) {
        let Self { tx, handles } = self;
        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                log::warn!("copy worker panicked");
            }
        }
    }
}

fn worker_loop(rx: &Receiver<CopyTask>, stats: &SharedStats, logger: &dyn Logger) {
    while let Ok(task) = rx.recv() {
        match copy::copy_file(task.source(), task.destination(), logger) {
            Ok(bytes) => stats.record_file(bytes),
            // The selector already reported the failure through the sink.
            Err(err) => stats.record_error(format!("{}: {err:#}", task.source().display())),
        }
    }
}
