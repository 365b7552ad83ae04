//! Copy-event sink shared by the traversal and the workers.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use parking_lot::Mutex;

use crate::copy::CopyMethod;
use crate::stats::CopyStats;

/// Receives every event of a copy run. Implementations must be shareable
/// across worker threads.
pub trait Logger: Send + Sync {
    /// A run is starting for the given roots.
    fn run_start(&self, src: &Path, dst: &Path);
    /// A worker is about to copy `src` to `dst`.
    fn start(&self, src: &Path, dst: &Path);
    /// One file finished copying.
    fn copy_done(&self, method: CopyMethod, src: &Path, dst: &Path, bytes: u64);
    /// An operation on `path` failed; `op` names the failing stage.
    fn error(&self, op: &str, path: &Path, msg: &str);
    /// The run finished; `stats` is the final snapshot.
    fn run_complete(&self, stats: &CopyStats);
}

/// Sink that drops every event. For tests and embedders that do their own
/// reporting.
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn run_start(&self, _src: &Path, _dst: &Path) {}
    fn start(&self, _src: &Path, _dst: &Path) {}
    fn copy_done(&self, _method: CopyMethod, _src: &Path, _dst: &Path, _bytes: u64) {}
    fn error(&self, _op: &str, _path: &Path, _msg: &str) {}
    fn run_complete(&self, _stats: &CopyStats) {}
}

const LOG_DIR_ENV: &str = "FERRY_LOG_DIR";
const DEFAULT_LOG_DIR: &str = "/var/log/ferry";

/// Resolve the directory run logs are written to.
/// Priority: explicit `FERRY_LOG_DIR` override -> `/var/log/ferry`.
pub fn log_dir() -> PathBuf {
    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(DEFAULT_LOG_DIR),
    }
}

/// Dual console / log-file sink used by the CLI. Every reported event is
/// printed and appended to a run-scoped log file.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Create the log directory and a timestamped log file inside it.
    ///
    /// Failure here is fatal to the run; there is no degraded console-only
    /// mode.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("ferry-{stamp}.log"));
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        writeln!(file, "===== ferry execution log =====")
            .with_context(|| format!("writing header to {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the log file backing this sink.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) {
        let mut file = self.file.lock();
        // A log-file write failure must not take down the run.
        let _ = writeln!(file, "{line}");
    }
}

impl Logger for RunLogger {
    fn run_start(&self, src: &Path, dst: &Path) {
        let line = format!("Starting copy: {} -> {}", src.display(), dst.display());
        println!("{line}");
        self.append(&line);
    }

    fn start(&self, src: &Path, dst: &Path) {
        log::debug!("copying {} -> {}", src.display(), dst.display());
    }

    fn copy_done(&self, method: CopyMethod, src: &Path, dst: &Path, bytes: u64) {
        let line = format!(
            "INFO: copied via {} ({bytes} bytes): {} -> {}",
            method.name(),
            src.display(),
            dst.display()
        );
        println!("{line}");
        self.append(&line);
    }

    fn error(&self, op: &str, path: &Path, msg: &str) {
        let line = format!("ERROR: {op} {}: {msg}", path.display());
        eprintln!("{}", line.red());
        self.append(&line);
    }

    fn run_complete(&self, stats: &CopyStats) {
        let mut lines = vec![format!(
            "Total files copied: {} ({} bytes)",
            stats.files_copied, stats.bytes_copied
        )];
        if !stats.errors.is_empty() {
            lines.push(format!("{} file(s) failed", stats.errors.len()));
        }
        lines.push("Copy run completed.".to_string());
        for line in &lines {
            println!("{line}");
            self.append(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_timestamped_log_with_header() -> Result<()> {
        let tmp = tempdir()?;
        let logger = RunLogger::create(tmp.path())?;

        let name = logger.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ferry-"));
        assert!(name.ends_with(".log"));

        let contents = fs::read_to_string(logger.path())?;
        assert!(contents.contains("===== ferry execution log ====="));
        Ok(())
    }

    #[test]
    fn events_are_appended_to_the_log_file() -> Result<()> {
        let tmp = tempdir()?;
        let logger = RunLogger::create(tmp.path())?;

        logger.run_start(Path::new("/src"), Path::new("/dst"));
        logger.copy_done(
            CopyMethod::Buffered,
            Path::new("/src/a"),
            Path::new("/dst/a"),
            10,
        );
        logger.error("stat", Path::new("/src/b"), "permission denied");
        logger.run_complete(&CopyStats {
            files_copied: 1,
            bytes_copied: 10,
            errors: vec!["b".to_string()],
        });

        let contents = fs::read_to_string(logger.path())?;
        assert!(contents.contains("Starting copy: /src -> /dst"));
        assert!(contents.contains("INFO: copied via buffered (10 bytes): /src/a -> /dst/a"));
        assert!(contents.contains("ERROR: stat /src/b: permission denied"));
        assert!(contents.contains("Total files copied: 1 (10 bytes)"));
        assert!(contents.contains("1 file(s) failed"));
        Ok(())
    }

    #[test]
    fn log_dir_honors_override() {
        // Not run in parallel with other env-sensitive tests in this crate.
        std::env::set_var(LOG_DIR_ENV, "/tmp/ferry-test-logs");
        assert_eq!(log_dir(), PathBuf::from("/tmp/ferry-test-logs"));
        std::env::remove_var(LOG_DIR_ENV);
        assert_eq!(log_dir(), PathBuf::from(DEFAULT_LOG_DIR));
    }
}
