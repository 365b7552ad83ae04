//! Size-adaptive single-file copy.

mod buffered;
mod bulk;
mod mapped;

pub use buffered::{buffered_copy_file, CHUNK_SIZE};
pub use bulk::bulk_copy_file;
pub use mapped::mapped_copy_file;

use std::fs;
use std::path::Path;

use eyre::{Context, Result};

use crate::logger::Logger;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Files at or below this size take the buffered strategy.
pub const BUFFERED_CEILING: u64 = 64 * KIB;
/// Files above this size take the bulk (kernel zero-copy) strategy.
pub const MAPPED_CEILING: u64 = 100 * MIB;

/// Transfer strategy for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    /// Kernel-mediated zero-copy transfer for very large files.
    Bulk,
    /// Memory-mapped copy for medium files.
    Mapped,
    /// Chunked read/write for small files; the universal fallback.
    Buffered,
}

impl CopyMethod {
    /// Pick the strategy for a file of `size` bytes.
    pub fn for_size(size: u64) -> Self {
        if size > MAPPED_CEILING {
            CopyMethod::Bulk
        } else if size > BUFFERED_CEILING {
            CopyMethod::Mapped
        } else {
            CopyMethod::Buffered
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CopyMethod::Bulk => "bulk",
            CopyMethod::Mapped => "mapped",
            CopyMethod::Buffered => "buffered",
        }
    }
}

/// Copy one file, choosing the strategy from a fresh size query.
///
/// The outcome is reported through `logger`. The chosen strategy's result is
/// returned unchanged; a failed strategy is never retried with another one.
pub fn copy_file(src: &Path, dst: &Path, logger: &dyn Logger) -> Result<u64> {
    logger.start(src, dst);

    let metadata = match fs::metadata(src).with_context(|| format!("stat {}", src.display())) {
        Ok(metadata) => metadata,
        Err(err) => {
            logger.error("stat", src, &format!("{err:#}"));
            return Err(err);
        }
    };

    let method = CopyMethod::for_size(metadata.len());
    log::trace!(
        "{} ({} bytes) -> {}",
        src.display(),
        metadata.len(),
        method.name()
    );

    let result = match method {
        CopyMethod::Bulk => bulk_copy_file(src, dst),
        CopyMethod::Mapped => mapped_copy_file(src, dst),
        CopyMethod::Buffered => buffered_copy_file(src, dst),
    };

    match result {
        Ok(bytes) => {
            logger.copy_done(method, src, dst, bytes);
            Ok(bytes)
        }
        Err(err) => {
            logger.error(method.name(), src, &format!("{err:#}"));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;
    use tempfile::tempdir;

    #[test]
    fn selector_thresholds_are_exact() {
        assert_eq!(CopyMethod::for_size(0), CopyMethod::Buffered);
        assert_eq!(CopyMethod::for_size(10), CopyMethod::Buffered);
        assert_eq!(CopyMethod::for_size(BUFFERED_CEILING), CopyMethod::Buffered);
        assert_eq!(CopyMethod::for_size(BUFFERED_CEILING + 1), CopyMethod::Mapped);
        assert_eq!(CopyMethod::for_size(MIB), CopyMethod::Mapped);
        assert_eq!(CopyMethod::for_size(MAPPED_CEILING), CopyMethod::Mapped);
        assert_eq!(CopyMethod::for_size(MAPPED_CEILING + 1), CopyMethod::Bulk);
        assert_eq!(CopyMethod::for_size(200 * MIB), CopyMethod::Bulk);
    }

    #[test]
    fn stat_failure_copies_nothing() -> Result<()> {
        let tmp = tempdir()?;
        let src = tmp.path().join("missing.bin");
        let dst = tmp.path().join("out.bin");

        assert!(copy_file(&src, &dst, &NoopLogger).is_err());
        assert!(!dst.exists());
        Ok(())
    }

    #[test]
    fn small_file_roundtrip() -> Result<()> {
        let tmp = tempdir()?;
        let src = tmp.path().join("a.txt");
        let dst = tmp.path().join("b.txt");
        fs::write(&src, b"ten bytes!")?;

        let bytes = copy_file(&src, &dst, &NoopLogger)?;
        assert_eq!(bytes, 10);
        assert_eq!(fs::read(&dst)?, b"ten bytes!");
        Ok(())
    }

    #[test]
    fn medium_file_roundtrip() -> Result<()> {
        let tmp = tempdir()?;
        let src = tmp.path().join("medium.bin");
        let dst = tmp.path().join("copy.bin");
        let payload: Vec<u8> = (0..200 * 1024).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &payload)?;

        let bytes = copy_file(&src, &dst, &NoopLogger)?;
        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(fs::read(&dst)?, payload);
        Ok(())
    }
}
