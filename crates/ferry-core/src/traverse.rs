//! Depth-first traversal that mirrors directories and feeds the pool.

use std::fs;
use std::path::Path;

use eyre::Result;

use crate::logger::Logger;
use crate::pool::WorkerPool;
use crate::task::CopyTask;

/// Mirror the directory structure of `src` into `dst`, submitting every
/// file to `pool`.
///
/// Directory recursion stays on the calling thread; only file copies run on
/// the pool. A directory that cannot be read is skipped with the reason
/// reported through `logger`, and the run carries on with whatever else is
/// reachable.
pub fn copy_tree(src: &Path, dst: &Path, pool: &WorkerPool, logger: &dyn Logger) -> Result<()> {
    let entries = match fs::read_dir(src) {
        Ok(entries) => entries,
        Err(err) => {
            logger.error("traverse", src, &err.to_string());
            return Ok(());
        }
    };

    // Created only after the source proved readable, so a skipped subtree
    // leaves nothing behind on the destination side.
    if let Err(err) = fs::create_dir_all(dst) {
        // Each copy below will fail its own open and be reported there.
        logger.error("mkdir", dst, &err.to_string());
    }

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                logger.error("traverse", src, &err.to_string());
                continue;
            }
        };

        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        // Follows symlinks, like the type query in the selector; anything
        // that is not a directory goes to the pool as a file.
        if src_path.is_dir() {
            copy_tree(&src_path, &dst_path, pool, logger)?;
        } else {
            pool.submit(CopyTask::new(src_path, dst_path))?;
        }
    }

    Ok(())
}
