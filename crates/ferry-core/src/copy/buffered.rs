use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use eyre::{bail, Context, Result};

/// Size of the staging buffer, and the upper bound of the size band this
/// strategy is selected for.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Copy `src` to `dst` through a transient 64 KiB buffer.
///
/// A short write or any read error aborts the file; a zero-byte read ends
/// the loop successfully, so empty sources produce empty destinations.
pub fn buffered_copy_file(src: &Path, dst: &Path) -> Result<u64> {
    let mut src_file = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let mut dst_file = File::create(dst).with_context(|| format!("creating {}", dst.display()))?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let read = src_file
            .read(&mut buffer)
            .with_context(|| format!("reading {}", src.display()))?;
        if read == 0 {
            break;
        }
        let written = dst_file
            .write(&buffer[..read])
            .with_context(|| format!("writing {}", dst.display()))?;
        if written != read {
            bail!(
                "short write to {}: {written} of {read} bytes",
                dst.display()
            );
        }
        total += read as u64;
    }

    Ok(total)
}
