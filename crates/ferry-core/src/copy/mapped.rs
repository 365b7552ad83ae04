use std::path::Path;

use eyre::Result;

/// Copy `src` to `dst` by mapping both files and doing one bulk copy.
///
/// The destination is pre-sized to the exact source length before mapping.
/// Mapping a zero-length region is undefined, so an empty source is done as
/// soon as the destination has been created and truncated. Descriptors and
/// mappings are released on every exit path.
#[cfg(unix)]
pub fn mapped_copy_file(src: &Path, dst: &Path) -> Result<u64> {
    use std::fs::{File, OpenOptions};

    use eyre::{bail, Context};
    use memmap2::{Mmap, MmapOptions};

    let src_file = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let file_size = src_file
        .metadata()
        .with_context(|| format!("reading size of {}", src.display()))?
        .len();

    let dst_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)
        .with_context(|| format!("creating {}", dst.display()))?;

    if file_size == 0 {
        return Ok(0);
    }
    if usize::try_from(file_size).is_err() {
        bail!(
            "{} is too large to map on this host ({file_size} bytes)",
            src.display()
        );
    }

    dst_file
        .set_len(file_size)
        .with_context(|| format!("sizing {}", dst.display()))?;

    // Safety: both files stay open for the lifetime of the maps, and the
    // destination was created by us.
    let src_map =
        unsafe { Mmap::map(&src_file) }.with_context(|| format!("mapping {}", src.display()))?;
    let mut dst_map = unsafe { MmapOptions::new().map_mut(&dst_file) }
        .with_context(|| format!("mapping {}", dst.display()))?;

    if src_map.len() != dst_map.len() {
        bail!("{} changed size during copy", src.display());
    }
    dst_map.copy_from_slice(&src_map);
    dst_map
        .flush()
        .with_context(|| format!("flushing {}", dst.display()))?;

    Ok(file_size)
}

#[cfg(not(unix))]
pub fn mapped_copy_file(src: &Path, dst: &Path) -> Result<u64> {
    super::buffered_copy_file(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn roundtrips_contents() -> Result<()> {
        let tmp = tempdir()?;
        let src = tmp.path().join("src.bin");
        let dst = tmp.path().join("dst.bin");
        let payload: Vec<u8> = (0..128 * 1024).map(|i| (i % 253) as u8).collect();
        fs::write(&src, &payload)?;

        let bytes = mapped_copy_file(&src, &dst)?;
        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(fs::read(&dst)?, payload);
        Ok(())
    }

    #[test]
    fn zero_byte_source_skips_the_mapping() -> Result<()> {
        // The selector never routes empty files here, but the guard must
        // hold if the thresholds are ever reconfigured.
        let tmp = tempdir()?;
        let src = tmp.path().join("empty");
        let dst = tmp.path().join("copy");
        fs::write(&src, b"")?;

        assert_eq!(mapped_copy_file(&src, &dst)?, 0);
        assert_eq!(fs::metadata(&dst)?.len(), 0);
        Ok(())
    }

    #[test]
    fn stale_destination_is_truncated_to_source_length() -> Result<()> {
        let tmp = tempdir()?;
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let payload = vec![0x42u8; 70 * 1024];
        fs::write(&src, &payload)?;
        fs::write(&dst, vec![0xFFu8; 256 * 1024])?;

        mapped_copy_file(&src, &dst)?;
        assert_eq!(fs::metadata(&dst)?.len(), payload.len() as u64);
        assert_eq!(fs::read(&dst)?, payload);
        Ok(())
    }
}
