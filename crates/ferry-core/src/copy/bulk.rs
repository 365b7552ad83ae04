use std::path::Path;

use eyre::Result;

/// Copy `src` to `dst` with a kernel-mediated zero-copy loop.
///
/// The transfer runs entirely in the kernel via `sendfile`, tracking a
/// running offset until the whole source length has moved. Any failed
/// chunk aborts the file; there is no per-chunk retry. Both descriptors
/// are closed on every exit path.
#[cfg(target_os = "linux")]
pub fn bulk_copy_file(src: &Path, dst: &Path) -> Result<u64> {
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    use eyre::{bail, Context};

    let src_file = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let file_size = src_file
        .metadata()
        .with_context(|| format!("reading size of {}", src.display()))?
        .len();
    let dst_file = File::create(dst).with_context(|| format!("creating {}", dst.display()))?;

    let src_fd = src_file.as_raw_fd();
    let dst_fd = dst_file.as_raw_fd();

    // sendfile moves at most ~2 GiB per call; the loop picks up the rest.
    const MAX_SENDFILE: u64 = 0x7fff_f000;

    let mut offset: libc::off_t = 0;
    while (offset as u64) < file_size {
        let remaining = file_size - offset as u64;
        let count = remaining.min(MAX_SENDFILE) as usize;
        let sent = unsafe { libc::sendfile(dst_fd, src_fd, &mut offset, count) };
        if sent < 0 {
            let err = std::io::Error::last_os_error();
            bail!("sendfile {} -> {}: {err}", src.display(), dst.display());
        }
        if sent == 0 {
            // EOF before the stat-reported length: the source shrank.
            bail!(
                "sendfile {} -> {}: transfer stalled at {offset} of {file_size} bytes",
                src.display(),
                dst.display()
            );
        }
    }

    Ok(file_size)
}

/// Hosts without file-to-file `sendfile` take the buffered path.
#[cfg(not(target_os = "linux"))]
pub fn bulk_copy_file(src: &Path, dst: &Path) -> Result<u64> {
    super::buffered_copy_file(src, dst)
}
