//! Input opening with transparent gzip handling.
//!
//! BAM files arrive BGZF-framed, which is a concatenation of gzip members;
//! a multi-member gzip reader decodes the whole stream. Plain, uncompressed
//! BAM is passed through untouched (the magic check downstream rejects
//! anything else). Large files are memory-mapped to avoid read syscalls on
//! the hot path; small files go through ordinary buffered reads where mmap
//! setup costs more than it saves.

use crate::error::Result;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// File size above which the input is memory-mapped.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Open an input file, decompressing gzip/BGZF framing transparently.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let mut raw = open_raw(path.as_ref())?;
    let gzipped = {
        let head = raw.fill_buf()?;
        head.len() >= 2 && head[0] == 31 && head[1] == 139
    };
    if gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(raw))))
    } else {
        Ok(raw)
    }
}

/// Open the file bytes with a size-based choice of I/O method.
fn open_raw(path: &Path) -> Result<Box<dyn BufRead>> {
    let file_size = std::fs::metadata(path)?.len();
    if file_size >= MMAP_THRESHOLD {
        open_mmap(path)
    } else {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(target_os = "macos")]
fn open_mmap(path: &Path) -> Result<Box<dyn BufRead>> {
    use libc::{madvise, MADV_SEQUENTIAL, MADV_WILLNEED};

    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    // sequential access hint for the page cache
    unsafe {
        madvise(
            mmap.as_ptr() as *mut _,
            mmap.len(),
            MADV_SEQUENTIAL | MADV_WILLNEED,
        );
    }

    Ok(Box::new(std::io::Cursor::new(mmap)))
}

#[cfg(not(target_os = "macos"))]
fn open_mmap(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Box::new(std::io::Cursor::new(mmap)))
}
