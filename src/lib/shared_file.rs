//! A read-only file handle shared by every worker of a batch.
//!
//! All reads are positioned reads; the handle's seek cursor is never used, so any number
//! of threads may read through one `&SharedFile` at once.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only file opened once per batch and borrowed by every chunk task.
#[derive(Debug)]
pub struct SharedFile {
    file: File,
    path: PathBuf,
}

impl SharedFile {
    /// Opens `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self { file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the file in bytes.
    pub fn file_len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// One positioned read of up to `buf.len()` bytes at `offset`.
    #[cfg(unix)]
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    /// One positioned read of up to `buf.len()` bytes at `offset`.
    #[cfg(windows)]
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }

    /// Reads at `offset` until `buf` is full or the file ends.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only at end of
    /// file. Interrupted reads are resumed; every other error is returned as is. A range
    /// that runs past `u64::MAX` is rejected with [`io::ErrorKind::InvalidInput`].
    pub fn read_fully_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset.checked_add(buf.len() as u64).is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("read of {} bytes at offset {offset} overflows the file offset", buf.len()),
            ));
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Closes the handle.
    ///
    /// Takes `self`, so it can only run once every borrow held by worker threads has
    /// ended.
    pub fn close(self) {
        log::debug!("Closing {}", self.path.display());
        drop(self.file);
    }
}
