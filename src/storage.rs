//! Backing-store abstraction.
//!
//! The editing engine only needs seekable reads and writes plus the ability to
//! cut a store down to a given length. `Storage` captures exactly that, so the
//! containers work the same on a file on disk and on an in-memory buffer.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;

/// A seekable byte store that can be truncated.
pub trait Storage: Read + Write + Seek {
    /// Sets the logical end of the store to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Storage for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.get_mut().truncate(len);
        if self.position() > len as u64 {
            self.set_position(len as u64);
        }
        Ok(())
    }
}

/// Creates (or empties) a file opened for both reading and writing.
pub fn create_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Opens an existing file for reading and writing.
pub fn open_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_truncate_clamps_position() {
        let mut store = Cursor::new(vec![1u8; 16]);
        store.set_position(12);
        store.truncate(8).unwrap();
        assert_eq!(store.get_ref().len(), 8);
        assert_eq!(store.position(), 8);
    }
}
