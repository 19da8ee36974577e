//! Byte-level container editing.
//!
//! `ByteFile` owns an open backing store and knows how to stream byte ranges
//! in and out of it and how to slide everything after a position forwards or
//! backwards. It has no idea what the bytes mean.
//!
//! Format layers wrap a `ByteFile` and implement [`Container`]. Their `shift`
//! first moves the bytes and then fixes up every offset they record, which
//! keeps `insert` and `remove` correct for free.

use std::fs::File;
use std::io::{self, Read, SeekFrom, Take, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::{self, Storage};
use crate::utils::relocate;

/// Staging-buffer size used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 100 * 1024;

/// An open byte store plus the staging-buffer size used for bulk copies.
#[derive(Debug)]
pub struct ByteFile<S: Storage = File> {
    store: Option<S>,
    path: Option<PathBuf>,
    buffer_size: usize,
}

impl ByteFile<File> {
    /// Creates a new empty file, replacing any existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = storage::create_file(path)?;
        Ok(Self::from_store(file).with_path(path))
    }

    /// Opens an existing file for editing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = storage::open_file(path)?;
        Ok(Self::from_store(file).with_path(path))
    }
}

impl<S: Storage> ByteFile<S> {
    /// Wraps an already open store.
    pub fn from_store(store: S) -> Self {
        Self {
            store: Some(store),
            path: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// Sets the block size used for copies. Zero is treated as one byte.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Path of the backing file, if it was opened by name.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// Flushes and releases the store. The bytes stay in the backing store.
    pub fn close(&mut self) -> Result<()> {
        let mut store = self.store.take().ok_or(Error::NotOpen)?;
        self.path = None;
        store.flush()?;
        Ok(())
    }

    /// Flushes and hands back the backing store.
    pub fn into_store(mut self) -> Result<S> {
        let mut store = self.store.take().ok_or(Error::NotOpen)?;
        store.flush()?;
        Ok(store)
    }

    pub(crate) fn store(&mut self) -> Result<&mut S> {
        self.store.as_mut().ok_or(Error::NotOpen)
    }

    /// Current length of the container in bytes.
    pub fn len(&mut self) -> Result<u64> {
        Ok(self.store()?.seek(SeekFrom::End(0))?)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let store = self.store()?;
        store.seek(SeekFrom::Start(offset))?;
        store.read_exact(buf).map_err(|e| short_io(e, offset, buf.len()))
    }

    pub(crate) fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let store = self.store()?;
        store.seek(SeekFrom::Start(offset))?;
        store.write_all(buf).map_err(|e| short_io(e, offset, buf.len()))
    }

    fn staging_buffer(&self, wanted: u64) -> Result<Vec<u8>> {
        let size = usize::try_from(wanted).map_or(self.buffer_size, |w| w.min(self.buffer_size));
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| Error::AllocationFailure(size))?;
        buf.resize(size, 0);
        Ok(buf)
    }

    /// Grows the container with zero bytes until it is at least `len` long.
    pub fn extend_to(&mut self, len: u64) -> Result<()> {
        let current = self.len()?;
        if current >= len {
            return Ok(());
        }
        self.write_zeroes(current, len - current)
    }

    /// Overwrites `size` bytes at `offset` with zeroes.
    pub fn write_zeroes(&mut self, offset: u64, size: u64) -> Result<()> {
        self.copy_in(offset, size, &mut io::repeat(0)).map(|_| ())
    }

    /// Streams `size` bytes starting at `offset` into `sink`.
    pub fn copy_out<W: Write + ?Sized>(&mut self, offset: u64, size: u64, sink: &mut W) -> Result<u64> {
        let mut buf = self.staging_buffer(size)?;
        let mut done = 0u64;
        while done < size {
            let block = (size - done).min(buf.len() as u64) as usize;
            self.read_at(offset + done, &mut buf[..block])?;
            sink.write_all(&buf[..block])
                .map_err(|e| short_io(e, offset + done, block))?;
            done += block as u64;
        }
        Ok(done)
    }

    /// Streams `size` bytes from `source` into the container at `offset`,
    /// first zero-extending the container if `offset` lies past its end.
    pub fn copy_in<R: Read + ?Sized>(&mut self, offset: u64, size: u64, source: &mut R) -> Result<u64> {
        self.extend_to(offset)?;
        let mut buf = self.staging_buffer(size)?;
        let mut done = 0u64;
        while done < size {
            let block = (size - done).min(buf.len() as u64) as usize;
            source
                .read_exact(&mut buf[..block])
                .map_err(|e| short_io(e, offset + done, block))?;
            self.write_at(offset + done, &buf[..block])?;
            done += block as u64;
        }
        Ok(done)
    }

    /// Lends a reader over `size` bytes starting at `offset`.
    ///
    /// The reader borrows the container, so nothing can move underneath it.
    pub fn range_reader(&mut self, offset: u64, size: u64) -> Result<Take<&mut S>> {
        let end = offset.checked_add(size).ok_or(Error::InvalidOffset(offset as i64))?;
        if end > self.len()? {
            return Err(Error::ShortIo { offset, expected: size });
        }
        let store = self.store()?;
        store.seek(SeekFrom::Start(offset))?;
        Ok(Read::take(store, size))
    }

    /// Moves every byte at or after `from` by `delta` positions.
    ///
    /// A positive delta opens a gap of `delta` bytes at `from` (its previous
    /// contents are left in place); a negative delta drops the `-delta` bytes
    /// just before `from` and truncates the container.
    pub fn shift_bytes(&mut self, from: u64, delta: i64) -> Result<()> {
        let len = self.len()?;
        if delta == 0 {
            return Ok(());
        }
        let dest = relocate(from, delta).ok_or(Error::InvalidOffset((from as i64).saturating_add(delta)))?;
        if from > len {
            return Err(Error::InvalidOffset(from as i64));
        }
        tracing::trace!(from, delta, len, "shifting bytes");

        let move_size = len - from;
        if delta > 0 {
            self.extend_to(dest + move_size)?;
        }

        let mut buf = self.staging_buffer(move_size)?;
        let mut done = 0u64;
        while done < move_size {
            let block = (move_size - done).min(buf.len() as u64);
            // Growing copies from the tail, shrinking from the head, so a
            // block is always read before anything overwrites it.
            let src = if delta > 0 {
                from + move_size - done - block
            } else {
                from + done
            };
            let dst = relocate(src, delta).ok_or(Error::InvalidOffset((src as i64).saturating_add(delta)))?;
            let chunk = &mut buf[..block as usize];
            self.read_at(src, chunk)?;
            self.write_at(dst, chunk)?;
            done += block;
        }

        if delta < 0 {
            let new_len = relocate(len, delta).ok_or(Error::InvalidOffset((len as i64).saturating_add(delta)))?;
            self.store()?.truncate(new_len)?;
        }
        Ok(())
    }
}

/// A byte container whose `shift` may be overridden to keep recorded offsets
/// valid. `insert` and `remove` are expressed in terms of `shift`.
pub trait Container {
    type Store: Storage;

    fn bytes(&mut self) -> &mut ByteFile<Self::Store>;

    /// Moves every byte at or after `from` by `delta` and re-homes any offsets
    /// the format records.
    fn shift(&mut self, from: u64, delta: i64) -> Result<()>;

    /// Opens a gap at `offset` and fills it with `size` bytes from `source`.
    fn insert<R: Read + ?Sized>(&mut self, offset: u64, size: u64, source: &mut R) -> Result<u64> {
        let delta = i64::try_from(size).map_err(|_| Error::InvalidOffset(offset as i64))?;
        self.shift(offset, delta)?;
        self.bytes().copy_in(offset, size, source)
    }

    fn insert_bytes(&mut self, offset: u64, data: &[u8]) -> Result<u64> {
        let mut source = data;
        self.insert(offset, data.len() as u64, &mut source)
    }

    fn insert_zeroes(&mut self, offset: u64, size: u64) -> Result<u64> {
        self.insert(offset, size, &mut io::repeat(0))
    }

    /// Deletes the `size` bytes at `offset`, closing the gap.
    fn remove(&mut self, offset: u64, size: u64) -> Result<u64> {
        let end = offset.checked_add(size).ok_or(Error::InvalidOffset(offset as i64))?;
        if end > self.bytes().len()? {
            return Err(Error::InvalidOffset(end as i64));
        }
        let delta = i64::try_from(size).map_err(|_| Error::InvalidOffset(offset as i64))?;
        self.shift(end, -delta)?;
        Ok(size)
    }
}

impl<S: Storage> Container for ByteFile<S> {
    type Store = S;

    fn bytes(&mut self) -> &mut ByteFile<S> {
        self
    }

    fn shift(&mut self, from: u64, delta: i64) -> Result<()> {
        self.shift_bytes(from, delta)
    }
}

fn short_io(err: io::Error, offset: u64, expected: usize) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => Error::ShortIo {
            offset,
            expected: expected as u64,
        },
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn container(data: &[u8], buffer_size: usize) -> ByteFile<Cursor<Vec<u8>>> {
        ByteFile::from_store(Cursor::new(data.to_vec())).with_buffer_size(buffer_size)
    }

    fn contents(file: ByteFile<Cursor<Vec<u8>>>) -> Vec<u8> {
        file.into_store().unwrap().into_inner()
    }

    #[test]
    fn shift_by_zero_is_a_no_op() {
        let mut file = container(b"abcdef", 4);
        file.shift(3, 0).unwrap();
        assert_eq!(contents(file), b"abcdef");
    }

    #[test]
    fn shift_before_start_fails_without_changes() {
        let mut file = container(b"abcdef", 4);
        assert!(matches!(file.shift(2, -3), Err(Error::InvalidOffset(_))));
        assert_eq!(contents(file), b"abcdef");
    }

    #[test]
    fn shift_from_past_end_fails() {
        let mut file = container(b"abc", 4);
        assert!(matches!(file.shift(4, 2), Err(Error::InvalidOffset(4))));
    }

    #[test]
    fn growing_shift_handles_overlap_with_small_blocks() {
        let mut file = container(b"0123456789", 3);
        file.shift(2, 4).unwrap();
        let data = contents(file);
        assert_eq!(data.len(), 14);
        assert_eq!(&data[6..], b"23456789");
        assert_eq!(&data[..2], b"01");
    }

    #[test]
    fn shrinking_shift_truncates() {
        let mut file = container(b"0123456789", 3);
        file.shift(6, -4).unwrap();
        assert_eq!(contents(file), b"016789");
    }

    #[test]
    fn insert_then_copy_out_round_trips() {
        let mut file = container(b"headtail", 2);
        file.insert_bytes(4, b"-body-").unwrap();
        let mut out = Vec::new();
        file.copy_out(4, 6, &mut out).unwrap();
        assert_eq!(out, b"-body-");
        assert_eq!(contents(file), b"head-body-tail");
    }

    #[test]
    fn remove_drops_the_addressed_range() {
        let mut file = container(b"keepDROPkeep", 5);
        assert_eq!(file.remove(4, 4).unwrap(), 4);
        assert_eq!(contents(file), b"keepkeep");
    }

    #[test]
    fn remove_past_end_is_rejected() {
        let mut file = container(b"abc", 5);
        assert!(file.remove(2, 4).is_err());
    }

    #[test]
    fn copy_in_past_end_zero_extends() {
        let mut file = container(b"ab", 8);
        file.copy_in(5, 2, &mut &b"xy"[..]).unwrap();
        assert_eq!(contents(file), b"ab\0\0\0xy");
    }

    #[test]
    fn short_source_reports_short_io() {
        let mut file = container(b"", 8);
        let err = file.copy_in(0, 4, &mut &b"xy"[..]).unwrap_err();
        assert!(matches!(err, Error::ShortIo { .. }));
    }

    #[test]
    fn closed_container_reports_not_open() {
        let mut file = container(b"abc", 8);
        file.close().unwrap();
        assert!(!file.is_open());
        assert!(matches!(file.len(), Err(Error::NotOpen)));
        assert!(matches!(file.close(), Err(Error::NotOpen)));
    }

    #[test]
    fn range_reader_is_bounded() {
        let mut file = container(b"0123456789", 8);
        let mut out = String::new();
        file.range_reader(3, 4).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "3456");
        assert!(file.range_reader(8, 4).is_err());
    }
}
