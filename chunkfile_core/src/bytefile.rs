use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::buffer::FixedByteBuffer;
use crate::error::{ChunkFileError, Result};

/// Byte-addressable file with an explicit cursor.
///
/// # Lifecycle
/// A `ByteFile` starts closed. [`open`](Self::open) creates the file if it is missing and puts
/// the cursor at 0; [`close`](Self::close) (or dropping the value) releases the handle. Every
/// query except [`is_open`](Self::is_open) fails with [`ChunkFileError::NotOpen`] while closed.
///
/// # Cursor
/// Seeking only moves the logical cursor, so any `u64` offset is accepted. The OS handle is
/// positioned when a read or write actually happens, and an offset the filesystem cannot reach
/// fails there with [`ChunkFileError::Io`].
///
/// # Size
/// `size()` is the content length. Writes extend it to `cursor + len` when they go past the
/// end; nothing here ever shrinks it. Seeking past the end is allowed. A write issued there
/// makes the filesystem zero-fill the gap, while a read issued there fails with `ShortRead`
/// because no content lies beyond `size()`.
///
/// # Reads
/// Reads are all-or-nothing: if fewer bytes remain than were requested the call fails before
/// touching the caller's buffer, and the cursor does not move.
#[derive(Debug, Default)]
pub struct ByteFile {
    inner: Option<OpenFile>,
}

/// State that only exists while a handle is open.
#[derive(Debug)]
struct OpenFile {
    file: File,
    path: PathBuf,
    /// Logical cursor. The OS handle is only moved here right before a transfer.
    cursor: u64,
    size: u64,
}

impl ByteFile {
    /// A closed handle.
    pub fn new() -> Self {
        Self { inner: None }
    }

    /// Shorthand for `new()` followed by `open(path)`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = Self::new();
        file.open(path)?;
        Ok(file)
    }

    /// Open `path` for reading and writing, creating it when absent.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(open) = &self.inner {
            return Err(ChunkFileError::AlreadyOpen {
                path: open.path.clone(),
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ChunkFileError::NotFound {
                    path: path.to_path_buf(),
                },
                _ => ChunkFileError::Io(e),
            })?;
        let size = file.metadata()?.len();

        debug!(path = %path.display(), size, "opened byte file");
        self.inner = Some(OpenFile {
            file,
            path: path.to_path_buf(),
            cursor: 0,
            size,
        });
        Ok(())
    }

    /// Release the handle. Closing a handle that is not open does nothing.
    ///
    /// The handle is released even when the final flush fails; the flush error is returned.
    pub fn close(&mut self) -> Result<()> {
        match self.inner.take() {
            Some(mut open) => {
                debug!(path = %open.path.display(), size = open.size, "closing byte file");
                open.file.flush()?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Path of the open file, `None` while closed.
    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|open| open.path.as_path())
    }

    pub fn position(&self) -> Result<u64> {
        Ok(self.handle()?.cursor)
    }

    pub fn size(&self) -> Result<u64> {
        Ok(self.handle()?.size)
    }

    /// Bytes between the cursor and the end of the content (0 when the cursor is past the end).
    pub fn remaining(&self) -> Result<u64> {
        let open = self.handle()?;
        Ok(open.size.saturating_sub(open.cursor))
    }

    /// Move the cursor to an absolute offset. Offsets past `size()` are allowed.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.handle_mut()?.seek_to(offset)
    }

    /// Move the cursor by `delta` bytes from its current position.
    pub fn seek_relative(&mut self, delta: i64) -> Result<u64> {
        let open = self.handle_mut()?;
        let from = open.cursor;
        let target = from
            .checked_add_signed(delta)
            .ok_or(ChunkFileError::InvalidSeek { from, delta })?;
        open.seek_to(target)
    }

    /// Write `data` at the cursor and advance past it.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.handle_mut()?.write_at_cursor(data)
    }

    pub fn write_buffer<const N: usize>(&mut self, buf: &FixedByteBuffer<N>) -> Result<()> {
        self.write_bytes(buf.as_bytes())
    }

    /// Read exactly `count` bytes from the cursor.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let open = self.handle_mut()?;
        open.check_available(count as u64)?;
        let mut data = vec![0u8; count];
        open.read_at_cursor(&mut data)?;
        Ok(data)
    }

    /// Fill `buf` completely from the cursor.
    pub fn read_bytes_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let open = self.handle_mut()?;
        open.check_available(buf.len() as u64)?;
        open.read_at_cursor(buf)
    }

    pub fn read_buffer<const N: usize>(&mut self) -> Result<FixedByteBuffer<N>> {
        let mut buf = FixedByteBuffer::<N>::zeroed();
        self.read_bytes_into(buf.as_bytes_mut())?;
        Ok(buf)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.handle_mut()?.file.flush()?;
        Ok(())
    }

    fn handle(&self) -> Result<&OpenFile> {
        self.inner.as_ref().ok_or(ChunkFileError::NotOpen)
    }

    fn handle_mut(&mut self) -> Result<&mut OpenFile> {
        self.inner.as_mut().ok_or(ChunkFileError::NotOpen)
    }
}

impl Drop for ByteFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!(error = %e, "flush failed while dropping byte file");
        }
    }
}

impl OpenFile {
    fn seek_to(&mut self, offset: u64) -> Result<u64> {
        self.cursor = offset;
        Ok(offset)
    }

    fn check_available(&self, requested: u64) -> Result<()> {
        let available = self.size.saturating_sub(self.cursor);
        if requested > available {
            return Err(ChunkFileError::ShortRead {
                offset: self.cursor,
                requested,
                available,
            });
        }
        Ok(())
    }

    fn read_at_cursor(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.cursor))?;
        self.file.read_exact(buf)?;
        self.cursor += buf.len() as u64;
        Ok(())
    }

    fn write_at_cursor(&mut self, data: &[u8]) -> Result<()> {
        let start = self.cursor;
        let end = start.checked_add(data.len() as u64).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "write would end past u64::MAX")
        })?;
        self.file.seek(SeekFrom::Start(start))?;
        if let Err(e) = self.file.write_all(data) {
            self.refresh_size();
            return Err(e.into());
        }
        self.cursor = end;
        if end > self.size {
            self.size = end;
        }
        trace!(offset = start, len = data.len(), size = self.size, "wrote bytes");
        Ok(())
    }

    /// Pick up any growth a partial write may have caused.
    fn refresh_size(&mut self) {
        if let Ok(meta) = self.file.metadata() {
            self.size = self.size.max(meta.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.bytes");
        (dir, path)
    }

    #[test]
    fn closed_handle_rejects_queries() {
        let mut f = ByteFile::new();
        assert!(!f.is_open());
        assert!(matches!(f.position(), Err(ChunkFileError::NotOpen)));
        assert!(matches!(f.size(), Err(ChunkFileError::NotOpen)));
        assert!(matches!(f.seek(3), Err(ChunkFileError::NotOpen)));
        assert!(matches!(f.write_bytes(b"x"), Err(ChunkFileError::NotOpen)));
        assert!(matches!(f.read_bytes(1), Err(ChunkFileError::NotOpen)));
        // closing a never-opened handle is a no-op
        f.close().unwrap();
    }

    #[test]
    fn second_open_is_rejected() {
        let (_dir, path) = scratch();
        let mut f = ByteFile::open_path(&path).unwrap();
        let err = f.open(&path).unwrap_err();
        assert!(matches!(err, ChunkFileError::AlreadyOpen { .. }));
        assert!(f.is_open());
    }

    #[test]
    fn missing_parent_is_not_found() {
        let (dir, _) = scratch();
        let path = dir.path().join("no_such_dir").join("f.bytes");
        let err = ByteFile::open_path(&path).unwrap_err();
        assert!(matches!(err, ChunkFileError::NotFound { .. }), "got {err:?}");
    }

    #[test]
    fn relative_seek_cannot_go_negative() {
        let (_dir, path) = scratch();
        let mut f = ByteFile::open_path(&path).unwrap();
        f.seek(4).unwrap();
        assert_eq!(f.seek_relative(-4).unwrap(), 0);
        let err = f.seek_relative(-1).unwrap_err();
        assert!(matches!(err, ChunkFileError::InvalidSeek { from: 0, delta: -1 }));
        assert_eq!(f.seek_relative(10).unwrap(), 10);
    }

    #[test]
    fn unreachable_write_fails_without_moving() {
        let (_dir, path) = scratch();
        let mut f = ByteFile::open_path(&path).unwrap();
        f.write_bytes(&[1, 2, 3]).unwrap();

        for offset in [1u64 << 63, u64::MAX - 1] {
            f.seek(offset).unwrap();
            let err = f.write_bytes(&[7; 4]).unwrap_err();
            assert!(matches!(err, ChunkFileError::Io(_)), "offset {offset}: {err:?}");
            assert_eq!(f.position().unwrap(), offset);
            assert_eq!(f.size().unwrap(), 3);
        }

        f.seek(0).unwrap();
        assert_eq!(f.read_bytes(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn overwrite_inside_content_keeps_size() {
        let (_dir, path) = scratch();
        let mut f = ByteFile::open_path(&path).unwrap();
        f.write_bytes(&[1, 2, 3, 4, 5, 6]).unwrap();
        f.seek(2).unwrap();
        f.write_bytes(&[9, 9]).unwrap();
        assert_eq!(f.position().unwrap(), 4);
        assert_eq!(f.size().unwrap(), 6);
        f.seek(0).unwrap();
        assert_eq!(f.read_bytes(6).unwrap(), vec![1, 2, 9, 9, 5, 6]);
    }

    #[test]
    fn fixed_buffers_round_trip() {
        let (_dir, path) = scratch();
        let mut f = ByteFile::open_path(&path).unwrap();
        f.write_buffer(&FixedByteBuffer::<4>::from_uint(0xDEAD_BEEF)).unwrap();
        f.seek(0).unwrap();
        let buf: FixedByteBuffer<4> = f.read_buffer().unwrap();
        assert_eq!(buf.as_uint(), 0xDEAD_BEEF);
        assert_eq!(f.remaining().unwrap(), 0);
    }
}
