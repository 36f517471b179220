//! The byte-stream adapter boundary.
//!
//! The frame engine talks to the outside world exclusively through
//! [`StreamIo`]: a synchronous read/write/seek surface with `feof`-style EOF
//! reporting and a hook for discarding skippable frames.  The handle is
//! opaque to the engine; callers wire it to files, standard streams, or
//! in-memory buffers.
//!
//! Methods take `&self` so the handle can be shared across worker tasks; the
//! ordering barrier guarantees that reads and writes are only ever issued by
//! one task at a time, so a plain `Mutex` per direction is uncontended.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

/// Synchronous byte-stream adapter consumed by the frame engine.
///
/// Short writes indicate failure: implementations must either write the whole
/// buffer or return an error.
pub trait StreamIo: Sync {
    /// Reads up to `buf.len()` bytes.  A return of `Ok(0)` on a non-empty
    /// buffer means end of stream and must make [`eof`](Self::eof) true.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes the whole buffer, returning its length.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Moves the read position by `offset` bytes relative to the current one.
    fn seek(&self, offset: i64) -> io::Result<()>;

    /// True once a read has observed end of stream.
    fn eof(&self) -> bool;

    /// Consumes and discards `size` bytes of the skippable frame identified
    /// by `magic` (its magic and size fields already consumed).
    fn skip_skippable(&self, magic: u32, size: u32) -> io::Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// StreamPipe — Read/Write/Seek-backed adapter
// ─────────────────────────────────────────────────────────────────────────────

struct ReadHalf<R> {
    inner: R,
    eof: bool,
}

/// [`StreamIo`] over any `Read + Seek` source and `Write` sink.
///
/// Works for files on both ends and, with [`std::io::Cursor`] / `Vec<u8>`,
/// for fully in-memory streams in tests.
pub struct StreamPipe<R, W> {
    reader: Mutex<ReadHalf<R>>,
    writer: Mutex<W>,
}

impl<R: Read + Seek + Send, W: Write + Send> StreamPipe<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        StreamPipe {
            reader: Mutex::new(ReadHalf {
                inner: reader,
                eof: false,
            }),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the pipe and returns the sink, e.g. to inspect the bytes
    /// written into a `Vec<u8>`.
    pub fn into_writer(self) -> W {
        self.writer.into_inner().unwrap()
    }
}

impl<R: Read + Seek + Send, W: Write + Send> StreamIo for StreamPipe<R, W> {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut r = self.reader.lock().unwrap();
        let n = r.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            r.eof = true;
        }
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.writer.lock().unwrap().write_all(buf)?;
        Ok(buf.len())
    }

    fn seek(&self, offset: i64) -> io::Result<()> {
        let mut r = self.reader.lock().unwrap();
        r.inner.seek(SeekFrom::Current(offset))?;
        r.eof = false;
        Ok(())
    }

    fn eof(&self) -> bool {
        self.reader.lock().unwrap().eof
    }

    fn skip_skippable(&self, _magic: u32, size: u32) -> io::Result<()> {
        let mut r = self.reader.lock().unwrap();
        let mut remaining = size as usize;
        let mut scratch = [0u8; 4096];
        while remaining > 0 {
            let want = remaining.min(scratch.len());
            let n = r.inner.read(&mut scratch[..want])?;
            if n == 0 {
                r.eof = true;
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated skippable frame",
                ));
            }
            remaining -= n;
        }
        Ok(())
    }
}
