//! Shared per-call context.
//!
//! One [`Context`] lives for the duration of a compress or decompress call.
//! It aggregates the I/O adapter, the block codec, the tuning parameters, a
//! sticky first-error latch, and a cooperative quit flag.  All methods take
//! `&self` and are safe to call from any worker task.
//!
//! # The error latch
//!
//! The latch is a single `AtomicU32` holding a [`FrameError`] discriminant
//! (0 = no error).  [`fail`](Context::fail) stores a new value only while the
//! current one is "no error" or the generic [`FrameError::Error`]; any more
//! specific error is sticky and is never downgraded.  The framed I/O helpers
//! latch the generic kind on failure, and their callers upgrade it to the
//! specific kind for the operation at hand.  [`set_ok`](Context::set_ok)
//! clears a generic error — used when a short read at a frame boundary turns
//! out to be a clean end of input.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::codec::BlockCodec;
use crate::config::CLEVEL_DEFAULT;
use crate::frame::header::{read_le32, write_le32};
use crate::frame::types::{FrameError, FrameResult};
use crate::io::StreamIo;

/// Execution mode for the block-independent engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One worker per hardware thread plus one; in-order emission.
    #[default]
    Parallel,
    /// Every task runs inline on the driver thread.
    Sequential,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error latch
// ─────────────────────────────────────────────────────────────────────────────

const LATCH_OK: u32 = 0;
const LATCH_GENERIC: u32 = FrameError::Error as u32;

struct ErrorLatch(AtomicU32);

impl ErrorLatch {
    fn new() -> Self {
        ErrorLatch(AtomicU32::new(LATCH_OK))
    }

    /// Stores `code` while the current value is Ok or generic.
    fn set(&self, code: u32) {
        let mut cur = self.0.load(Ordering::Acquire);
        while cur == LATCH_OK || cur == LATCH_GENERIC {
            match self
                .0
                .compare_exchange_weak(cur, code, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(observed) => cur = observed,
            }
        }
    }

    fn get(&self) -> Option<FrameError> {
        FrameError::from_repr(self.0.load(Ordering::Acquire))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state for one compress or decompress call.
pub struct Context<'a> {
    io: &'a dyn StreamIo,
    codec: &'a dyn BlockCodec,
    mode: Mode,
    compression_level: i32,
    latch: ErrorLatch,
    quit: AtomicBool,
}

impl<'a> Context<'a> {
    /// Creates a context in [`Mode::Parallel`] at the default compression
    /// level.
    pub fn new(io: &'a dyn StreamIo, codec: &'a dyn BlockCodec) -> Self {
        Context {
            io,
            codec,
            mode: Mode::Parallel,
            compression_level: CLEVEL_DEFAULT,
            latch: ErrorLatch::new(),
            quit: AtomicBool::new(false),
        }
    }

    /// Selects the execution mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Selects the compression level forwarded to the block codec.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn compression_level(&self) -> i32 {
        self.compression_level
    }

    #[inline]
    pub fn codec(&self) -> &dyn BlockCodec {
        self.codec
    }

    // ── Error latch and quit flag ────────────────────────────────────────────

    /// True once any error has been latched.
    #[inline]
    pub fn error(&self) -> bool {
        self.latch.get().is_some()
    }

    /// The latched outcome of the call so far.
    pub fn result(&self) -> FrameResult<()> {
        match self.latch.get() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Latches `e` (subject to the stickiness rule) and returns the error
    /// now stored, which is `e` unless a more specific error won earlier.
    pub fn fail(&self, e: FrameError) -> FrameError {
        self.latch.set(e as u32);
        self.latch.get().unwrap_or(e)
    }

    /// Clears a generic error back to Ok.  A specific error stays.
    pub fn set_ok(&self) {
        self.latch.set(LATCH_OK);
    }

    /// Latches `e` and raises the quit flag for cooperative early exit.
    pub fn quit(&self, e: FrameError) {
        self.fail(e);
        self.quit.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_quit(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    // ── Adapter passthroughs ─────────────────────────────────────────────────

    /// True once the source has reported end of stream.
    #[inline]
    pub fn eof(&self) -> bool {
        self.io.eof()
    }

    /// Moves the read position relative to the current one.
    pub fn seek(&self, offset: i64) -> io::Result<()> {
        self.io.seek(offset)
    }

    /// Discards the body of a skippable frame.
    pub fn skip_skippable(&self, magic: u32, size: u32) -> io::Result<()> {
        self.io.skip_skippable(magic, size)
    }

    // ── Framed I/O helpers ───────────────────────────────────────────────────
    //
    // Each helper refuses to run once an error is latched, and latches the
    // generic kind on an I/O failure.  Callers map the generic kind to the
    // operation-specific one.

    /// Reads until `buf` is full or the source ends; returns the byte count.
    pub fn read_fill(&self, buf: &mut [u8]) -> FrameResult<usize> {
        if let Err(e) = self.result() {
            return Err(e);
        }
        let mut total = 0;
        while total < buf.len() {
            match self.io.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return Err(self.fail(FrameError::Error)),
            }
        }
        Ok(total)
    }

    /// Reads exactly `buf.len()` bytes; a short read is an error.
    pub fn read_exact(&self, buf: &mut [u8]) -> FrameResult<()> {
        let n = self.read_fill(buf)?;
        if n != buf.len() {
            return Err(self.fail(FrameError::Error));
        }
        Ok(())
    }

    /// Reads one little-endian `u32`.
    pub fn read_u32(&self) -> FrameResult<u32> {
        let mut d = [0u8; 4];
        self.read_exact(&mut d)?;
        Ok(read_le32(&d, 0))
    }

    /// Writes the whole buffer; a rejected or short write is an error.
    pub fn write_bin(&self, buf: &[u8]) -> FrameResult<()> {
        if let Err(e) = self.result() {
            return Err(e);
        }
        match self.io.write(buf) {
            Ok(n) if n == buf.len() => Ok(()),
            _ => Err(self.fail(FrameError::Error)),
        }
    }

    /// Writes one little-endian `u32`.
    pub fn write_u32(&self, value: u32) -> FrameResult<()> {
        let mut d = [0u8; 4];
        write_le32(&mut d, 0, value);
        self.write_bin(&d)
    }
}
