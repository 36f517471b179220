//! `lz4par` — a multi-threaded encoder and decoder for the LZ4 streaming
//! frame format.
//!
//! The crate streams a byte source into a self-describing framed container of
//! individually LZ4-coded blocks (and back), parallelizing block compression
//! and decompression while keeping the emitted byte stream identical to that
//! of a sequential coder.  Neither end of the stream needs to fit in memory:
//! peak RAM is bounded by two fixed-capacity buffer pools.
//!
//! # Crate layout
//!
//! | Module       | Contents |
//! |--------------|----------|
//! | `frame`      | Frame header codec and the top-level compress / decompress drivers. |
//! | `engine`     | Block pipelines: parallel block-independent, serial block-dependent. |
//! | `codec`      | The LZ4 block-codec boundary and its `lz4_flex`-backed default. |
//! | `context`    | Shared per-call context: I/O, error latch, quit flag, tuning. |
//! | `io`         | The byte-stream adapter trait and a `Read`/`Write`-backed pipe. |
//! | `mempool`    | Bounded pool of fixed-size scratch buffers. |
//! | `threadpool` | rayon-backed task pool and the per-block completion chain. |
//! | `xxhash`     | XXH32 content-checksum wrapper. |
//! | `config`     | Compile-time defaults. |
//!
//! # Quick start
//!
//! ```no_run
//! use std::io::Cursor;
//! use lz4par::{compress, Context, FlexCodec, StreamDescriptor, StreamPipe};
//!
//! let pipe = StreamPipe::new(Cursor::new(b"hello frame".to_vec()), Vec::new());
//! let codec = FlexCodec;
//! let ctx = Context::new(&pipe, &codec);
//! compress(&ctx, &StreamDescriptor::default()).expect("compress");
//! let framed: Vec<u8> = pipe.into_writer();
//! # let _ = framed;
//! ```

pub mod config;
pub mod xxhash;
pub mod mempool;
pub mod threadpool;
pub mod io;
pub mod codec;
pub mod context;
pub mod engine;
pub mod frame;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use codec::{BlockCodec, FlexCodec};
pub use context::{Context, Mode};
pub use frame::types::{Bd, Flg, FrameError, FrameResult, StreamDescriptor};
pub use frame::{compress, decompress};
pub use io::{StreamIo, StreamPipe};
