//! Block engines.
//!
//! Two regimes with different parallelism envelopes:
//!
//! * [`independent`] — every block decodes standalone, so block coding runs on
//!   a task pool while a completion chain keeps the emitted bytes in
//!   reader-submission order.
//! * [`linked`] — each block's LZ4 stream references the previous 64 KiB of
//!   uncompressed data, so the engine is single-threaded over a sliding
//!   window.

pub mod independent;
pub mod linked;

use crate::context::Mode;
use crate::threadpool::hardware_concurrency;

/// Buffer-pool capacity (and worker count) for one engine call: one element
/// per hardware thread plus one in parallel mode, a single element otherwise.
pub(crate) fn pool_count(mode: Mode) -> usize {
    match mode {
        Mode::Sequential => 1,
        Mode::Parallel => hardware_concurrency() + 1,
    }
}
