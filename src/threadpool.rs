//! Task pool and per-block completion chain.
//!
//! [`TaskPool`] wraps a per-call `rayon::ThreadPool` with scoped spawning:
//! tasks may borrow the driver's locals, and the scope joins every spawned
//! task before returning — no task outlives its compress/decompress call.
//!
//! [`done_channel`] builds the ordering barrier: each block task receives the
//! previous task's [`DoneGate`] and its own [`DoneSignal`].  The gate opens on
//! an explicit [`complete`](DoneSignal::complete) or when the signal is
//! dropped, so a panicking or early-exiting task never wedges its successor.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Number of logical CPU cores available to the current process.
///
/// Delegates to [`std::thread::available_parallelism`], which honours
/// OS-level CPU affinity masks where supported.  Returns at least `1` so
/// callers never build a zero-sized pool.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fixed-size task pool for one engine call.
pub struct TaskPool {
    pool: rayon::ThreadPool,
}

impl TaskPool {
    /// Builds a pool of `nb_threads` workers — returns `None` on failure or
    /// for a zero thread count.
    pub fn new(nb_threads: usize) -> Option<Self> {
        if nb_threads < 1 {
            return None;
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .build()
            .ok()?;
        Some(TaskPool { pool })
    }

    /// Runs `op` with a scope whose spawned tasks all complete before this
    /// call returns.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&rayon::Scope<'scope>) -> R + Send,
        R: Send,
    {
        self.pool.scope(op)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion chain
// ─────────────────────────────────────────────────────────────────────────────

/// The sending half of a one-shot completion signal.
pub struct DoneSignal(Sender<()>);

/// The waiting half of a one-shot completion signal.
pub struct DoneGate(Receiver<()>);

/// Creates a linked signal/gate pair for one block task.
pub fn done_channel() -> (DoneSignal, DoneGate) {
    let (tx, rx) = bounded(1);
    (DoneSignal(tx), DoneGate(rx))
}

impl DoneSignal {
    /// Marks the owning task complete, opening the paired gate.
    pub fn complete(self) {
        let _ = self.0.send(());
    }
}

impl DoneGate {
    /// Blocks until the paired signal completes or is dropped.
    pub fn wait(&self) {
        let _ = self.0.recv();
    }
}
