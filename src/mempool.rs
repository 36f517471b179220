//! Bounded pool of fixed-size scratch buffers.
//!
//! The pool hands out at most `element_count` buffers of `element_size` bytes
//! each; this is what bounds peak memory when a fast producer outruns a slow
//! consumer.  `acquire` blocks when every element is lent out and wakes when
//! one is returned.  Elements are created lazily, so a pool that never sees
//! contention never allocates its full capacity.
//!
//! Dropping the [`MemPool`] owner while acquirers are blocked wakes them all;
//! they receive an empty sentinel buffer and can exit cleanly.  Buffers still
//! lent out at that point simply free their storage on drop.

use std::sync::{Arc, Condvar, Mutex};

struct PoolState {
    /// Returned elements ready for reuse.
    free: Vec<Vec<u8>>,
    /// Elements created so far; never exceeds the pool capacity.
    spawned: usize,
    /// Set when the pool owner is dropped.
    stop: bool,
}

struct PoolInner {
    element_size: usize,
    capacity: usize,
    state: Mutex<PoolState>,
    cond: Condvar,
}

/// Fixed-capacity buffer pool.  See the module docs.
pub struct MemPool {
    inner: Arc<PoolInner>,
}

impl MemPool {
    /// Creates a pool of `element_count` buffers of `element_size` bytes.
    pub fn new(element_size: usize, element_count: usize) -> Self {
        MemPool {
            inner: Arc::new(PoolInner {
                element_size,
                capacity: element_count.max(1),
                state: Mutex::new(PoolState {
                    free: Vec::new(),
                    spawned: 0,
                    stop: false,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Borrows one element, blocking while the pool is exhausted.
    ///
    /// Returns a sentinel buffer (`is_sentinel() == true`, zero capacity)
    /// once the pool owner has been dropped.
    pub fn acquire(&self) -> PoolBuffer {
        let inner = &self.inner;
        let mut state = inner.state.lock().unwrap();
        loop {
            if state.stop {
                return PoolBuffer {
                    data: Vec::new(),
                    len: 0,
                    pool: None,
                };
            }
            if let Some(data) = state.free.pop() {
                return PoolBuffer {
                    data,
                    len: inner.element_size,
                    pool: Some(Arc::clone(inner)),
                };
            }
            if state.spawned < inner.capacity {
                state.spawned += 1;
                return PoolBuffer {
                    data: vec![0u8; inner.element_size],
                    len: inner.element_size,
                    pool: Some(Arc::clone(inner)),
                };
            }
            state = inner.cond.wait(state).unwrap();
        }
    }

    /// Byte size of each element.
    pub fn element_size(&self) -> usize {
        self.inner.element_size
    }

    /// Maximum number of elements the pool will ever hold.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl Drop for MemPool {
    fn drop(&mut self) {
        self.inner.state.lock().unwrap().stop = true;
        self.inner.cond.notify_all();
    }
}

/// Scoped handle to one pool element.
///
/// The handle tracks a logical length (`len`) on top of the fixed storage;
/// `resize` adjusts it after a short read or a compression step.  Dropping the
/// handle returns the storage to the pool and wakes one blocked acquirer.
pub struct PoolBuffer {
    data: Vec<u8>,
    len: usize,
    pool: Option<Arc<PoolInner>>,
}

impl PoolBuffer {
    /// Logical length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the logical length is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True for the empty sentinel handed out by a dropped pool.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.pool.is_none()
    }

    /// The logically valid bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The logically valid bytes, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// The full fixed-size storage, ignoring the logical length.
    #[inline]
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Sets the logical length, clamped to the storage size.
    #[inline]
    pub fn resize(&mut self, len: usize) {
        self.len = len.min(self.data.len());
    }
}

impl Drop for PoolBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let data = std::mem::take(&mut self.data);
            let mut state = pool.state.lock().unwrap();
            state.free.push(data);
            drop(state);
            pool.cond.notify_one();
        }
    }
}
