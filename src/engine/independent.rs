//! Parallel block pipeline for block-independent frames.
//!
//! Both directions share one shape.  The driver thread reads blocks from the
//! source and submits one task per block; tasks run on a per-call pool (or
//! inline in sequential mode) and do their CPU work — block coding and the
//! optional per-block checksum — concurrently.  Before touching the sink or
//! the streaming hash, task *i* waits on task *i−1*'s completion gate, so the
//! emitted byte stream and the hash observation order are exactly those of a
//! sequential coder.
//!
//! Back-pressure comes from the buffer pools: the driver blocks acquiring a
//! source buffer once `pool_count` tasks are in flight, which also keeps the
//! task count within the worker count — a submitted task always has a thread,
//! so a gate can never wait on a task that has no chance to run.
//!
//! A task never holds a pool element while parked on the gate unless its CPU
//! work is already done; the incompressible-compress path hands its
//! destination buffer back before the wait.
//!
//! Failure policy: the first failing task latches its error and raises the
//! quit flag; later tasks observe the flag at entry and complete their gate
//! without performing I/O.  The driver stops submitting and the scope joins
//! whatever is still in flight.

use std::sync::Mutex;

use crate::context::{Context, Mode};
use crate::engine::pool_count;
use crate::frame::types::{
    FrameError, FrameResult, StreamDescriptor, CHECKSUM_SEED, EOS, INCOMPRESSIBLE_FLAG,
};
use crate::mempool::{MemPool, PoolBuffer};
use crate::threadpool::{done_channel, DoneGate, DoneSignal, TaskPool};
use crate::xxhash::{xxh32_oneshot, Xxh32State};

/// Compresses the block sequence of one frame.
///
/// The frame header has already been written; the EOS marker and the optional
/// stream checksum are the driver's job — the computed digest is returned
/// when the descriptor asks for one.
pub fn compress(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<Option<u32>> {
    let block_max = sd.block_maximum_size();
    let block_checksum = sd.flg.block_checksum != 0;
    let stream_checksum = sd.flg.stream_checksum != 0;
    let level = ctx.compression_level();
    let parallel = ctx.mode() == Mode::Parallel;
    let n_pool = pool_count(ctx.mode());

    let src_pool = MemPool::new(block_max, n_pool);
    let dst_pool = MemPool::new(ctx.codec().compress_bound(block_max), n_pool);
    let xxh_stream = Mutex::new(Xxh32State::new(CHECKSUM_SEED));

    let task = |src: PoolBuffer, prev: Option<DoneGate>, done: DoneSignal| {
        if ctx.error() {
            if let Some(prev) = prev {
                prev.wait();
            }
            done.complete();
            return;
        }

        let mut dst = dst_pool.acquire();
        let compressed_len = ctx.codec().compress(src.as_slice(), dst.storage_mut(), level);
        // A block that did not shrink is emitted verbatim from the source
        // buffer; the destination slot goes back to the pool before the gate.
        let dst = match compressed_len {
            Some(n) if n < src.len() => {
                dst.resize(n);
                Some(dst)
            }
            _ => {
                drop(dst);
                None
            }
        };

        // The per-block checksum covers the on-wire payload and may overlap
        // earlier tasks' I/O.
        let block_hash = if block_checksum {
            let payload = match &dst {
                Some(d) => d.as_slice(),
                None => src.as_slice(),
            };
            Some(xxh32_oneshot(payload, CHECKSUM_SEED))
        } else {
            None
        };

        if let Some(prev) = prev {
            prev.wait();
        }

        if stream_checksum {
            xxh_stream.lock().unwrap().update(src.as_slice());
        }

        let emitted = (|| -> FrameResult<()> {
            match &dst {
                Some(d) => {
                    ctx.write_u32(d.len() as u32)?;
                    ctx.write_bin(d.as_slice())?;
                }
                None => {
                    ctx.write_u32(src.len() as u32 | INCOMPRESSIBLE_FLAG)?;
                    ctx.write_bin(src.as_slice())?;
                }
            }
            if let Some(h) = block_hash {
                ctx.write_u32(h)?;
            }
            Ok(())
        })();
        if emitted.is_err() {
            ctx.fail(FrameError::CannotWriteDataBlock);
        }
        done.complete();
    };

    let drive = |submit: &mut dyn FnMut(PoolBuffer, Option<DoneGate>, DoneSignal)| {
        let mut prev_gate: Option<DoneGate> = None;
        loop {
            if ctx.error() {
                break;
            }
            let mut src = src_pool.acquire();
            if src.is_sentinel() {
                break;
            }
            let n = match ctx.read_fill(src.storage_mut()) {
                Ok(n) => n,
                Err(_) => break,
            };
            if n == 0 {
                break;
            }
            src.resize(n);
            let (signal, gate) = done_channel();
            let prev = prev_gate.replace(gate);
            submit(src, prev, signal);
        }
    };

    if parallel {
        let pool = match TaskPool::new(n_pool) {
            Some(p) => p,
            None => return Err(ctx.fail(FrameError::Error)),
        };
        let task = &task;
        pool.scope(|scope| {
            drive(&mut |src, prev, signal| {
                scope.spawn(move |_| task(src, prev, signal));
            });
        });
    } else {
        drive(&mut |src, prev, signal| task(src, prev, signal));
    }

    ctx.result()?;
    Ok(if stream_checksum {
        Some(xxh_stream.into_inner().unwrap().digest())
    } else {
        None
    })
}

/// Decompresses the block sequence of one frame, up to and including the EOS
/// marker.
///
/// The frame header has already been parsed.  Reading and verifying the
/// optional stream checksum is the driver's job — the computed digest is
/// returned when the descriptor asks for one.
pub fn decompress(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<Option<u32>> {
    let block_max = sd.block_maximum_size();
    let block_checksum = sd.flg.block_checksum != 0;
    let stream_checksum = sd.flg.stream_checksum != 0;
    let parallel = ctx.mode() == Mode::Parallel;
    let n_pool = pool_count(ctx.mode());

    let src_pool = MemPool::new(block_max, n_pool);
    let dst_pool = MemPool::new(block_max, n_pool);
    let xxh_stream = Mutex::new(Xxh32State::new(CHECKSUM_SEED));

    let task = |src: PoolBuffer,
                incompressible: bool,
                expected_hash: u32,
                prev: Option<DoneGate>,
                done: DoneSignal| {
        if ctx.error() || ctx.is_quit() {
            if let Some(prev) = prev {
                prev.wait();
            }
            done.complete();
            return;
        }

        // Hash of the on-wire payload, computed before the gate so it can
        // overlap earlier tasks' I/O; the comparison happens after the write.
        let computed_hash = if block_checksum {
            Some(xxh32_oneshot(src.as_slice(), CHECKSUM_SEED))
        } else {
            None
        };

        if incompressible {
            if let Some(prev) = prev {
                prev.wait();
            }
            if stream_checksum {
                xxh_stream.lock().unwrap().update(src.as_slice());
            }
            if ctx.write_bin(src.as_slice()).is_err() {
                ctx.quit(FrameError::CannotWriteDecodedBlock);
            }
        } else {
            let mut dst = dst_pool.acquire();
            match ctx.codec().decompress(src.as_slice(), dst.storage_mut()) {
                None => {
                    ctx.quit(FrameError::DecompressFail);
                    if let Some(prev) = prev {
                        prev.wait();
                    }
                    done.complete();
                    return;
                }
                Some(n) => {
                    dst.resize(n);
                    if let Some(prev) = prev {
                        prev.wait();
                    }
                    if stream_checksum {
                        xxh_stream.lock().unwrap().update(dst.as_slice());
                    }
                    if ctx.write_bin(dst.as_slice()).is_err() {
                        ctx.quit(FrameError::CannotWriteDecodedBlock);
                    }
                }
            }
        }

        if let Some(h) = computed_hash {
            if h != expected_hash {
                ctx.quit(FrameError::BlockChecksumMismatch);
            }
        }
        done.complete();
    };

    let drive = |submit: &mut dyn FnMut(PoolBuffer, bool, u32, Option<DoneGate>, DoneSignal)| {
        let mut prev_gate: Option<DoneGate> = None;
        loop {
            if ctx.error() || ctx.is_quit() || ctx.eof() {
                break;
            }
            let bits = match ctx.read_u32() {
                Ok(b) => b,
                Err(_) => {
                    ctx.quit(FrameError::CannotReadBlockSize);
                    break;
                }
            };
            if bits == EOS {
                break;
            }
            let incompressible = bits & INCOMPRESSIBLE_FLAG != 0;
            let size = (bits & !INCOMPRESSIBLE_FLAG) as usize;
            if size > block_max {
                ctx.quit(FrameError::InvalidBlockSize);
                break;
            }

            let mut src = src_pool.acquire();
            if src.is_sentinel() {
                break;
            }
            src.resize(size);
            if ctx.read_exact(src.as_mut_slice()).is_err() {
                ctx.quit(FrameError::CannotReadBlockData);
                break;
            }

            let expected_hash = if block_checksum {
                match ctx.read_u32() {
                    Ok(v) => v,
                    Err(_) => {
                        ctx.quit(FrameError::CannotReadBlockChecksum);
                        break;
                    }
                }
            } else {
                0
            };

            let (signal, gate) = done_channel();
            let prev = prev_gate.replace(gate);
            submit(src, incompressible, expected_hash, prev, signal);
        }
    };

    if parallel {
        let pool = match TaskPool::new(n_pool) {
            Some(p) => p,
            None => return Err(ctx.fail(FrameError::Error)),
        };
        let task = &task;
        pool.scope(|scope| {
            drive(&mut |src, incompressible, expected_hash, prev, signal| {
                scope.spawn(move |_| task(src, incompressible, expected_hash, prev, signal));
            });
        });
    } else {
        drive(&mut |src, incompressible, expected_hash, prev, signal| {
            task(src, incompressible, expected_hash, prev, signal)
        });
    }

    ctx.result()?;
    Ok(if stream_checksum {
        Some(xxh_stream.into_inner().unwrap().digest())
    } else {
        None
    })
}
