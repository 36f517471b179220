//! Serial sliding-window engine for block-dependent frames.
//!
//! With linked blocks, each block's LZ4 stream may reference the preceding
//! 64 KiB of uncompressed data, so blocks are coded strictly one after
//! another against a window that retains that prefix.
//!
//! * Compression keeps incoming data in one large input window; every block
//!   is compressed with the bytes immediately before it as the dictionary.
//!   When the window cannot hold another full block, its trailing 64 KiB
//!   slides to the front.
//! * Decompression decodes into a `64 KiB + blockMaximumSize` window so that
//!   freshly decoded output becomes the next block's dictionary, sliding the
//!   same way.  Uncompressed blocks are copied into the window as well —
//!   they are part of the prefix like any other block.
//!
//! Checksums are computed synchronously; there is no concurrency to overlap
//! them with, and for decompression a failed per-block check fires before any
//! corrupt output reaches the sink.

use crate::context::Context;
use crate::frame::types::{
    FrameError, FrameResult, StreamDescriptor, CHECKSUM_SEED, EOS, INCOMPRESSIBLE_FLAG,
};
use crate::xxhash::{xxh32_oneshot, Xxh32State};

/// Dictionary span retained across blocks.
const DICT_SIZE: usize = 64 * 1024;

/// Floor for the compression input window.
const COMPRESS_WINDOW_MIN: usize = 1088 * 1024;

/// Compresses the block sequence of one frame in block-dependent mode.
///
/// Same contract as [`independent::compress`](super::independent::compress):
/// header already written, EOS and stream checksum left to the driver, the
/// computed digest returned when requested.
pub fn compress(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<Option<u32>> {
    let block_max = sd.block_maximum_size();
    let block_checksum = sd.flg.block_checksum != 0;
    let stream_checksum = sd.flg.stream_checksum != 0;
    let level = ctx.compression_level();

    let mut window = vec![0u8; (block_max + DICT_SIZE).max(COMPRESS_WINDOW_MIN)];
    let mut dst = vec![0u8; ctx.codec().compress_bound(block_max)];
    let mut xxh = if stream_checksum {
        Some(Xxh32State::new(CHECKSUM_SEED))
    } else {
        None
    };
    let mut pos = 0usize;

    loop {
        // Slide the trailing dictionary to the front when the window cannot
        // hold another full block.
        if pos + block_max > window.len() {
            window.copy_within(pos - DICT_SIZE..pos, 0);
            pos = DICT_SIZE;
        }

        let n = ctx.read_fill(&mut window[pos..pos + block_max])?;
        if n == 0 {
            break;
        }

        let dict_start = pos.saturating_sub(DICT_SIZE);
        let compressed_len = {
            let block = &window[pos..pos + n];
            let dict = &window[dict_start..pos];
            if dict.is_empty() {
                ctx.codec().compress(block, &mut dst, level)
            } else {
                ctx.codec().compress_with_prefix(dict, block, &mut dst, level)
            }
        };

        let (payload, header_bits): (&[u8], u32) = match compressed_len {
            Some(c) if c < n => (&dst[..c], c as u32),
            _ => (&window[pos..pos + n], n as u32 | INCOMPRESSIBLE_FLAG),
        };

        ctx.write_u32(header_bits)
            .map_err(|_| ctx.fail(FrameError::CannotWriteDataBlock))?;
        ctx.write_bin(payload)
            .map_err(|_| ctx.fail(FrameError::CannotWriteDataBlock))?;
        if block_checksum {
            let h = xxh32_oneshot(payload, CHECKSUM_SEED);
            ctx.write_u32(h)
                .map_err(|_| ctx.fail(FrameError::CannotWriteDataBlock))?;
        }

        if let Some(x) = xxh.as_mut() {
            x.update(&window[pos..pos + n]);
        }
        pos += n;
    }

    Ok(xxh.map(|x| x.digest()))
}

/// Decompresses the block sequence of one frame in block-dependent mode, up
/// to and including the EOS marker.
///
/// Same contract as
/// [`independent::decompress`](super::independent::decompress): header
/// already parsed, stream-checksum verification left to the driver, the
/// computed digest returned when requested.
pub fn decompress(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<Option<u32>> {
    let block_max = sd.block_maximum_size();
    let block_checksum = sd.flg.block_checksum != 0;
    let stream_checksum = sd.flg.stream_checksum != 0;

    let mut window = vec![0u8; DICT_SIZE + block_max];
    let mut payload = vec![0u8; block_max];
    let mut xxh = if stream_checksum {
        Some(Xxh32State::new(CHECKSUM_SEED))
    } else {
        None
    };
    let mut pos = 0usize;

    loop {
        let bits = ctx
            .read_u32()
            .map_err(|_| ctx.fail(FrameError::CannotReadBlockSize))?;
        if bits == EOS {
            break;
        }
        let incompressible = bits & INCOMPRESSIBLE_FLAG != 0;
        let size = (bits & !INCOMPRESSIBLE_FLAG) as usize;
        if size > block_max {
            return Err(ctx.fail(FrameError::InvalidBlockSize));
        }

        ctx.read_exact(&mut payload[..size])
            .map_err(|_| ctx.fail(FrameError::CannotReadBlockData))?;

        if block_checksum {
            let expected = ctx
                .read_u32()
                .map_err(|_| ctx.fail(FrameError::CannotReadBlockChecksum))?;
            if xxh32_oneshot(&payload[..size], CHECKSUM_SEED) != expected {
                return Err(ctx.fail(FrameError::BlockChecksumMismatch));
            }
        }

        // Keep the dictionary invariant: the window always holds the last
        // 64 KiB of decoded output right before the write cursor.
        if pos + block_max > window.len() {
            window.copy_within(pos - DICT_SIZE..pos, 0);
            pos = DICT_SIZE;
        }

        let produced = if incompressible {
            window[pos..pos + size].copy_from_slice(&payload[..size]);
            size
        } else {
            let (head, tail) = window.split_at_mut(pos);
            let dict_start = pos.saturating_sub(DICT_SIZE);
            let dict = &head[dict_start..];
            let out = &mut tail[..block_max];
            let decoded = if dict.is_empty() {
                ctx.codec().decompress(&payload[..size], out)
            } else {
                ctx.codec().decompress_with_prefix(dict, &payload[..size], out)
            };
            match decoded {
                Some(n) => n,
                None => return Err(ctx.fail(FrameError::DecompressFail)),
            }
        };

        let block = &window[pos..pos + produced];
        if let Some(x) = xxh.as_mut() {
            x.update(block);
        }
        ctx.write_bin(block)
            .map_err(|_| ctx.fail(FrameError::CannotWriteDecodedBlock))?;
        pos += produced;
    }

    Ok(xxh.map(|x| x.digest()))
}
