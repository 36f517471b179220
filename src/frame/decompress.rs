//! Decompression frame driver.
//!
//! Loops over frames until the source ends: reads the magic number, discards
//! skippable frames, parses the header, dispatches the block sequence to the
//! engine selected by `FLG.blockIndependence`, and verifies the optional
//! stream checksum.
//!
//! Boundary rules:
//! * End of input where a magic number would start is success — including a
//!   partial magic, and including an input with no frames at all.
//! * A non-LZ4 magic after at least one decoded frame is a concatenation
//!   boundary: the four bytes are pushed back and the call returns Ok.
//!   Before any frame it is [`FrameError::InvalidMagicNumber`].

use crate::context::Context;
use crate::engine;
use crate::frame::header::read_frame_header;
use crate::frame::types::{is_skippable_magic, FrameError, FrameResult, StreamDescriptor, MAGIC};

/// Decompresses every LZ4 frame on the context's source into its sink.
///
/// `sd` receives the descriptor of the most recently parsed frame header.
/// The first error latched in the shared context is authoritative.
pub fn decompress(ctx: &Context<'_>, sd: &mut StreamDescriptor) -> FrameResult<()> {
    decompress_frames(ctx, sd)?;
    ctx.result()
}

fn decompress_frames(ctx: &Context<'_>, sd: &mut StreamDescriptor) -> FrameResult<()> {
    let mut frames_decoded = 0usize;

    loop {
        if ctx.error() || ctx.is_quit() || ctx.eof() {
            break;
        }

        let magic = match ctx.read_u32() {
            Ok(m) => m,
            Err(_) => {
                if ctx.eof() {
                    // Clean end of input between frames.
                    ctx.set_ok();
                } else {
                    ctx.fail(FrameError::InvalidHeader);
                }
                break;
            }
        };

        if is_skippable_magic(magic) {
            let size = ctx
                .read_u32()
                .map_err(|_| ctx.fail(FrameError::InvalidHeaderSkippableSizeUnreadable))?;
            ctx.skip_skippable(magic, size)
                .map_err(|_| ctx.fail(FrameError::CannotSkipSkippableArea))?;
            continue;
        }

        if magic != MAGIC {
            let _ = ctx.seek(-4);
            if frames_decoded == 0 {
                return Err(ctx.fail(FrameError::InvalidMagicNumber));
            }
            // Concatenation boundary: leave the foreign bytes to the caller.
            break;
        }

        *sd = read_frame_header(ctx)?;

        let digest = if sd.flg.block_independence != 0 {
            engine::independent::decompress(ctx, sd)?
        } else {
            engine::linked::decompress(ctx, sd)?
        };

        if let Some(computed) = digest {
            let stored = ctx
                .read_u32()
                .map_err(|_| ctx.fail(FrameError::CannotReadStreamChecksum))?;
            if stored != computed {
                return Err(ctx.fail(FrameError::StreamChecksumMismatch));
            }
        }

        frames_decoded += 1;
    }

    Ok(())
}
