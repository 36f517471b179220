//! Compression frame driver.
//!
//! Validates the descriptor, emits the frame header, dispatches the block
//! sequence to the engine selected by `FLG.blockIndependence`, then finishes
//! the frame with the EOS marker and the optional stream checksum.

use crate::context::Context;
use crate::engine;
use crate::frame::header::write_frame_header;
use crate::frame::types::{FrameError, FrameResult, StreamDescriptor, EOS};

/// Compresses the context's source into one LZ4 frame on its sink.
///
/// The first error latched in the shared context is authoritative: it is the
/// value returned here, regardless of which later step observed it.
pub fn compress(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<()> {
    compress_frame(ctx, sd)?;
    ctx.result()
}

fn compress_frame(ctx: &Context<'_>, sd: &StreamDescriptor) -> FrameResult<()> {
    sd.validate().map_err(|e| ctx.fail(e))?;
    write_frame_header(ctx, sd)?;

    let digest = if sd.flg.block_independence != 0 {
        engine::independent::compress(ctx, sd)?
    } else {
        engine::linked::compress(ctx, sd)?
    };

    ctx.write_u32(EOS)
        .map_err(|_| ctx.fail(FrameError::CannotWriteEos))?;
    if let Some(d) = digest {
        ctx.write_u32(d)
            .map_err(|_| ctx.fail(FrameError::CannotWriteStreamChecksum))?;
    }
    Ok(())
}
