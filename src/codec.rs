//! The LZ4 block-codec boundary.
//!
//! The frame engine never runs the LZ4 block algorithm itself; it consumes a
//! [`BlockCodec`] implementation.  The trait mirrors the classic C surface —
//! one-shot compress/decompress plus a worst-case bound — extended with the
//! 64 KiB-prefix streaming variants the block-dependent engine needs.
//!
//! [`FlexCodec`] is the default implementation, backed by `lz4_flex`'s block
//! API.  `lz4_flex` ships a single encoder, so the compression level is
//! accepted but does not change its output; codecs providing a
//! high-compression encoder switch to it at levels ≥
//! [`HC_CLEVEL_MIN`](crate::config::HC_CLEVEL_MIN).

use lz4_flex::block;

/// One-shot LZ4 block coding with optional prefix-dictionary support.
///
/// `compress` returns `None` when the destination cannot hold the compressed
/// form; the engine treats that — and any returned size not smaller than the
/// input — as an incompressible block.  `decompress` returns `None` when the
/// payload is malformed or its decoded form exceeds the destination.
pub trait BlockCodec: Sync {
    /// Compresses `src` into `dst`, returning the compressed size.
    fn compress(&self, src: &[u8], dst: &mut [u8], level: i32) -> Option<usize>;

    /// Decompresses `src` into `dst`, returning the decompressed size.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Option<usize>;

    /// Worst-case compressed size for a `src_len`-byte input.
    fn compress_bound(&self, src_len: usize) -> usize;

    /// Like [`compress`](Self::compress), with `prefix` as the dictionary —
    /// the bytes immediately preceding `src` in the uncompressed stream.
    fn compress_with_prefix(
        &self,
        prefix: &[u8],
        src: &[u8],
        dst: &mut [u8],
        level: i32,
    ) -> Option<usize>;

    /// Like [`decompress`](Self::decompress), with `prefix` as the
    /// dictionary: matches may reach back into it.
    fn decompress_with_prefix(&self, prefix: &[u8], src: &[u8], dst: &mut [u8]) -> Option<usize>;
}

/// Default [`BlockCodec`] backed by `lz4_flex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexCodec;

impl BlockCodec for FlexCodec {
    fn compress(&self, src: &[u8], dst: &mut [u8], _level: i32) -> Option<usize> {
        block::compress_into(src, dst).ok()
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Option<usize> {
        block::decompress_into(src, dst).ok()
    }

    fn compress_bound(&self, src_len: usize) -> usize {
        block::get_maximum_output_size(src_len)
    }

    fn compress_with_prefix(
        &self,
        prefix: &[u8],
        src: &[u8],
        dst: &mut [u8],
        _level: i32,
    ) -> Option<usize> {
        block::compress_into_with_dict(src, dst, prefix).ok()
    }

    fn decompress_with_prefix(&self, prefix: &[u8], src: &[u8], dst: &mut [u8]) -> Option<usize> {
        block::decompress_into_with_dict(src, dst, prefix).ok()
    }
}
