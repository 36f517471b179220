//! Compile-time configuration constants.
//!
//! Defaults for the tuning surface exposed through [`crate::context::Context`]
//! and [`crate::frame::types::StreamDescriptor`].  Runtime overrides happen at
//! descriptor/context construction; nothing here is read from the environment.

/// Default compression level applied when the caller does not choose one.
///
/// The value `1` selects the fast compressor at its baseline setting.
pub const CLEVEL_DEFAULT: i32 = 1;

/// Lowest compression level that selects a high-compression block encoder.
///
/// Levels below this value select the fast encoder.  The default
/// [`FlexCodec`](crate::codec::FlexCodec) ships a single encoder and produces
/// the same output at every level; codecs that do provide a high-compression
/// variant switch to it at this threshold.
pub const HC_CLEVEL_MIN: i32 = 3;

/// Default block maximum size ID (`7` = 4 MiB blocks).
///
/// Valid IDs are 4–7, decoding to `1 << (8 + 2 * id)` bytes: 64 KiB, 256 KiB,
/// 1 MiB, 4 MiB.
pub const BLOCKSIZEID_DEFAULT: u8 = 7;
