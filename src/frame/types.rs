//! LZ4 frame format types, constants, and error handling.
//!
//! Covers:
//! - Frame constants (magic numbers, EOS marker, header sizes, the
//!   incompressible-block flag)
//! - The packed descriptor bytes `FLG` and `BD` as bit-field structs
//! - [`StreamDescriptor`] with the canonical encoder defaults
//! - [`FrameError`] with `Display` + `Error` impls and a stable `u32`
//!   representation used by the cross-task error latch

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Frame format constants
// ─────────────────────────────────────────────────────────────────────────────

/// Magic number that begins every LZ4 frame (stored little-endian).
pub const MAGIC: u32 = 0x184D_2204;

/// First magic number of the skippable-frame range.
pub const SKIPPABLE_MAGIC_MIN: u32 = 0x184D_2A50;

/// Last magic number of the skippable-frame range.
pub const SKIPPABLE_MAGIC_MAX: u32 = 0x184D_2A5F;

/// Block header value that terminates the block sequence of a frame.
pub const EOS: u32 = 0;

/// High bit of a block header: the block payload is stored uncompressed.
pub const INCOMPRESSIBLE_FLAG: u32 = 0x8000_0000;

/// Seed for every XXH32 computation in the frame format.
pub const CHECKSUM_SEED: u32 = 0;

/// Maximum serialized frame header size in bytes:
/// magic (4) + FLG/BD (2) + stream size (8) + dict ID (4) + check byte (1).
pub const MAX_HEADER_SIZE: usize = 4 + 2 + 8 + 4 + 1;

/// Smallest valid `BD.blockMaximumSize` ID.
pub const BLOCK_SIZE_ID_MIN: u8 = 4;

/// Largest valid `BD.blockMaximumSize` ID.
pub const BLOCK_SIZE_ID_MAX: u8 = 7;

/// Returns `true` when `magic` identifies a skippable frame.
#[inline]
pub fn is_skippable_magic(magic: u32) -> bool {
    (SKIPPABLE_MAGIC_MIN..=SKIPPABLE_MAGIC_MAX).contains(&magic)
}

/// Decodes a `blockMaximumSize` ID (4–7) to its byte count.
///
/// `1 << (8 + 2 * id)`: 64 KiB, 256 KiB, 1 MiB, 4 MiB.
#[inline]
pub fn block_size_of(id: u8) -> usize {
    debug_assert!((BLOCK_SIZE_ID_MIN..=BLOCK_SIZE_ID_MAX).contains(&id));
    1usize << (8 + 2 * id as usize)
}

// ─────────────────────────────────────────────────────────────────────────────
// FLG / BD bit fields
// ─────────────────────────────────────────────────────────────────────────────

/// The frame descriptor `FLG` byte, unpacked.
///
/// Fields hold the raw bit values rather than `bool`s so that reserved bits
/// survive a parse → re-emit round trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flg {
    /// Bit 0 — a preset-dictionary ID follows the descriptor (unsupported).
    pub preset_dictionary: u8,
    /// Bit 1 — reserved, must be 0.
    pub reserved1: u8,
    /// Bit 2 — a stream checksum follows the EOS marker.
    pub stream_checksum: u8,
    /// Bit 3 — an 8-byte uncompressed stream size follows FLG/BD.
    pub stream_size: u8,
    /// Bit 4 — each block is followed by a 4-byte checksum of its payload.
    pub block_checksum: u8,
    /// Bit 5 — blocks are compressed independently.
    pub block_independence: u8,
    /// Bits 6–7 — format version, must be 1.
    pub version_number: u8,
}

/// The frame descriptor `BD` byte, unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bd {
    /// Bits 0–3 — reserved, must be 0.
    pub reserved3: u8,
    /// Bits 4–6 — block maximum size ID (valid range 4–7).
    pub block_maximum_size: u8,
    /// Bit 7 — reserved, must be 0.
    pub reserved2: u8,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// The decoded stream descriptor: `FLG`, `BD`, and the optional fields.
///
/// `stream_size` and `dict_id` are meaningful only when the corresponding
/// `Flg` bit is set; they serialize to the wire only in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub flg: Flg,
    pub bd: Bd,
    /// Uncompressed stream size; on the wire iff `flg.stream_size != 0`.
    pub stream_size: u64,
    /// Preset dictionary ID; on the wire iff `flg.preset_dictionary != 0`.
    pub dict_id: u32,
}

impl Default for StreamDescriptor {
    /// Canonical encoder defaults: version 1, independent blocks, stream
    /// checksum on, 4 MiB blocks, everything else off.
    fn default() -> Self {
        StreamDescriptor {
            flg: Flg {
                preset_dictionary: 0,
                reserved1: 0,
                stream_checksum: 1,
                stream_size: 0,
                block_checksum: 0,
                block_independence: 1,
                version_number: 1,
            },
            bd: Bd {
                reserved3: 0,
                block_maximum_size: crate::config::BLOCKSIZEID_DEFAULT,
                reserved2: 0,
            },
            stream_size: 0,
            dict_id: 0,
        }
    }
}

impl StreamDescriptor {
    /// Maximum uncompressed block size in bytes declared by `BD`.
    ///
    /// Callers must [`validate`](Self::validate) first; the ID is otherwise
    /// unchecked.
    #[inline]
    pub fn block_maximum_size(&self) -> usize {
        block_size_of(self.bd.block_maximum_size)
    }

    /// Checks the descriptor against the format rules.
    ///
    /// Validation order matters for error reporting: version, preset
    /// dictionary, FLG reserved bit, block maximum size, then the BD reserved
    /// bits.
    pub fn validate(&self) -> FrameResult<()> {
        if self.flg.version_number != 1 {
            return Err(FrameError::InvalidVersion);
        }
        if self.flg.preset_dictionary != 0 {
            return Err(FrameError::PresetDictionaryUnsupported);
        }
        if self.flg.reserved1 != 0 {
            return Err(FrameError::InvalidHeaderReserved1);
        }
        if !(BLOCK_SIZE_ID_MIN..=BLOCK_SIZE_ID_MAX).contains(&self.bd.block_maximum_size) {
            return Err(FrameError::InvalidBlockMaximumSize);
        }
        if self.bd.reserved3 != 0 {
            return Err(FrameError::InvalidHeaderReserved3);
        }
        if self.bd.reserved2 != 0 {
            return Err(FrameError::InvalidHeaderReserved2);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error codes
// ─────────────────────────────────────────────────────────────────────────────

/// Result alias used throughout the frame layer.
pub type FrameResult<T> = Result<T, FrameError>;

/// Frame-level failure kinds.
///
/// The discriminants are stable: the shared context stores the active error
/// as a `u32` in an atomic latch (`0` meaning "no error"), so every variant
/// must map to a fixed nonzero value.  `Error` is the generic kind; the latch
/// allows it to be upgraded to a more specific kind but never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameError {
    /// Generic failure; upgraded to a specific kind when one is known.
    Error = 1,
    InvalidMagicNumber = 2,
    InvalidHeader = 3,
    InvalidVersion = 4,
    InvalidHeaderChecksum = 5,
    InvalidBlockMaximumSize = 6,
    InvalidBlockSize = 7,
    InvalidHeaderReserved1 = 8,
    InvalidHeaderReserved2 = 9,
    InvalidHeaderReserved3 = 10,
    InvalidHeaderSkippableSizeUnreadable = 11,
    PresetDictionaryUnsupported = 12,
    CannotWriteHeader = 13,
    CannotWriteEos = 14,
    CannotWriteStreamChecksum = 15,
    CannotWriteDataBlock = 16,
    CannotWriteDecodedBlock = 17,
    CannotReadBlockSize = 18,
    CannotReadBlockData = 19,
    CannotReadBlockChecksum = 20,
    CannotReadStreamChecksum = 21,
    CannotSkipSkippableArea = 22,
    BlockChecksumMismatch = 23,
    StreamChecksumMismatch = 24,
    DecompressFail = 25,
}

impl FrameError {
    /// Stable human-readable name for logs and CLI surfaces.
    pub fn error_name(&self) -> &'static str {
        match self {
            FrameError::Error => "ERROR",
            FrameError::InvalidMagicNumber => "INVALID_MAGIC_NUMBER",
            FrameError::InvalidHeader => "INVALID_HEADER",
            FrameError::InvalidVersion => "INVALID_VERSION",
            FrameError::InvalidHeaderChecksum => "INVALID_HEADER_CHECKSUM",
            FrameError::InvalidBlockMaximumSize => "INVALID_BLOCK_MAXIMUM_SIZE",
            FrameError::InvalidBlockSize => "INVALID_BLOCK_SIZE",
            FrameError::InvalidHeaderReserved1 => "INVALID_HEADER_RESERVED1",
            FrameError::InvalidHeaderReserved2 => "INVALID_HEADER_RESERVED2",
            FrameError::InvalidHeaderReserved3 => "INVALID_HEADER_RESERVED3",
            FrameError::InvalidHeaderSkippableSizeUnreadable => {
                "INVALID_HEADER_SKIPPABLE_SIZE_UNREADABLE"
            }
            FrameError::PresetDictionaryUnsupported => "PRESET_DICTIONARY_IS_NOT_SUPPORTED",
            FrameError::CannotWriteHeader => "CANNOT_WRITE_HEADER",
            FrameError::CannotWriteEos => "CANNOT_WRITE_EOS",
            FrameError::CannotWriteStreamChecksum => "CANNOT_WRITE_STREAM_CHECKSUM",
            FrameError::CannotWriteDataBlock => "CANNOT_WRITE_DATA_BLOCK",
            FrameError::CannotWriteDecodedBlock => "CANNOT_WRITE_DECODED_BLOCK",
            FrameError::CannotReadBlockSize => "CANNOT_READ_BLOCK_SIZE",
            FrameError::CannotReadBlockData => "CANNOT_READ_BLOCK_DATA",
            FrameError::CannotReadBlockChecksum => "CANNOT_READ_BLOCK_CHECKSUM",
            FrameError::CannotReadStreamChecksum => "CANNOT_READ_STREAM_CHECKSUM",
            FrameError::CannotSkipSkippableArea => "CANNOT_SKIP_SKIPPABLE_AREA",
            FrameError::BlockChecksumMismatch => "BLOCK_CHECKSUM_MISMATCH",
            FrameError::StreamChecksumMismatch => "STREAM_CHECKSUM_MISMATCH",
            FrameError::DecompressFail => "DECOMPRESS_FAIL",
        }
    }

    /// Converts the latch representation back to an error.
    ///
    /// Returns `None` for `0` ("no error") and for out-of-range values.
    pub fn from_repr(repr: u32) -> Option<Self> {
        Some(match repr {
            1 => FrameError::Error,
            2 => FrameError::InvalidMagicNumber,
            3 => FrameError::InvalidHeader,
            4 => FrameError::InvalidVersion,
            5 => FrameError::InvalidHeaderChecksum,
            6 => FrameError::InvalidBlockMaximumSize,
            7 => FrameError::InvalidBlockSize,
            8 => FrameError::InvalidHeaderReserved1,
            9 => FrameError::InvalidHeaderReserved2,
            10 => FrameError::InvalidHeaderReserved3,
            11 => FrameError::InvalidHeaderSkippableSizeUnreadable,
            12 => FrameError::PresetDictionaryUnsupported,
            13 => FrameError::CannotWriteHeader,
            14 => FrameError::CannotWriteEos,
            15 => FrameError::CannotWriteStreamChecksum,
            16 => FrameError::CannotWriteDataBlock,
            17 => FrameError::CannotWriteDecodedBlock,
            18 => FrameError::CannotReadBlockSize,
            19 => FrameError::CannotReadBlockData,
            20 => FrameError::CannotReadBlockChecksum,
            21 => FrameError::CannotReadStreamChecksum,
            22 => FrameError::CannotSkipSkippableArea,
            23 => FrameError::BlockChecksumMismatch,
            24 => FrameError::StreamChecksumMismatch,
            25 => FrameError::DecompressFail,
            _ => return None,
        })
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_name())
    }
}

impl std::error::Error for FrameError {}
