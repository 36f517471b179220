//! LZ4 frame format: header codec and top-level drivers.
//!
//! | Module       | Contents |
//! |--------------|----------|
//! | `types`      | Descriptor structs, frame constants, error kinds. |
//! | `header`     | Byte-order helpers, FLG/BD packing, header emit/parse. |
//! | `compress`   | Compression driver: header → engine → EOS → checksum. |
//! | `decompress` | Decompression driver: magic loop, skippable frames, engine dispatch. |

pub mod types;
pub mod header;
pub mod compress;
pub mod decompress;

pub use self::compress::compress;
pub use self::decompress::decompress;
