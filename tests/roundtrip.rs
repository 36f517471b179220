// End-to-end round-trip tests: descriptor parameter matrix, parallel vs
// sequential wire equality, block accounting, corruption handling, linked
// (block-dependent) mode, and a file-backed adapter run.

use std::io::Cursor;

use lz4par::frame::header::read_le32;
use lz4par::frame::types::{FrameError, StreamDescriptor};
use lz4par::{compress, decompress, Context, FlexCodec, Mode, StreamPipe};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compress_bytes(input: &[u8], sd: &StreamDescriptor, mode: Mode) -> Vec<u8> {
    let pipe = StreamPipe::new(Cursor::new(input.to_vec()), Vec::new());
    let codec = FlexCodec;
    let ctx = Context::new(&pipe, &codec).with_mode(mode);
    compress(&ctx, sd).expect("compress");
    pipe.into_writer()
}

fn decompress_full(
    framed: &[u8],
    mode: Mode,
) -> (Result<(), FrameError>, Vec<u8>, StreamDescriptor) {
    let pipe = StreamPipe::new(Cursor::new(framed.to_vec()), Vec::new());
    let codec = FlexCodec;
    let ctx = Context::new(&pipe, &codec).with_mode(mode);
    let mut sd = StreamDescriptor::default();
    let result = decompress(&ctx, &mut sd);
    (result, pipe.into_writer(), sd)
}

fn descriptor(id: u8, block_ck: bool, stream_ck: bool, independent: bool) -> StreamDescriptor {
    let mut sd = StreamDescriptor::default();
    sd.bd.block_maximum_size = id;
    sd.flg.block_checksum = block_ck as u8;
    sd.flg.stream_checksum = stream_ck as u8;
    sd.flg.block_independence = independent as u8;
    sd
}

/// Deterministic pseudo-random bytes (xorshift32).
fn pseudo_random(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 4);
    while out.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        out.extend_from_slice(&seed.to_le_bytes());
    }
    out.truncate(len);
    out
}

/// Highly compressible bytes: a short phrase cycled to `len`.
fn compressible(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

/// Walks the block records of a single default-layout frame (no stream-size
/// field) and returns (block_count, payload_bytes_total).
fn walk_blocks(framed: &[u8], block_ck: bool) -> (usize, usize) {
    let mut pos = 7; // magic + FLG + BD + check byte
    let mut count = 0;
    let mut payload_total = 0;
    loop {
        let bits = read_le32(framed, pos);
        pos += 4;
        if bits == 0 {
            break;
        }
        let size = (bits & 0x7FFF_FFFF) as usize;
        pos += size + if block_ck { 4 } else { 0 };
        count += 1;
        payload_total += size;
    }
    (count, payload_total)
}

// ---------------------------------------------------------------------------
// Round-trip matrix
// ---------------------------------------------------------------------------

#[test]
fn round_trip_parameter_matrix() {
    // 64 KiB blocks so multi-block pipelines are exercised cheaply.
    let mut data = compressible(150_000);
    data.extend_from_slice(&pseudo_random(90_000, 0xC0FF_EE01));

    for independent in [true, false] {
        for (block_ck, stream_ck) in [(false, false), (true, false), (false, true), (true, true)] {
            for mode in [Mode::Sequential, Mode::Parallel] {
                let sd = descriptor(4, block_ck, stream_ck, independent);
                let framed = compress_bytes(&data, &sd, mode);
                let (result, decoded, _) = decompress_full(&framed, mode);
                assert!(
                    result.is_ok(),
                    "independent={independent} block_ck={block_ck} stream_ck={stream_ck} mode={mode:?}: {result:?}"
                );
                assert_eq!(
                    decoded, data,
                    "independent={independent} block_ck={block_ck} stream_ck={stream_ck} mode={mode:?}"
                );
            }
        }
    }
}

#[test]
fn round_trip_small_inputs() {
    for len in [0usize, 1, 2, 5, 100, 65_535, 65_536, 65_537] {
        let data = pseudo_random(len, 0xDEAD_0001 + len as u32);
        let sd = descriptor(4, false, true, true);
        let framed = compress_bytes(&data, &sd, Mode::Parallel);
        let (result, decoded, _) = decompress_full(&framed, Mode::Parallel);
        assert!(result.is_ok(), "len {len}: {result:?}");
        assert_eq!(decoded, data, "len {len}");
    }
}

#[test]
fn round_trip_across_block_size_ids() {
    let data = compressible(300_000);
    for id in [4u8, 5, 6, 7] {
        let sd = descriptor(id, false, true, true);
        let framed = compress_bytes(&data, &sd, Mode::Parallel);
        let (result, decoded, parsed) = decompress_full(&framed, Mode::Parallel);
        assert!(result.is_ok(), "id {id}: {result:?}");
        assert_eq!(decoded, data, "id {id}");
        assert_eq!(parsed.bd.block_maximum_size, id);
    }
}

// ---------------------------------------------------------------------------
// Wire determinism
// ---------------------------------------------------------------------------

#[test]
fn parallel_and_sequential_produce_identical_bytes() {
    let random = pseudo_random(2 * 1024 * 1024, 0x5EED_CAFE);
    let repetitive = compressible(2 * 1024 * 1024);

    for data in [&random, &repetitive] {
        for sd in [descriptor(4, true, true, true), descriptor(5, false, true, true)] {
            let seq = compress_bytes(data, &sd, Mode::Sequential);
            let par = compress_bytes(data, &sd, Mode::Parallel);
            assert_eq!(seq, par, "parallel output must match sequential");
        }
    }
}

// ---------------------------------------------------------------------------
// Block accounting
// ---------------------------------------------------------------------------

#[test]
fn block_count_matches_ceiling_division() {
    let block = 64 * 1024;
    for (len, expected_blocks) in [
        (0usize, 0usize),
        (1, 1),
        (block - 1, 1),
        (block, 1),
        (block + 1, 2),
        (3 * block, 3),
    ] {
        let data = compressible(len);
        let sd = descriptor(4, false, false, true);
        let framed = compress_bytes(&data, &sd, Mode::Sequential);
        let (count, _) = walk_blocks(&framed, false);
        assert_eq!(count, expected_blocks, "len {len}");
    }
}

/// Two 64 KiB blocks of 0xAA: highly compressible, checksum intact.
#[test]
fn two_aa_blocks_shrink_and_round_trip() {
    let data = vec![0xAAu8; 2 * 64 * 1024];
    let sd = descriptor(4, false, true, true);
    let framed = compress_bytes(&data, &sd, Mode::Parallel);

    let (count, payload_total) = walk_blocks(&framed, false);
    assert_eq!(count, 2);
    assert!(
        payload_total < data.len(),
        "combined payloads must be smaller than the input"
    );

    let (result, decoded, _) = decompress_full(&framed, Mode::Parallel);
    assert!(result.is_ok());
    assert_eq!(decoded, data);
}

/// Incompressible blocks carry their input length and the stored-block bit.
#[test]
fn incompressible_blocks_are_stored_verbatim() {
    let data = pseudo_random(100_000, 0xABCD_1234);
    let sd = descriptor(4, false, false, true);
    let framed = compress_bytes(&data, &sd, Mode::Sequential);

    let mut pos = 7;
    let mut stored = 0;
    loop {
        let bits = read_le32(&framed, pos);
        pos += 4;
        if bits == 0 {
            break;
        }
        let size = (bits & 0x7FFF_FFFF) as usize;
        if bits & 0x8000_0000 != 0 {
            stored += 1;
        }
        pos += size;
    }
    assert!(stored > 0, "pseudo-random 64 KiB blocks must not shrink");
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corrupted_block_checksum_is_detected() {
    let data = compressible(130_000);
    let sd = descriptor(4, true, false, true);
    let framed = compress_bytes(&data, &sd, Mode::Sequential);

    // The first block record: header u32 at 7, payload, then its check u32.
    let first_size = (read_le32(&framed, 7) & 0x7FFF_FFFF) as usize;
    let check_offset = 7 + 4 + first_size;
    let mut corrupted = framed;
    corrupted[check_offset] ^= 0x01;

    for mode in [Mode::Sequential, Mode::Parallel] {
        let (result, decoded, _) = decompress_full(&corrupted, mode);
        assert_eq!(result, Err(FrameError::BlockChecksumMismatch), "{mode:?}");
        // The mismatch is observed after the block's own write; nothing past
        // that block may reach the sink.
        assert!(decoded.len() <= 64 * 1024, "{mode:?}: {} bytes", decoded.len());
    }
}

#[test]
fn corrupted_payload_with_stream_checksum_fails() {
    let data = compressible(70_000);
    let sd = descriptor(4, false, true, true);
    let mut framed = compress_bytes(&data, &sd, Mode::Sequential);

    // Flip a byte in the middle of the first compressed payload.
    framed[7 + 4 + 20] ^= 0xFF;
    let (result, _, _) = decompress_full(&framed, Mode::Sequential);
    assert!(
        matches!(
            result,
            Err(FrameError::DecompressFail) | Err(FrameError::StreamChecksumMismatch)
        ),
        "corruption must surface as a decode or checksum failure: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Block-dependent (linked) mode
// ---------------------------------------------------------------------------

#[test]
fn linked_round_trip_repetitive_data() {
    let data = compressible(300_000);
    let sd = descriptor(4, false, true, false);
    let framed = compress_bytes(&data, &sd, Mode::Sequential);
    let (result, decoded, parsed) = decompress_full(&framed, Mode::Sequential);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(decoded, data);
    assert_eq!(parsed.flg.block_independence, 0);
}

#[test]
fn linked_round_trip_slides_both_windows() {
    // Larger than the 1088 KiB compression window, so both the encoder and
    // the decoder slide their dictionaries.
    let mut data = compressible(1_500_000);
    data.extend_from_slice(&pseudo_random(200_000, 0x0BAD_5EED));
    let sd = descriptor(4, true, true, false);
    let framed = compress_bytes(&data, &sd, Mode::Sequential);
    let (result, decoded, _) = decompress_full(&framed, Mode::Sequential);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(decoded, data);
}

#[test]
fn linked_round_trip_incompressible_data() {
    // Stored blocks must still enter the dictionary window.
    let data = pseudo_random(200_000, 0xFEED_F00D);
    let sd = descriptor(4, false, true, false);
    let framed = compress_bytes(&data, &sd, Mode::Sequential);
    let (result, decoded, _) = decompress_full(&framed, Mode::Sequential);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(decoded, data);
}

#[test]
fn linked_beats_independent_on_cross_block_redundancy() {
    // Random data repeating with a period just under the 64 KiB match window:
    // most repeats straddle block boundaries, so only the linked dictionary
    // can exploit them.
    let unit = pseudo_random(60_000, 0x1234_5678);
    let mut data = Vec::new();
    for _ in 0..4 {
        data.extend_from_slice(&unit);
    }

    let independent = compress_bytes(&data, &descriptor(4, false, false, true), Mode::Sequential);
    let linked = compress_bytes(&data, &descriptor(4, false, false, false), Mode::Sequential);
    assert!(
        linked.len() < independent.len(),
        "linked {} vs independent {}",
        linked.len(),
        independent.len()
    );
}

#[test]
fn mixed_mode_frames_concatenate() {
    let a = compressible(100_000);
    let b = pseudo_random(50_000, 0x0D15_EA5E);

    let mut framed = compress_bytes(&a, &descriptor(4, false, true, true), Mode::Parallel);
    framed.extend_from_slice(&compress_bytes(
        &b,
        &descriptor(4, false, true, false),
        Mode::Sequential,
    ));

    let (result, decoded, _) = decompress_full(&framed, Mode::Parallel);
    assert!(result.is_ok(), "{result:?}");
    let mut expected = a;
    expected.extend_from_slice(&b);
    assert_eq!(decoded, expected);
}

// ---------------------------------------------------------------------------
// Descriptor extras
// ---------------------------------------------------------------------------

#[test]
fn stream_size_field_round_trips() {
    let data = compressible(12_345);
    let mut sd = descriptor(4, false, true, true);
    sd.flg.stream_size = 1;
    sd.stream_size = data.len() as u64;

    let framed = compress_bytes(&data, &sd, Mode::Sequential);
    let (result, decoded, parsed) = decompress_full(&framed, Mode::Sequential);
    assert!(result.is_ok());
    assert_eq!(decoded, data);
    assert_eq!(parsed.flg.stream_size, 1);
    assert_eq!(parsed.stream_size, data.len() as u64);
}

#[test]
fn compression_level_is_accepted() {
    let data = compressible(80_000);
    let pipe = StreamPipe::new(Cursor::new(data.clone()), Vec::new());
    let codec = FlexCodec;
    let ctx = Context::new(&pipe, &codec)
        .with_mode(Mode::Parallel)
        .with_compression_level(9);
    compress(&ctx, &descriptor(4, false, true, true)).expect("compress at level 9");
    let framed = pipe.into_writer();

    let (result, decoded, _) = decompress_full(&framed, Mode::Parallel);
    assert!(result.is_ok());
    assert_eq!(decoded, data);
}

// ---------------------------------------------------------------------------
// File-backed adapter
// ---------------------------------------------------------------------------

#[test]
fn file_to_file_round_trip() {
    use std::fs::File;

    let dir = tempfile::TempDir::new().unwrap();
    let src_path = dir.path().join("input.bin");
    let lz4_path = dir.path().join("input.bin.lz4");
    let out_path = dir.path().join("output.bin");

    let mut data = compressible(400_000);
    data.extend_from_slice(&pseudo_random(100_000, 0xF11E_F00D));
    std::fs::write(&src_path, &data).unwrap();

    let codec = FlexCodec;
    {
        let pipe = StreamPipe::new(
            File::open(&src_path).unwrap(),
            File::create(&lz4_path).unwrap(),
        );
        let ctx = Context::new(&pipe, &codec).with_mode(Mode::Parallel);
        compress(&ctx, &descriptor(5, true, true, true)).expect("compress to file");
    }
    {
        let pipe = StreamPipe::new(
            File::open(&lz4_path).unwrap(),
            File::create(&out_path).unwrap(),
        );
        let ctx = Context::new(&pipe, &codec).with_mode(Mode::Parallel);
        let mut sd = StreamDescriptor::default();
        decompress(&ctx, &mut sd).expect("decompress from file");
    }

    let decoded = std::fs::read(&out_path).unwrap();
    assert_eq!(decoded, data);
}
