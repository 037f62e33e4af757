// Phase 4: PNGエンコーダブリッジ統合テスト
//
// PNGは可逆なので、デコードした画素を完全一致で比較する。

mod common;

use std::io::{self, Cursor, Seek, SeekFrom, Write};

use image::{ColorType, GenericImageView};
use pixel_upscale::encode::png;
use pixel_upscale::error::UpscaleError;
use pixel_upscale::surface::{PixelFormat, Surface};
use tempfile::tempdir;

use common::{BrokenSink, BudgetSink, keyed_palette_2x2, noise_argb, uniform_argb};

fn encode(surface: &Surface, compression: i32) -> Vec<u8> {
    let mut sink = Cursor::new(Vec::new());
    png::encode_to_sink(&mut sink, surface, compression).expect("encode should succeed");
    sink.into_inner()
}

/// Expected RGBA bytes of a surface, row-major, padding excluded.
fn expected_rgba(surface: &Surface) -> Vec<u8> {
    let mut out = Vec::new();
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            out.extend_from_slice(&surface.get_rgba(x, y));
        }
    }
    out
}

// ============================================================
// 1. Lossless round trip
// ============================================================

#[test]
fn test_noise_round_trips_exactly() {
    let surface = noise_argb(31, 17, 2);
    let data = encode(&surface, 6);

    let decoded = image::load_from_memory(&data).expect("decode PNG");
    assert_eq!(decoded.dimensions(), (31, 17));
    assert_eq!(decoded.color(), ColorType::Rgba8);
    assert_eq!(decoded.to_rgba8().into_raw(), expected_rgba(&surface));
}

#[test]
fn test_every_compression_level_decodes() {
    let surface = noise_argb(20, 20, 9);
    let expected = expected_rgba(&surface);

    for level in -1..=9 {
        let data = encode(&surface, level);
        let decoded = image::load_from_memory(&data)
            .unwrap_or_else(|e| panic!("level {level} should decode: {e}"));
        assert_eq!(decoded.to_rgba8().into_raw(), expected, "level {level}");
    }
}

#[test]
fn test_large_image_spans_many_buffer_flushes() {
    let surface = noise_argb(300, 200, 4);
    let data = encode(&surface, 1);
    assert!(data.len() > 8192 * 3, "noise should not compress well");

    let decoded = image::load_from_memory(&data).expect("decode PNG");
    assert_eq!(decoded.to_rgba8().into_raw(), expected_rgba(&surface));
}

#[test]
fn test_color_key_becomes_transparent() {
    let (surface, colors) = keyed_palette_2x2();
    let data = encode(&surface, 9);

    let decoded = image::load_from_memory(&data).expect("decode PNG").to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [colors[0][0], colors[0][1], colors[0][2], 0]);
    assert_eq!(decoded.get_pixel(1, 0).0, [200, 200, 200, 255]);
    assert_eq!(decoded.get_pixel(1, 1).0, [120, 120, 120, 255]);
}

#[test]
fn test_rgba32_surface_passes_through() {
    let mut surface = Surface::new(3, 2, PixelFormat::rgba32()).expect("surface");
    surface.put_pixel(2, 1, PixelFormat::rgba32().map_rgba([1, 2, 3, 4]));

    let decoded = image::load_from_memory(&encode(&surface, -1))
        .expect("decode")
        .to_rgba8();
    assert_eq!(decoded.get_pixel(2, 1).0, [1, 2, 3, 4]);
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
}

// ============================================================
// 2. Compression level clamping
// ============================================================

#[test]
fn test_below_range_matches_default() {
    let surface = noise_argb(16, 16, 8);
    assert_eq!(encode(&surface, -5), encode(&surface, -1));
}

#[test]
fn test_above_range_matches_best() {
    let surface = noise_argb(16, 16, 8);
    assert_eq!(encode(&surface, 500), encode(&surface, 9));
}

// ============================================================
// 3. Failure handling
// ============================================================

#[test]
fn test_short_write_rewinds_sink() {
    let surface = noise_argb(64, 64, 1);
    let mut sink = BudgetSink::new(1000);
    sink.write_all(b"0123456789").expect("prefix");
    let start = sink.tell();

    let result = png::encode_to_sink(&mut sink, &surface, 6);

    assert!(matches!(result, Err(UpscaleError::SinkWriteError(_))));
    assert_eq!(sink.tell(), start);
}

#[test]
fn test_broken_sink_fails_and_rewinds() {
    let mut sink = BrokenSink { position: 42 };
    let result = png::encode_to_sink(&mut sink, &uniform_argb(4, 4, 0xFFFF_0000), -1);

    assert!(result.is_err());
    assert_eq!(sink.position, 42);
}

/// Rejects every write and counts how often it was asked.
struct CountingBrokenSink {
    writes: usize,
    position: u64,
}

impl Write for CountingBrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for CountingBrokenSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if let SeekFrom::Start(p) = pos {
            self.position = p;
        }
        Ok(self.position)
    }
}

#[test]
fn test_no_writes_after_sink_failure() {
    // 64x64 noise compresses to several output buffers
    let surface = noise_argb(64, 64, 21);
    let mut sink = CountingBrokenSink {
        writes: 0,
        position: 5,
    };

    let result = png::encode_to_sink(&mut sink, &surface, 6);

    assert!(
        matches!(result, Err(UpscaleError::SinkWriteError(ref msg)) if msg.contains("disk full")),
        "got {result:?}"
    );
    assert_eq!(sink.writes, 1, "the compressor must stop at the first failure");
    assert_eq!(sink.position, 5);
}

#[test]
fn test_source_surface_unchanged() {
    let surface = noise_argb(12, 12, 5);
    let before = surface.clone();
    encode(&surface, 3);
    assert_eq!(surface, before);
}

#[test]
fn test_zero_height_is_rejected() {
    let surface = Surface::new(4, 0, PixelFormat::rgba32()).expect("surface");
    let mut sink = BudgetSink::unlimited();

    let result = png::encode_to_sink(&mut sink, &surface, -1);
    assert!(matches!(result, Err(UpscaleError::PreconditionError(_))));
    assert!(sink.bytes().is_empty());
}

// ============================================================
// 4. File form
// ============================================================

#[test]
fn test_encode_to_file_writes_png() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("out.png");

    png::encode_to_file(&path, &uniform_argb(6, 5, 0x7F00_FF00), -1).expect("encode");

    let decoded = image::open(&path).expect("open PNG").to_rgba8();
    assert_eq!(decoded.dimensions(), (6, 5));
    assert_eq!(decoded.get_pixel(5, 4).0, [0, 255, 0, 0x7F]);
}
