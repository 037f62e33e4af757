// Phase 4: PNGエンコーダブリッジ (png crateのStreamWriterで行単位に圧縮)
//
// JPEGブリッジと同じ手順で圧縮器だけが異なる。Surfaceは8bit RGBAに正規化し、
// 各行をそのままpngのストリームに渡す。IDATチャンクは出力されるたびに
// 出力バッファへ流れる。

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use ::png::{BitDepth, ColorType, Compression, DeflateCompression, EncodingError, StreamWriter};

use super::{Codec, ScanlineCompressor, encode_surface, io_failure};
use crate::error::UpscaleError;
use crate::surface::{PixelFormat, Surface};

/// zlibのデフォルトレベルを意味する圧縮レベル。
pub const DEFAULT_COMPRESSION: i32 = -1;
/// Highest zlib compression level.
pub const BEST_COMPRESSION: i32 = 9;

const BYTES_PER_PIXEL: usize = 4;

/// Clamp a requested compression level into `-1..=9`.
///
/// `-1` (and anything below it) selects the library default.
pub fn clamp_compression(level: i32) -> i32 {
    level.clamp(DEFAULT_COMPRESSION, BEST_COMPRESSION)
}

/// Write `surface` as a PNG file at `path`.
///
/// # Arguments
/// * `path`        - Destination file, created or truncated
/// * `surface`     - Image to write; alpha and colour key are preserved
/// * `compression` - zlib level 0-9, or -1 for the default; clamped
pub fn encode_to_file(path: &Path, surface: &Surface, compression: i32) -> crate::error::Result<()> {
    let mut file = File::create(path)?;
    encode_to_sink(&mut file, surface, compression)
}

/// Write `surface` as PNG data to `sink` at its current position.
///
/// On failure the sink is repositioned to where it was on entry.
pub fn encode_to_sink<S: Write + Seek>(
    sink: &mut S,
    surface: &Surface,
    compression: i32,
) -> crate::error::Result<()> {
    encode_surface::<Png, S>(sink, surface, clamp_compression(compression))
}

pub(crate) struct Png;

impl Codec for Png {
    const NAME: &'static str = "PNG";
    const MAX_DIMENSION: u32 = i32::MAX as u32;

    type Params = i32;
    type Compressor<W: Write> = PngCompressor<W>;

    fn target_layout() -> PixelFormat {
        PixelFormat::rgba32()
    }

    fn start<W: Write>(
        out: W,
        width: u32,
        height: u32,
        level: i32,
    ) -> crate::error::Result<PngCompressor<W>> {
        let mut encoder = ::png::Encoder::new(out, width, height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        match level {
            l if l < 0 => encoder.set_compression(Compression::Balanced),
            0 => encoder.set_deflate_compression(DeflateCompression::NoCompression),
            l => encoder.set_deflate_compression(DeflateCompression::Level(l as u8)),
        }

        let stream = encoder
            .write_header()
            .and_then(|writer| writer.into_stream_writer())
            .map_err(encoding_failure)?;

        Ok(PngCompressor {
            stream,
            row_bytes: width as usize * BYTES_PER_PIXEL,
            rows_left: height,
        })
    }

    fn encode_error(msg: String) -> UpscaleError {
        UpscaleError::png_encode(msg)
    }
}

/// Streaming PNG compressor for 8-bit RGBA scanlines.
pub(crate) struct PngCompressor<W: Write> {
    stream: StreamWriter<'static, W>,
    row_bytes: usize,
    rows_left: u32,
}

impl<W: Write> ScanlineCompressor for PngCompressor<W> {
    fn write_scanline(&mut self, row: &[u8]) -> crate::error::Result<()> {
        if row.len() != self.row_bytes {
            return Err(UpscaleError::png_encode(format!(
                "scanline has {} bytes, expected {}",
                row.len(),
                self.row_bytes
            )));
        }
        if self.rows_left == 0 {
            return Err(UpscaleError::png_encode("more scanlines than image height"));
        }

        self.stream
            .write_all(row)
            .map_err(|e| io_failure(e, UpscaleError::PngEncodeError))?;
        self.rows_left -= 1;
        Ok(())
    }

    fn finish(self) -> crate::error::Result<()> {
        if self.rows_left != 0 {
            return Err(UpscaleError::png_encode(format!(
                "image incomplete: {} scanlines missing",
                self.rows_left
            )));
        }

        self.stream.finish().map_err(encoding_failure)
    }
}

fn encoding_failure(err: EncodingError) -> UpscaleError {
    match err {
        EncodingError::IoError(e) => io_failure(e, UpscaleError::PngEncodeError),
        other => UpscaleError::png_encode(other.to_string()),
    }
}
