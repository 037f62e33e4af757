// Phase 4: JPEGエンコーダブリッジ (mozjpeg: libjpegのスキャンライン圧縮)
//
// どの形式のSurfaceも受け付ける。パレットやアルファ付きのSurfaceは一時的な
// 24bit RGBコピーに変換してから圧縮し（呼び出し元のSurfaceは変更しない）、
// アルファは捨てる。グレースケール出力は行わない。

use std::any::Any;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use mozjpeg::compress::CompressStarted;
use mozjpeg::{ColorSpace, Compress};

use super::{Codec, ScanlineCompressor, encode_surface, io_failure};
use crate::error::UpscaleError;
use crate::surface::{PixelFormat, Surface};

/// Lowest accepted quality; smaller values are clamped up to it.
pub const MIN_QUALITY: i32 = 0;
/// Highest accepted quality; larger values are clamped down to it.
pub const MAX_QUALITY: i32 = 100;

/// 品質値を `0..=100` にクランプする。
///
/// 範囲外の値はエラーにせず黙ってクランプする。
pub fn clamp_quality(quality: i32) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY) as u8
}

/// Write `surface` as a JPEG file at `path`.
///
/// The file is created (or truncated), written through [`encode_to_sink`]
/// and closed whatever the outcome.
///
/// # Arguments
/// * `path`    - Destination file
/// * `surface` - Image to write; alpha is discarded
/// * `quality` - JPEG quality 0-100, clamped when out of range
pub fn encode_to_file(path: &Path, surface: &Surface, quality: i32) -> crate::error::Result<()> {
    let mut file = File::create(path)?;
    encode_to_sink(&mut file, surface, quality)
}

/// Write `surface` as JPEG data to `sink` at its current position.
///
/// 失敗した場合、シンクは呼び出し時の位置に戻され、原因を示すエラーを返す。
pub fn encode_to_sink<S: Write + Seek>(
    sink: &mut S,
    surface: &Surface,
    quality: i32,
) -> crate::error::Result<()> {
    encode_surface::<Jpeg, S>(sink, surface, clamp_quality(quality))
}

pub(crate) struct Jpeg;

impl Codec for Jpeg {
    const NAME: &'static str = "JPEG";
    const MAX_DIMENSION: u32 = u16::MAX as u32;

    type Params = u8;
    type Compressor<W: Write> = JpegCompressor<W>;

    fn target_layout() -> PixelFormat {
        PixelFormat::rgb24()
    }

    fn start<W: Write>(
        out: W,
        width: u32,
        height: u32,
        quality: u8,
    ) -> crate::error::Result<JpegCompressor<W>> {
        let started = guarded(|| {
            let mut compress = Compress::new(ColorSpace::JCS_RGB);
            // libjpeg-turbo互換のベースライン設定（プログレッシブ・最適化なし）
            compress.set_fastest_defaults();
            compress.set_size(width as usize, height as usize);
            compress.set_quality(f32::from(quality));
            compress.start_compress(out)
        })?;

        Ok(JpegCompressor {
            started,
            row_bytes: width as usize * 3,
            rows_left: height,
        })
    }

    fn encode_error(msg: String) -> UpscaleError {
        UpscaleError::jpeg_encode(msg)
    }
}

/// Baseline JPEG compressor fed with packed R, G, B scanlines.
///
/// 各行はそのままlibjpegに渡され、MCU行がそろうたびに圧縮データが出力される。
pub(crate) struct JpegCompressor<W: Write> {
    started: CompressStarted<W>,
    row_bytes: usize,
    rows_left: u32,
}

impl<W: Write> ScanlineCompressor for JpegCompressor<W> {
    fn write_scanline(&mut self, row: &[u8]) -> crate::error::Result<()> {
        if row.len() != self.row_bytes {
            return Err(UpscaleError::jpeg_encode(format!(
                "scanline has {} bytes, expected {}",
                row.len(),
                self.row_bytes
            )));
        }
        if self.rows_left == 0 {
            return Err(UpscaleError::jpeg_encode("more scanlines than image height"));
        }

        let started = &mut self.started;
        guarded(|| started.write_scanlines(row))?;
        self.rows_left -= 1;
        Ok(())
    }

    fn finish(self) -> crate::error::Result<()> {
        if self.rows_left != 0 {
            return Err(UpscaleError::jpeg_encode(format!(
                "image incomplete: {} scanlines missing",
                self.rows_left
            )));
        }

        let started = self.started;
        guarded(move || started.finish()).map(drop)
    }
}

/// Run a libjpeg call, turning its unwinding error exit into an error value.
///
/// Sink failures surface here as `JERR_FILE_WRITE`; the encoder bridge
/// classifies them from the destination's recorded failure instead.
fn guarded<T>(op: impl FnOnce() -> io::Result<T>) -> crate::error::Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(io_failure(e, UpscaleError::JpegEncodeError)),
        Err(payload) => Err(UpscaleError::jpeg_encode(unwind_message(payload.as_ref()))),
    }
}

fn unwind_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else {
        "libjpeg fatal error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    use super::*;
    use crate::encode::destination::Destination;

    /// Counts the bytes that reach it.
    struct CountingSink {
        received: Rc<Cell<usize>>,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.received.set(self.received.get() + buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn noise_row(state: &mut u32, row: &mut [u8]) {
        for byte in row.iter_mut() {
            *state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *byte = (*state >> 24) as u8;
        }
    }

    #[test]
    fn test_clamp_quality() {
        assert_eq!(clamp_quality(-5), 0);
        assert_eq!(clamp_quality(0), 0);
        assert_eq!(clamp_quality(85), 85);
        assert_eq!(clamp_quality(100), 100);
        assert_eq!(clamp_quality(500), 100);
    }

    #[test]
    fn test_compressor_rejects_wrong_row_length() {
        let mut compressor = Jpeg::start(Vec::new(), 2, 1, 75).expect("start");
        let result = compressor.write_scanline(&[0u8; 5]);
        assert!(matches!(result, Err(UpscaleError::JpegEncodeError(_))));
    }

    #[test]
    fn test_compressor_rejects_extra_rows() {
        let mut compressor = Jpeg::start(Vec::new(), 1, 1, 75).expect("start");
        compressor.write_scanline(&[1, 2, 3]).expect("row");
        let result = compressor.write_scanline(&[1, 2, 3]);
        assert!(matches!(result, Err(UpscaleError::JpegEncodeError(_))));
    }

    #[test]
    fn test_compressor_rejects_missing_rows() {
        let mut compressor = Jpeg::start(Vec::new(), 1, 2, 75).expect("start");
        compressor.write_scanline(&[1, 2, 3]).expect("row");
        assert!(compressor.finish().is_err(), "one row short must fail");
    }

    #[test]
    fn test_destination_receives_data_before_last_row() {
        let received = Rc::new(Cell::new(0));
        let mut sink = CountingSink {
            received: Rc::clone(&received),
        };
        let mut destination = Destination::new(&mut sink);

        let (width, height) = (256u32, 256u32);
        let mut compressor = Jpeg::start(&mut destination, width, height, 90).expect("start");
        let mut row = vec![0u8; width as usize * 3];
        let mut state = 7u32;
        for _ in 0..height - 1 {
            noise_row(&mut state, &mut row);
            compressor.write_scanline(&row).expect("row");
        }

        // 最終行の前に圧縮データがシンクまで届いている
        let before_last = received.get();
        assert!(before_last > 0, "no output reached the sink before the last row");

        noise_row(&mut state, &mut row);
        compressor.write_scanline(&row).expect("last row");
        compressor.finish().expect("finish");
        destination.finish().expect("flush");
        assert!(received.get() > before_last);
    }

    #[test]
    fn test_libjpeg_error_becomes_encode_error() {
        // libjpeg rejects sizes above 65500 when compression starts
        let result = Jpeg::start(Vec::new(), 65_535, 1, 75);
        match result {
            Err(UpscaleError::JpegEncodeError(msg)) => {
                assert!(msg.contains("libjpeg"), "unexpected message: {msg}")
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("oversized image must be rejected"),
        }
    }

    #[test]
    fn test_encode_writes_jfif_markers() {
        let surface = Surface::from_argb(8, 8, &[0xFF80_4020; 64]).expect("surface");
        let mut sink = Cursor::new(Vec::new());
        encode_to_sink(&mut sink, &surface, 90).expect("encode");

        let data = sink.into_inner();
        assert!(data.starts_with(&[0xFF, 0xD8]), "missing SOI");
        assert!(data.ends_with(&[0xFF, 0xD9]), "missing EOI");
    }
}
