// Phase 1: メモリ上のビットマップ（幅、高さ、ピッチ、形式、画素）

pub mod convert;
pub mod format;

pub use format::{Palette, PixelFormat};

use crate::error::UpscaleError;

/// 新規確保するSurfaceの行アラインメント。
const PITCH_ALIGN: usize = 4;

/// An in-memory bitmap.
///
/// `pixels` holds exactly `pitch * height` bytes. Each row starts at
/// `y * pitch` and its first `width * bytes_per_pixel` bytes are visible;
/// the rest of the row is padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    pixels: Vec<u8>,
    color_key: Option<u32>,
}

impl Surface {
    /// ピッチを4バイト境界に揃えた、ゼロ埋めのSurfaceを確保する。
    ///
    /// 確保に失敗した場合はプロセスを中断せず、変換エラーとして返す。
    pub fn new(width: u32, height: u32, format: PixelFormat) -> crate::error::Result<Self> {
        let row_bytes = row_bytes(width, &format)?;
        let pitch = row_bytes
            .checked_next_multiple_of(PITCH_ALIGN)
            .ok_or_else(|| overflow_error(width, height))?;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or_else(|| overflow_error(width, height))?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|e| {
            UpscaleError::conversion(format!("cannot allocate {len} bytes for {width}x{height} surface: {e}"))
        })?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            pitch,
            format,
            pixels,
            color_key: None,
        })
    }

    /// Wrap existing pixel bytes.
    ///
    /// # Arguments
    /// * `pitch`  - Bytes per row, at least `width * bytes_per_pixel`
    /// * `pixels` - Exactly `pitch * height` bytes
    pub fn from_pixels(
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> crate::error::Result<Self> {
        let row_bytes = row_bytes(width, &format)?;
        if pitch < row_bytes {
            return Err(UpscaleError::precondition(format!(
                "pitch {pitch} is smaller than a {width}-pixel row ({row_bytes} bytes)"
            )));
        }
        let expected_len = pitch
            .checked_mul(height as usize)
            .ok_or_else(|| overflow_error(width, height))?;
        if pixels.len() != expected_len {
            return Err(UpscaleError::precondition(format!(
                "pixel buffer size mismatch: expected {} bytes, got {}",
                expected_len,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pitch,
            format,
            pixels,
            color_key: None,
        })
    }

    /// Build an `argb8888` surface from packed `0xAARRGGBB` pixels.
    pub fn from_argb(width: u32, height: u32, argb: &[u32]) -> crate::error::Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| overflow_error(width, height))?;
        if argb.len() != expected {
            return Err(UpscaleError::precondition(format!(
                "ARGB data size mismatch: expected {} pixels, got {}",
                expected,
                argb.len()
            )));
        }

        let pixels: Vec<u8> = argb.iter().flat_map(|p| p.to_le_bytes()).collect();
        Self::from_pixels(width, height, width as usize * 4, PixelFormat::argb8888(), pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn color_key(&self) -> Option<u32> {
        self.color_key
    }

    /// 値が `key` の画素を透明として扱う。
    pub fn set_color_key(&mut self, key: Option<u32>) {
        self.color_key = key;
    }

    /// 行 `y` の可視部分（パディングを除く）。
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &self.pixels[start..start + len]
    }

    /// Read the raw pixel value at (`x`, `y`).
    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.pitch + x as usize * bpp;
        let mut bytes = [0u8; 4];
        bytes[..bpp].copy_from_slice(&self.pixels[offset..offset + bpp]);
        u32::from_le_bytes(bytes)
    }

    /// Write the raw pixel value at (`x`, `y`).
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: u32) {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.pitch + x as usize * bpp;
        self.pixels[offset..offset + bpp].copy_from_slice(&pixel.to_le_bytes()[..bpp]);
    }

    /// (`x`, `y`) の画素を8bit RGBAに展開する。
    ///
    /// カラーキーと一致する画素はアルファ0になる。
    pub fn get_rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let pixel = self.get_pixel(x, y);
        let mut rgba = self.format.rgba_of(pixel);
        if self.color_key == Some(pixel) {
            rgba[3] = 0;
        }
        rgba
    }

    /// Unpack every visible pixel to `0xAARRGGBB`, row-major.
    pub fn to_argb(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b, a] = self.get_rgba(x, y);
                out.push(u32::from_be_bytes([a, r, g, b]));
            }
        }
        out
    }
}

fn row_bytes(width: u32, format: &PixelFormat) -> crate::error::Result<usize> {
    (width as usize)
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(|| UpscaleError::precondition(format!("surface width {width} overflows row size")))
}

fn overflow_error(width: u32, height: u32) -> UpscaleError {
    UpscaleError::precondition(format!("overflow computing buffer size for {width}x{height} surface"))
}
