// Phase 1: 画素形式（マスク、パレット、チャネルのパック）

use crate::error::UpscaleError;

/// Colour table of an indexed (1 byte per pixel) format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// RGBエントリからパレットを作る。エントリ数は1〜256。
    pub fn new(colors: Vec<[u8; 3]>) -> crate::error::Result<Self> {
        if colors.is_empty() || colors.len() > 256 {
            return Err(UpscaleError::precondition(format!(
                "palette must have 1-256 entries, got {}",
                colors.len()
            )));
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// インデックスを引く。範囲外のインデックスは黒として読む。
    pub fn get(&self, index: usize) -> [u8; 3] {
        self.colors.get(index).copied().unwrap_or([0, 0, 0])
    }
}

/// Memory layout of one pixel.
///
/// 複数バイトの画素はリトルエンディアンで読む（画素の0バイト目がマスクを
/// 適用する画素値の最下位バイト）。アルファマスクのない形式はアルファ損失8
/// （使えるアルファなし）とする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    bytes_per_pixel: u8,
    r_mask: u32,
    g_mask: u32,
    b_mask: u32,
    a_mask: u32,
    palette: Option<Palette>,
}

impl PixelFormat {
    /// Build a truecolour format from channel masks.
    ///
    /// Masks must fit in `bytes_per_pixel * 8` bits, must not overlap and
    /// each non-zero mask must be a single contiguous run of at most 8 bits.
    pub fn from_masks(
        bytes_per_pixel: u8,
        r_mask: u32,
        g_mask: u32,
        b_mask: u32,
        a_mask: u32,
    ) -> crate::error::Result<Self> {
        if !(1..=4).contains(&bytes_per_pixel) {
            return Err(UpscaleError::precondition(format!(
                "bytes per pixel must be 1-4, got {bytes_per_pixel}"
            )));
        }

        let limit = if bytes_per_pixel == 4 {
            u32::MAX
        } else {
            (1u32 << (u32::from(bytes_per_pixel) * 8)) - 1
        };

        let masks = [r_mask, g_mask, b_mask, a_mask];
        let mut seen = 0u32;
        for mask in masks {
            if mask & !limit != 0 {
                return Err(UpscaleError::precondition(format!(
                    "channel mask {mask:#010x} exceeds {bytes_per_pixel} bytes per pixel"
                )));
            }
            if mask & seen != 0 {
                return Err(UpscaleError::precondition(format!(
                    "channel mask {mask:#010x} overlaps another channel"
                )));
            }
            if mask != 0 {
                let run = mask >> mask.trailing_zeros();
                if run & run.wrapping_add(1) != 0 || run.count_ones() > 8 {
                    return Err(UpscaleError::precondition(format!(
                        "channel mask {mask:#010x} must be a contiguous run of at most 8 bits"
                    )));
                }
            }
            seen |= mask;
        }

        Ok(Self {
            bytes_per_pixel,
            r_mask,
            g_mask,
            b_mask,
            a_mask,
            palette: None,
        })
    }

    /// 8-bit indexed format backed by `palette`.
    pub fn indexed8(palette: Palette) -> Self {
        Self {
            bytes_per_pixel: 1,
            r_mask: 0,
            g_mask: 0,
            b_mask: 0,
            a_mask: 0,
            palette: Some(palette),
        }
    }

    /// 3 bytes per pixel, stored R, G, B. No alpha.
    pub fn rgb24() -> Self {
        Self::truecolor(3, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0)
    }

    /// 3 bytes per pixel, stored B, G, R. No alpha.
    pub fn bgr24() -> Self {
        Self::truecolor(3, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0)
    }

    /// 4 bytes per pixel, stored R, G, B, A.
    pub fn rgba32() -> Self {
        Self::truecolor(4, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000)
    }

    /// 4 bytes per pixel with pixel value `0xAARRGGBB`.
    pub fn argb8888() -> Self {
        Self::truecolor(4, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000)
    }

    /// 16-bit 5-6-5 RGB.
    pub fn rgb565() -> Self {
        Self::truecolor(2, 0xF800, 0x07E0, 0x001F, 0)
    }

    const fn truecolor(bytes_per_pixel: u8, r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            bytes_per_pixel,
            r_mask: r,
            g_mask: g,
            b_mask: b,
            a_mask: a,
            palette: None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bytes_per_pixel)
    }

    pub fn r_mask(&self) -> u32 {
        self.r_mask
    }

    pub fn g_mask(&self) -> u32 {
        self.g_mask
    }

    pub fn b_mask(&self) -> u32 {
        self.b_mask
    }

    pub fn a_mask(&self) -> u32 {
        self.a_mask
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn is_indexed(&self) -> bool {
        self.palette.is_some()
    }

    /// 8bitアルファから失われるビット数。アルファがなければ8。
    pub fn alpha_loss(&self) -> u32 {
        8 - self.a_mask.count_ones().min(8)
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha_loss() < 8
    }

    /// True when pixels in `self` and `other` have byte-identical meaning.
    pub fn same_layout(&self, other: &PixelFormat) -> bool {
        self.bytes_per_pixel == other.bytes_per_pixel
            && self.r_mask == other.r_mask
            && self.g_mask == other.g_mask
            && self.b_mask == other.b_mask
            && self.a_mask == other.a_mask
            && self.palette == other.palette
    }

    /// Decode a pixel value into 8-bit R, G, B, A.
    pub fn rgba_of(&self, pixel: u32) -> [u8; 4] {
        if let Some(palette) = &self.palette {
            let [r, g, b] = palette.get(pixel as usize);
            return [r, g, b, 255];
        }
        let alpha = if self.a_mask == 0 {
            255
        } else {
            expand_channel(pixel, self.a_mask)
        };
        [
            expand_channel(pixel, self.r_mask),
            expand_channel(pixel, self.g_mask),
            expand_channel(pixel, self.b_mask),
            alpha,
        ]
    }

    /// Encode 8-bit R, G, B, A into a pixel value of this format.
    ///
    /// Indexed formats cannot be mapped to; the caller must check
    /// [`PixelFormat::is_indexed`] first.
    pub fn map_rgba(&self, [r, g, b, a]: [u8; 4]) -> u32 {
        pack_channel(r, self.r_mask)
            | pack_channel(g, self.g_mask)
            | pack_channel(b, self.b_mask)
            | pack_channel(a, self.a_mask)
    }
}

fn expand_channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let bits = mask.count_ones();
    let value = (pixel & mask) >> mask.trailing_zeros();
    if bits >= 8 {
        (value >> (bits - 8)) as u8
    } else {
        let max = (1u32 << bits) - 1;
        ((value * 255 + max / 2) / max) as u8
    }
}

fn pack_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let bits = mask.count_ones();
    let value = u32::from(value);
    let scaled = if bits >= 8 {
        value << (bits - 8)
    } else {
        value >> (8 - bits)
    };
    (scaled << mask.trailing_zeros()) & mask
}
