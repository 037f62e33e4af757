// Phase 2: ドット絵拡大（0xAARRGGBB画素列）

pub mod epx;

use serde::Deserialize;
use tracing::debug;

use crate::error::UpscaleError;

/// Smallest supported scale factor.
pub const MIN_FACTOR: u32 = 2;
/// Largest supported scale factor.
pub const MAX_FACTOR: u32 = 5;

/// Upscaling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleAlgorithm {
    /// Edge-aware EPX family (Scale2x / Scale3x).
    #[default]
    Epx,
    /// Plain pixel replication.
    Nearest,
}

/// `2..=5` 以外の倍率を拒否する。
pub fn validate_factor(factor: u32) -> crate::error::Result<()> {
    if (MIN_FACTOR..=MAX_FACTOR).contains(&factor) {
        Ok(())
    } else {
        Err(UpscaleError::scale(format!(
            "scale_factor must be between {MIN_FACTOR} and {MAX_FACTOR} (inclusive), got {factor}"
        )))
    }
}

/// Scale `src` (`width * height` pixels, row-major) by `factor`.
///
/// `(width * factor) * (height * factor)` 画素を返す。EPX系は倍率2、3、4
/// （Scale2xを2回）に対応し、EPXのない倍率5は画素の複製で拡大する。
pub fn scale(
    factor: u32,
    algorithm: ScaleAlgorithm,
    src: &[u32],
    width: u32,
    height: u32,
) -> crate::error::Result<Vec<u32>> {
    validate_factor(factor)?;

    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| UpscaleError::scale(format!("{width}x{height} image is too large")))?;
    if src.len() != expected {
        return Err(UpscaleError::scale(format!(
            "pixel count mismatch: expected {} pixels, got {}",
            expected,
            src.len()
        )));
    }
    width
        .checked_mul(factor)
        .zip(height.checked_mul(factor))
        .ok_or_else(|| {
            UpscaleError::scale(format!("{width}x{height} scaled by {factor} overflows"))
        })?;

    debug!(factor, ?algorithm, width, height, "scaling");
    let out = match (algorithm, factor) {
        (ScaleAlgorithm::Epx, 2) => epx::scale2x(src, width, height),
        (ScaleAlgorithm::Epx, 3) => epx::scale3x(src, width, height),
        (ScaleAlgorithm::Epx, 4) => {
            let doubled = epx::scale2x(src, width, height);
            epx::scale2x(&doubled, width * 2, height * 2)
        }
        _ => nearest(src, width, height, factor),
    };
    Ok(out)
}

/// Replicate every pixel into a `factor x factor` block.
fn nearest(src: &[u32], width: u32, height: u32, factor: u32) -> Vec<u32> {
    let (w, f) = (width as usize, factor as usize);
    let out_w = w * f;
    let mut out = Vec::with_capacity(out_w * height as usize * f);
    for row in src.chunks_exact(w.max(1)).take(height as usize) {
        let start = out.len();
        for &pixel in row {
            out.extend(std::iter::repeat_n(pixel, f));
        }
        for _ in 1..f {
            out.extend_from_within(start..start + out_w);
        }
    }
    out
}
