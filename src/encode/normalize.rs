// Phase 3: 形式の調整（圧縮器へ行を流す前にターゲット形式へ変換）

use std::borrow::Cow;

use tracing::debug;

use crate::surface::{PixelFormat, Surface};

/// Return `surface` in the `target` layout.
///
/// すでにターゲット形式ならそのまま借用する。それ以外（バイト順の違い、
/// パレット、ターゲットにないアルファ、透明にすべきカラーキー）は新しい
/// Surfaceに変換し、エンコード呼び出しの終わりに解放する。入力は変更しない。
pub fn ensure_target_layout<'a>(
    surface: &'a Surface,
    target: &PixelFormat,
) -> crate::error::Result<Cow<'a, Surface>> {
    let key_needs_alpha = surface.color_key().is_some() && target.has_alpha();
    if surface.format().same_layout(target) && !key_needs_alpha {
        return Ok(Cow::Borrowed(surface));
    }

    debug!(
        width = surface.width(),
        height = surface.height(),
        from_bpp = surface.format().bytes_per_pixel(),
        to_bpp = target.bytes_per_pixel(),
        "converting surface to compressor layout"
    );
    surface.convert(target).map(Cow::Owned)
}
