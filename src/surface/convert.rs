// Phase 1: Surface形式変換（純粋関数: 変換元は変更しない）

use super::{PixelFormat, Surface};
use crate::error::UpscaleError;

impl Surface {
    /// Create a copy of this surface in `target` format.
    ///
    /// パレットはトゥルーカラーに展開する。`target` にアルファがあれば
    /// カラーキーの画素は完全に透明になり、なければアルファとカラーキーは捨てる。
    pub fn convert(&self, target: &PixelFormat) -> crate::error::Result<Surface> {
        if target.is_indexed() {
            return Err(UpscaleError::conversion(
                "conversion to an indexed format is not supported",
            ));
        }

        let mut out = Surface::new(self.width(), self.height(), target.clone())?;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let rgba = self.get_rgba(x, y);
                out.put_pixel(x, y, target.map_rgba(rgba));
            }
        }

        Ok(out)
    }
}
