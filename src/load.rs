// Phase 5: 画像ファイル -> Surface (image crateのデコーダ)

use std::path::Path;

use crate::error::UpscaleError;
use crate::surface::{PixelFormat, Surface};

/// Load an image file into an `rgba32` surface.
///
/// `image` crateがデコードできる形式なら何でも受け付け、画素は8bit RGBAに展開する。
pub fn load_surface(path: &Path) -> crate::error::Result<Surface> {
    let img = image::open(path).map_err(|e| {
        UpscaleError::load(format!(
            "Failed to load source image '{}': {e}",
            path.display()
        ))
    })?;
    into_surface(img)
}

/// Decode an in-memory image into an `rgba32` surface.
pub fn load_surface_from_memory(bytes: &[u8]) -> crate::error::Result<Surface> {
    let img = image::load_from_memory(bytes)?;
    into_surface(img)
}

fn into_surface(img: image::DynamicImage) -> crate::error::Result<Surface> {
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    Surface::from_pixels(
        width,
        height,
        width as usize * 4,
        PixelFormat::rgba32(),
        rgba.into_raw(),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn test_load_from_memory_is_rgba32() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).expect("encode PNG");

        let surface = load_surface_from_memory(png.get_ref()).expect("load");
        assert_eq!((surface.width(), surface.height()), (3, 2));
        assert!(surface.format().same_layout(&PixelFormat::rgba32()));
        assert_eq!(surface.get_rgba(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_load_garbage_fails() {
        let result = load_surface_from_memory(b"not an image");
        assert!(matches!(result, Err(UpscaleError::LoadError(_))));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_surface(Path::new("/nonexistent/sprite.png"));
        assert!(matches!(result, Err(UpscaleError::LoadError(_))));
    }
}
