//! Foreground-over-background compositing.
//!
//! Side-effect free so it can run inside the pipeline or be mirrored by a
//! client drawing onto its own canvas: the canvas takes the background's
//! dimensions, the background is painted first, then the foreground is
//! alpha-blended on top at the origin. Foreground pixels outside the canvas
//! are clipped.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

/// MIME type of [`compose`]'s output.
pub const COMPOSITE_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Failed to decode background image: {0}")]
    Background(#[source] image::ImageError),

    #[error("Failed to decode foreground image: {0}")]
    Foreground(#[source] image::ImageError),

    #[error("Failed to encode composite image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Composite `foreground` over `background` and return PNG bytes.
pub fn compose(background: &[u8], foreground: &[u8]) -> Result<Vec<u8>, ComposeError> {
    let background = image::load_from_memory(background).map_err(ComposeError::Background)?;
    let foreground = image::load_from_memory(foreground).map_err(ComposeError::Foreground)?;

    let mut canvas = background.to_rgba8();
    image::imageops::overlay(&mut canvas, &foreground.to_rgba8(), 0, 0);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(ComposeError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{GenericImageView, Rgba, RgbaImage};

    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn png(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn output_takes_background_dimensions() {
        let background = png(RgbaImage::from_pixel(8, 6, RED));
        let foreground = png(RgbaImage::from_pixel(3, 2, BLUE));

        let composite = image::load_from_memory(&compose(&background, &foreground).unwrap()).unwrap();

        assert_eq!(composite.dimensions(), (8, 6));
    }

    #[test]
    fn opaque_foreground_is_drawn_at_origin() {
        let background = png(RgbaImage::from_pixel(8, 6, RED));
        let foreground = png(RgbaImage::from_pixel(3, 2, BLUE));

        let composite = image::load_from_memory(&compose(&background, &foreground).unwrap())
            .unwrap()
            .to_rgba8();

        assert_eq!(*composite.get_pixel(0, 0), BLUE);
        assert_eq!(*composite.get_pixel(2, 1), BLUE);
        assert_eq!(*composite.get_pixel(3, 0), RED);
        assert_eq!(*composite.get_pixel(0, 2), RED);
        assert_eq!(*composite.get_pixel(7, 5), RED);
    }

    #[test]
    fn transparent_foreground_pixels_keep_background() {
        let background = png(RgbaImage::from_pixel(4, 4, RED));
        let mut fg = RgbaImage::from_pixel(4, 4, CLEAR);
        fg.put_pixel(1, 1, BLUE);
        let foreground = png(fg);

        let composite = image::load_from_memory(&compose(&background, &foreground).unwrap())
            .unwrap()
            .to_rgba8();

        assert_eq!(*composite.get_pixel(0, 0), RED);
        assert_eq!(*composite.get_pixel(1, 1), BLUE);
    }

    #[test]
    fn oversized_foreground_is_clipped() {
        let background = png(RgbaImage::from_pixel(2, 2, RED));
        let foreground = png(RgbaImage::from_pixel(5, 5, BLUE));

        let composite = image::load_from_memory(&compose(&background, &foreground).unwrap()).unwrap();

        assert_eq!(composite.dimensions(), (2, 2));
    }

    #[test]
    fn garbage_input_is_reported_per_layer() {
        let valid = png(RgbaImage::from_pixel(1, 1, RED));
        assert_matches!(compose(b"not an image", &valid), Err(ComposeError::Background(_)));
        assert_matches!(compose(&valid, b"not an image"), Err(ComposeError::Foreground(_)));
    }
}
