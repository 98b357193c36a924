//! Image encoding: rendered page bitmaps → PNG bytes → base64 slide images.
//!
//! PNG is lossless, so text baked into a fidelity background stays crisp when
//! the slide is zoomed. Pages are encoded once, right after rendering, so the
//! uncompressed bitmap never outlives the capture step.

use crate::deck::SlideImage;
use crate::document::PageRaster;
use crate::error::Pdf2DeckError;
use crate::geometry::SlideRect;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// PNG-encode a rendered page.
pub fn encode_raster(img: &DynamicImage, page: usize) -> Result<PageRaster, Pdf2DeckError> {
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| Pdf2DeckError::RasterisationFailed {
            page,
            detail: format!("PNG encoding failed: {e}"),
        })?;
    debug!(page, width = img.width(), height = img.height(), bytes = png.len(), "encoded page raster");
    Ok(PageRaster {
        png,
        width: img.width(),
        height: img.height(),
    })
}

/// Wrap a page raster as a slide image covering `rect`.
pub fn raster_to_slide_image(raster: &PageRaster, rect: SlideRect) -> SlideImage {
    SlideImage {
        mime_type: PNG_MIME.to_string(),
        data: STANDARD.encode(&raster.png),
        rect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 6, Rgba([255, 0, 0, 255])));
        let raster = encode_raster(&img, 1).expect("encode should succeed");
        assert_eq!((raster.width, raster.height), (10, 6));
        assert_eq!(&raster.png[1..4], b"PNG");

        let slide_image = raster_to_slide_image(&raster, SlideRect::default());
        assert_eq!(slide_image.mime_type, "image/png");
        let decoded = STANDARD.decode(&slide_image.data).expect("valid base64");
        assert_eq!(decoded, raster.png);
    }
}
