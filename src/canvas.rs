//! Canvas sizing from image placements.

use crate::error::{Error, Result};
use crate::raster::RasterImage;

/// Dimensions of the output canvas, anchored at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Number of pixels on the canvas.
    #[must_use]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the canvas has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Smallest canvas containing every placed image.
///
/// Width and height are the maxima of `origin + size` taken on each axis
/// independently. An empty slice yields a zero-sized canvas.
///
/// # Errors
///
/// Returns [`Error::PlacementOverflow`] if an image's far edge does not fit
/// in `u32`.
pub fn plan_canvas(images: &[RasterImage]) -> Result<CanvasSize> {
    let mut canvas = CanvasSize::default();
    for (index, img) in images.iter().enumerate() {
        let (right, bottom) = img.extent().ok_or_else(|| {
            let (x, y) = img.origin();
            Error::PlacementOverflow {
                index,
                x,
                y,
                width: img.width(),
                height: img.height(),
            }
        })?;
        canvas.width = canvas.width.max(right);
        canvas.height = canvas.height.max(bottom);
    }
    Ok(canvas)
}
