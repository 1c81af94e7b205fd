//! Median compositing of placed images onto a canvas.

use image::{Rgba, RgbaImage};

use crate::canvas::CanvasSize;
use crate::error::{Error, Result};
use crate::median::SampleStack;
use crate::raster::RasterImage;

/// Options controlling how the canvas is filled.
#[derive(Debug, Clone)]
pub struct CompositeOptions {
    /// Pixel written where no image contributes an opaque sample.
    pub background: Rgba<u8>,
    /// Split rows across the rayon pool. Ignored without the `parallel`
    /// feature.
    pub parallel: bool,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            background: Rgba([0, 0, 0, 0]),
            parallel: true,
        }
    }
}

/// Fills a canvas with the per-channel median of overlapping images.
#[derive(Debug, Clone, Default)]
pub struct MedianCompositor {
    options: CompositeOptions,
}

impl MedianCompositor {
    /// Create a compositor with the given options.
    #[must_use]
    pub fn new(options: CompositeOptions) -> Self {
        Self { options }
    }

    /// The options this compositor was built with.
    #[must_use]
    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// Composite `images` onto a fresh canvas of size `canvas`.
    ///
    /// Every coordinate takes the median of the non-transparent samples of all
    /// images covering it, or the background pixel when there are none. The
    /// inputs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfCanvas`] or [`Error::PlacementOverflow`] if an
    /// image does not lie entirely inside the canvas, and
    /// [`Error::Allocation`] if the canvas buffer cannot be reserved.
    pub fn composite(&self, images: &[RasterImage], canvas: CanvasSize) -> Result<RgbaImage> {
        check_placements(images, canvas)?;

        if canvas.is_empty() {
            return Ok(RgbaImage::new(canvas.width, canvas.height));
        }
        let mut buf = alloc_canvas(canvas)?;

        tracing::debug!(
            images = images.len(),
            width = canvas.width,
            height = canvas.height,
            "compositing canvas"
        );

        let row_len = canvas.width as usize * 4;
        let background = self.options.background;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            if self.options.parallel {
                buf.par_chunks_mut(row_len)
                    .enumerate()
                    .for_each(|(y, row)| composite_row(images, y, row, background));
                return into_image(canvas, buf);
            }
        }

        buf.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| composite_row(images, y, row, background));
        into_image(canvas, buf)
    }
}

/// Reject images whose rectangle leaves the canvas.
fn check_placements(images: &[RasterImage], canvas: CanvasSize) -> Result<()> {
    for (index, img) in images.iter().enumerate() {
        let (x, y) = img.origin();
        let (right, bottom) = img.extent().ok_or(Error::PlacementOverflow {
            index,
            x,
            y,
            width: img.width(),
            height: img.height(),
        })?;
        if right > canvas.width || bottom > canvas.height {
            return Err(Error::OutOfCanvas {
                index,
                canvas_width: canvas.width,
                canvas_height: canvas.height,
            });
        }
    }
    Ok(())
}

fn alloc_canvas(canvas: CanvasSize) -> Result<Vec<u8>> {
    let bytes = canvas.area().checked_mul(4).ok_or(Error::Allocation {
        what: "canvas",
        bytes: usize::MAX,
    })?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| Error::Allocation {
            what: "canvas",
            bytes,
        })?;
    buf.resize(bytes, 0);
    Ok(buf)
}

fn into_image(canvas: CanvasSize, buf: Vec<u8>) -> Result<RgbaImage> {
    let expected = canvas.area();
    let actual = buf.len() / 4;
    RgbaImage::from_raw(canvas.width, canvas.height, buf).ok_or(Error::BufferSize { expected, actual })
}

/// Fill one canvas row. `row` holds `width * 4` bytes.
#[allow(clippy::cast_possible_truncation)]
fn composite_row(images: &[RasterImage], y: usize, row: &mut [u8], background: Rgba<u8>) {
    // Row index is bounded by the canvas height, itself a u32.
    let y = y as u32;
    let covering: Vec<&RasterImage> = images.iter().filter(|img| img.covers_row(y)).collect();
    let mut stack = SampleStack::with_capacity(covering.len());

    for (x, out) in row.chunks_exact_mut(4).enumerate() {
        let x = x as u32;
        stack.clear();
        for img in &covering {
            if let Some(px) = img.sample(x, y) {
                stack.push(px);
            }
        }
        let px = stack.median().unwrap_or(background);
        out.copy_from_slice(&px.0);
    }
}
