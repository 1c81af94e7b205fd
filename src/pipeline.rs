//! Load, plan, composite and write in one pass.

use std::path::Path;

use crate::canvas::{plan_canvas, CanvasSize};
use crate::compositor::{CompositeOptions, MedianCompositor};
use crate::error::Result;
use crate::loader::{load_all, ImageLoader, TiffLoader};
use crate::writer::{RasterWriter, TiffWriter};

/// Where the command-line tool writes its result.
pub const DEFAULT_OUTPUT_PATH: &str = "out.tif";

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackReport {
    /// Number of images composited.
    pub images: usize,
    /// Size of the written canvas.
    pub canvas: CanvasSize,
}

/// A median stacking run wired to a loader and a writer.
///
/// Create once and call [`MedianStack::run`] for each batch. Every step fails
/// fast: the first error is returned and nothing is written.
#[derive(Debug, Clone, Default)]
pub struct MedianStack<L = TiffLoader, W = TiffWriter> {
    loader: L,
    writer: W,
    compositor: MedianCompositor,
}

impl MedianStack {
    /// TIFF loader and writer with default compositing options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: ImageLoader, W: RasterWriter> MedianStack<L, W> {
    /// Use a custom loader and writer.
    #[must_use]
    pub fn with_io(loader: L, writer: W) -> Self {
        Self {
            loader,
            writer,
            compositor: MedianCompositor::default(),
        }
    }

    /// Replace the compositing options.
    #[must_use]
    pub fn with_options(mut self, options: CompositeOptions) -> Self {
        self.compositor = MedianCompositor::new(options);
        self
    }

    /// Composite `inputs` and write the canvas to `output`.
    ///
    /// # Errors
    ///
    /// Returns the first load, placement, allocation or encode error.
    pub fn run<P>(&self, inputs: &[P], output: &Path) -> Result<StackReport>
    where
        P: AsRef<Path> + Sync,
    {
        let images = load_all(&self.loader, inputs)?;
        let canvas = plan_canvas(&images)?;

        tracing::info!(
            "Blending to a {:5}x{:5} final canvas...",
            canvas.width,
            canvas.height
        );
        let composite = self.compositor.composite(&images, canvas)?;
        drop(images);

        tracing::info!("Writing output to {}...", output.display());
        self.writer.write(output, &composite)?;

        tracing::info!("Done.");
        Ok(StackReport {
            images: inputs.len(),
            canvas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    use image::{Rgba, RgbaImage};

    use crate::error::Error;
    use crate::raster::RasterImage;

    /// Places `<x>_<y>.img` at `(x, y)` as a 2x2 opaque tile.
    struct NamedLoader;

    impl ImageLoader for NamedLoader {
        fn load(&self, path: &Path) -> Result<RasterImage> {
            let stem = path.file_stem().unwrap().to_string_lossy();
            let not_found = || Error::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "bad name"),
            };
            let (x, y) = stem.split_once('_').ok_or_else(not_found)?;
            let x: u32 = x.parse().map_err(|_| not_found())?;
            let y: u32 = y.parse().map_err(|_| not_found())?;
            let px = Rgba([u8::try_from(x * 10).unwrap(), 0, 0, 255]);
            Ok(RasterImage::new((x, y), RgbaImage::from_pixel(2, 2, px)))
        }
    }

    #[derive(Default)]
    struct CaptureWriter(RefCell<Vec<(PathBuf, RgbaImage)>>);

    impl RasterWriter for CaptureWriter {
        fn write(&self, path: &Path, canvas: &RgbaImage) -> Result<()> {
            self.0.borrow_mut().push((path.to_path_buf(), canvas.clone()));
            Ok(())
        }
    }

    #[test]
    fn run_reports_canvas_and_writes_once() {
        let stack = MedianStack::with_io(NamedLoader, CaptureWriter::default());
        let report = stack
            .run(&["0_0.img", "1_0.img", "3_1.img"], Path::new("stack.tif"))
            .unwrap();

        assert_eq!(report.images, 3);
        assert_eq!(
            report.canvas,
            CanvasSize {
                width: 5,
                height: 3
            }
        );

        let written = stack.writer.0.borrow();
        assert_eq!(written.len(), 1);
        let (path, canvas) = &written[0];
        assert_eq!(path, Path::new("stack.tif"));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([5, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(4, 2), &Rgba([30, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 2), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn load_failure_writes_nothing() {
        let stack = MedianStack::with_io(NamedLoader, CaptureWriter::default());
        let err = stack
            .run(&["0_0.img", "broken.img"], Path::new("stack.tif"))
            .unwrap_err();
        assert!(err.to_string().contains("broken.img"));
        assert!(stack.writer.0.borrow().is_empty());
    }

    #[test]
    fn background_option_reaches_compositor() {
        let stack = MedianStack::with_io(NamedLoader, CaptureWriter::default()).with_options(
            CompositeOptions {
                background: Rgba([0, 0, 0, 255]),
                ..CompositeOptions::default()
            },
        );
        stack
            .run(&["0_0.img", "2_2.img"], Path::new("stack.tif"))
            .unwrap();
        let written = stack.writer.0.borrow();
        assert_eq!(written[0].1.get_pixel(3, 0), &Rgba([0, 0, 0, 255]));
    }
}
