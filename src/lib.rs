//! Composite geo-positioned raster images with a per-channel median.
//!
//! Each input image carries its own offset on a shared canvas (for TIFF
//! files, position times resolution). The canvas is sized to hold every
//! image, and each pixel becomes the median of the non-transparent samples of
//! the images covering it, computed separately for R, G, B and A. Stacking
//! several exposures of the same scene this way drops passers-by, vehicles
//! and other transient objects.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use median_stack::{MedianStack, DEFAULT_OUTPUT_PATH};
//!
//! let stack = MedianStack::new();
//! let report = stack
//!     .run(&["a.tif", "b.tif", "c.tif"], Path::new(DEFAULT_OUTPUT_PATH))
//!     .expect("stacking failed");
//! println!("{}x{} canvas", report.canvas.width, report.canvas.height);
//! ```
//!
//! # In-memory compositing
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use median_stack::{plan_canvas, MedianCompositor, RasterImage};
//!
//! let images = [
//!     RasterImage::new((0, 0), RgbaImage::from_pixel(2, 2, Rgba([10, 0, 0, 255]))),
//!     RasterImage::new((1, 1), RgbaImage::from_pixel(2, 2, Rgba([20, 0, 0, 255]))),
//! ];
//! let canvas = plan_canvas(&images).unwrap();
//! let out = MedianCompositor::default().composite(&images, canvas).unwrap();
//! assert_eq!(out.dimensions(), (3, 3));
//! assert_eq!(out.get_pixel(1, 1), &Rgba([15, 0, 0, 255]));
//! ```

#![deny(missing_docs)]

pub mod canvas;
pub mod compositor;
pub mod error;
pub mod loader;
pub mod median;
mod pipeline;
pub mod raster;
pub mod writer;

pub use canvas::{plan_canvas, CanvasSize};
pub use compositor::{CompositeOptions, MedianCompositor};
pub use error::{Error, Result};
pub use loader::{load_all, ImageLoader, TiffLoader};
pub use pipeline::{MedianStack, StackReport, DEFAULT_OUTPUT_PATH};
pub use raster::{pack, unpack, RasterImage};
pub use writer::{RasterWriter, TiffWriter};
