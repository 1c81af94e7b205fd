//! Encoding the composited canvas.

use std::fs::File;
use std::path::Path;

use image::RgbaImage;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::TiffError;

use crate::error::{Error, Result};

const ORIENTATION_TOP_LEFT: u16 = 1;

/// Sink for the finished canvas.
pub trait RasterWriter {
    /// Write `canvas` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the file cannot be created or written.
    fn write(&self, path: &Path, canvas: &RgbaImage) -> Result<()>;
}

/// Writes RGBA8 TIFF files.
///
/// The output is RGB with an alpha extra sample, 8 bits per sample,
/// contiguous planar configuration, top-left orientation and the encoder's
/// default strip size. The canvas is already stored top row first, so rows
/// are emitted in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffWriter;

impl RasterWriter for TiffWriter {
    fn write(&self, path: &Path, canvas: &RgbaImage) -> Result<()> {
        let encode_err = |source: TiffError| Error::Encode {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(|e| encode_err(e.into()))?;
        let mut tiff_encoder = TiffEncoder::new(file).map_err(encode_err)?;
        let mut frame = tiff_encoder
            .new_image::<colortype::RGBA8>(canvas.width(), canvas.height())
            .map_err(encode_err)?;
        frame
            .encoder()
            .write_tag(Tag::Orientation, ORIENTATION_TOP_LEFT)
            .map_err(encode_err)?;
        frame.write_data(canvas.as_raw()).map_err(encode_err)?;

        tracing::debug!(
            path = %path.display(),
            width = canvas.width(),
            height = canvas.height(),
            "wrote canvas"
        );
        Ok(())
    }
}
