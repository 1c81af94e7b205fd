//! Error types for the median-stack crate.

use std::path::PathBuf;

/// Errors that can occur while loading, compositing, or writing rasters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The pixel data of an input file could not be decoded.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// The file that failed.
        path: PathBuf,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// The TIFF tag directory of an input file could not be read.
    #[error("failed to read metadata of {}: {source}", path.display())]
    Metadata {
        /// The file that failed.
        path: PathBuf,
        /// Underlying TIFF error.
        source: tiff::TiffError,
    },

    /// A tag needed to compute the placement is missing.
    #[error("{} has a position but no {tag} tag", path.display())]
    MissingTag {
        /// The file that failed.
        path: PathBuf,
        /// Name of the missing tag.
        tag: &'static str,
    },

    /// Position times resolution does not yield a usable canvas offset.
    #[error("{} has an invalid origin ({x}, {y}); offsets must be non-negative", path.display())]
    InvalidOrigin {
        /// The file that failed.
        path: PathBuf,
        /// Computed horizontal offset.
        x: f64,
        /// Computed vertical offset.
        y: f64,
    },

    /// An image's placed rectangle does not fit in `u32` coordinates.
    #[error("image {index} placed at ({x}, {y}) with size {width}x{height} overflows the canvas coordinate range")]
    PlacementOverflow {
        /// Position of the image in the input list.
        index: usize,
        /// Horizontal origin.
        x: u32,
        /// Vertical origin.
        y: u32,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// An image's placed rectangle extends past the canvas.
    #[error("image {index} does not fit in the {canvas_width}x{canvas_height} canvas")]
    OutOfCanvas {
        /// Position of the image in the input list.
        index: usize,
        /// Canvas width in pixels.
        canvas_width: u32,
        /// Canvas height in pixels.
        canvas_height: u32,
    },

    /// A packed pixel buffer does not hold exactly `width * height` words.
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    BufferSize {
        /// `width * height`.
        expected: usize,
        /// Length of the buffer supplied.
        actual: usize,
    },

    /// A buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes for the {what}")]
    Allocation {
        /// What the buffer was for.
        what: &'static str,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// The output raster could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Encode {
        /// The output file.
        path: PathBuf,
        /// Underlying TIFF error.
        source: tiff::TiffError,
    },
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io {
            path: PathBuf::from("tile_03.tif"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = io_err.to_string();
        assert!(msg.contains("tile_03.tif"));
        assert!(msg.contains("gone"));

        let missing = Error::MissingTag {
            path: PathBuf::from("a.tif"),
            tag: "XResolution",
        };
        assert!(missing.to_string().contains("XResolution"));

        let out = Error::OutOfCanvas {
            index: 2,
            canvas_width: 10,
            canvas_height: 20,
        };
        assert!(out.to_string().contains("10x20"));

        let alloc = Error::Allocation {
            what: "canvas",
            bytes: 64,
        };
        assert!(alloc.to_string().contains("canvas"));
    }
}
