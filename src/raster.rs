//! Decoded rasters placed on the shared canvas.

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Pack four channels into one word, channel 0 in the lowest byte.
#[must_use]
pub fn pack(px: Rgba<u8>) -> u32 {
    u32::from_le_bytes(px.0)
}

/// Split a packed word back into its four channels.
#[must_use]
pub fn unpack(word: u32) -> Rgba<u8> {
    Rgba(word.to_le_bytes())
}

/// A decoded image together with its offset on the canvas.
///
/// The pixel buffer is always RGBA8, row-major, top row first. Origin and size
/// are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    origin: (u32, u32),
    pixels: RgbaImage,
}

impl RasterImage {
    /// Place `pixels` with its top-left corner at `origin`.
    #[must_use]
    pub fn new(origin: (u32, u32), pixels: RgbaImage) -> Self {
        Self { origin, pixels }
    }

    /// Build an image from packed 32-bit pixels (see [`pack`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `data` does not hold exactly
    /// `width * height` pixels.
    pub fn from_packed(origin: (u32, u32), width: u32, height: u32, data: &[u32]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        let bytes: Vec<u8> = data.iter().flat_map(|w| w.to_le_bytes()).collect();
        let pixels = RgbaImage::from_raw(width, height, bytes).ok_or(Error::BufferSize {
            expected,
            actual: data.len(),
        })?;
        Ok(Self { origin, pixels })
    }

    /// Offset of the top-left corner on the canvas.
    #[must_use]
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// The decoded pixel buffer.
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// The pixels as packed words, row-major.
    #[must_use]
    pub fn to_packed(&self) -> Vec<u32> {
        self.pixels.pixels().map(|px| pack(*px)).collect()
    }

    /// Exclusive bottom-right corner on the canvas, or `None` on overflow.
    #[must_use]
    pub fn extent(&self) -> Option<(u32, u32)> {
        let (x, y) = self.origin;
        Some((
            x.checked_add(self.width())?,
            y.checked_add(self.height())?,
        ))
    }

    /// Whether canvas row `y` passes through this image.
    #[must_use]
    pub fn covers_row(&self, y: u32) -> bool {
        y >= self.origin.1 && y - self.origin.1 < self.height()
    }

    /// Sample at canvas coordinate `(x, y)`, or `None` when the image does not
    /// cover it.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        let (ox, oy) = self.origin;
        if x < ox || y < oy {
            return None;
        }
        let (lx, ly) = (x - ox, y - oy);
        if lx >= self.width() || ly >= self.height() {
            return None;
        }
        Some(*self.pixels.get_pixel(lx, ly))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_possible_truncation)]
    fn gradient(origin: (u32, u32)) -> RasterImage {
        let pixels = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        RasterImage::new(origin, pixels)
    }

    #[test]
    fn pack_puts_channel_zero_in_low_byte() {
        assert_eq!(pack(Rgba([0x11, 0x22, 0x33, 0x44])), 0x4433_2211);
        assert_eq!(unpack(0x4433_2211), Rgba([0x11, 0x22, 0x33, 0x44]));
    }

    #[test]
    fn sample_maps_canvas_to_local_coordinates() {
        let img = gradient((10, 5));
        assert_eq!(img.sample(10, 5), Some(Rgba([0, 0, 7, 255])));
        assert_eq!(img.sample(12, 6), Some(Rgba([2, 1, 7, 255])));
    }

    #[test]
    fn sample_outside_rectangle_is_none() {
        let img = gradient((10, 5));
        assert_eq!(img.sample(9, 5), None);
        assert_eq!(img.sample(10, 4), None);
        assert_eq!(img.sample(13, 5), None);
        assert_eq!(img.sample(10, 7), None);
    }

    #[test]
    fn covers_row_is_half_open() {
        let img = gradient((0, 5));
        assert!(!img.covers_row(4));
        assert!(img.covers_row(5));
        assert!(img.covers_row(6));
        assert!(!img.covers_row(7));
    }

    #[test]
    fn extent_detects_overflow() {
        let img = gradient((u32::MAX - 1, 0));
        assert_eq!(img.extent(), None);
        assert_eq!(gradient((4, 4)).extent(), Some((7, 6)));
    }

    #[test]
    fn from_packed_checks_length() {
        let err = RasterImage::from_packed((0, 0), 2, 2, &[0u32; 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferSize {
                expected: 4,
                actual: 3
            }
        ));

        let words: [u32; 4] = [0xff00_0001, 0xff00_0002, 0xff00_0003, 0xff00_0004];
        let img = RasterImage::from_packed((1, 2), 2, 2, &words).unwrap();
        assert_eq!(img.size(), (2, 2));
        assert_eq!(img.sample(2, 3), Some(Rgba([4, 0, 0, 255])));
        assert_eq!(img.to_packed(), words);
    }
}
