//! Decoding input rasters and their canvas placement.
//!
//! Pixels are decoded with the `image` crate, whatever the container. For TIFF
//! inputs the placement comes from the `XPosition`/`YPosition` tags multiplied
//! by `XResolution`/`YResolution`, read through the `tiff` crate. Inputs
//! without position tags are placed at origin 0 on the missing axis.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Limits, RgbaImage};
use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::raster::RasterImage;

// No named variants for these in `tiff::tags::Tag`.
const X_POSITION: Tag = Tag::from_u16_exhaustive(286);
const Y_POSITION: Tag = Tag::from_u16_exhaustive(287);

/// Source of decoded, placed images.
///
/// Implementations must be callable from several threads at once; each call
/// is independent of every other.
pub trait ImageLoader: Sync {
    /// Decode the file at `path` into a placed RGBA image.
    ///
    /// # Errors
    ///
    /// Returns an error naming `path` if the file cannot be read or decoded,
    /// or its placement metadata is unusable.
    fn load(&self, path: &Path) -> Result<RasterImage>;
}

/// Loader for TIFF stacks, accepting any format the `image` crate decodes.
///
/// Decoding runs without the `image` crate's default allocation cap, so large
/// aerial tiles load as long as memory allows.
#[derive(Debug, Clone)]
pub struct TiffLoader {
    limits: Limits,
}

impl Default for TiffLoader {
    fn default() -> Self {
        Self {
            limits: Limits::no_limits(),
        }
    }
}

impl TiffLoader {
    /// Create a loader without decoder limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that enforces `limits` while decoding.
    #[must_use]
    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    /// Decoder limits applied to every file.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

impl ImageLoader for TiffLoader {
    fn load(&self, path: &Path) -> Result<RasterImage> {
        let (format, pixels) = decode_pixels(path, &self.limits)?;
        let origin = if format == Some(ImageFormat::Tiff) {
            read_origin(path)?
        } else {
            tracing::warn!(path = %path.display(), "not a TIFF, placing at origin");
            (0, 0)
        };
        Ok(RasterImage::new(origin, pixels))
    }
}

/// Load every path with `loader`, in parallel when the `parallel` feature is
/// enabled.
///
/// The result keeps the order of `paths`. The first failure aborts the batch
/// and no partial result is returned.
///
/// # Errors
///
/// Returns the error of the first image that fails to load.
pub fn load_all<L, P>(loader: &L, paths: &[P]) -> Result<Vec<RasterImage>>
where
    L: ImageLoader + ?Sized,
    P: AsRef<Path> + Sync,
{
    let total = paths.len();
    tracing::info!("Loading {total:3} images...");

    let load_one = |(i, path): (usize, &P)| -> Result<RasterImage> {
        let path = path.as_ref();
        let img = loader.load(path)?;
        let (x, y) = img.origin();
        tracing::info!(
            "{:3}/{:<3} {}: loaded {:5}x{:<5}+{:5}+{:<5}",
            i + 1,
            total,
            path.display(),
            img.width(),
            img.height(),
            x,
            y
        );
        Ok(img)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        paths.par_iter().enumerate().map(load_one).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().enumerate().map(load_one).collect()
    }
}

/// Decode pixels into top-left oriented RGBA8, synthesizing opaque alpha when
/// the source has none.
fn decode_pixels(path: &Path, limits: &Limits) -> Result<(Option<ImageFormat>, RgbaImage)> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let decode_err = |source| Error::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;
    reader.limits(limits.clone());
    let format = reader.format();

    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);

    Ok((format, img.to_rgba8()))
}

/// Canvas origin of a TIFF file from its position and resolution tags.
fn read_origin(path: &Path) -> Result<(u32, u32)> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|source| Error::Metadata {
        path: path.to_path_buf(),
        source,
    })?;

    let x = axis_offset(&mut decoder, path, X_POSITION, Tag::XResolution, "XResolution")?;
    let y = axis_offset(&mut decoder, path, Y_POSITION, Tag::YResolution, "YResolution")?;
    if x.is_none() && y.is_none() {
        tracing::warn!(path = %path.display(), "no position tags, placing at origin");
    }

    origin_from_offsets(path, x.unwrap_or(0.0), y.unwrap_or(0.0))
}

/// `round(position * resolution)` for one axis, or `None` without a position.
fn axis_offset<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
    position: Tag,
    resolution: Tag,
    resolution_name: &'static str,
) -> Result<Option<f64>> {
    let Some(pos) = find_number(decoder, path, position)? else {
        return Ok(None);
    };
    let res = find_number(decoder, path, resolution)?.ok_or_else(|| Error::MissingTag {
        path: path.to_path_buf(),
        tag: resolution_name,
    })?;

    let offset = (pos * res).round();
    tracing::debug!(
        path = %path.display(),
        tag = position.to_u16(),
        pos,
        res,
        offset,
        "placement tag"
    );
    Ok(Some(offset))
}

fn find_number<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
    tag: Tag,
) -> Result<Option<f64>> {
    let value = decoder
        .find_tag(tag)
        .map_err(|source| Error::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(value.and_then(value_to_f64))
}

fn value_to_f64(value: Value) -> Option<f64> {
    match value {
        Value::Rational(n, d) => (d != 0).then(|| f64::from(n) / f64::from(d)),
        Value::SRational(n, d) => (d != 0).then(|| f64::from(n) / f64::from(d)),
        Value::Float(v) => Some(f64::from(v)),
        Value::Double(v) => Some(v),
        Value::Short(v) => Some(f64::from(v)),
        Value::Unsigned(v) => Some(f64::from(v)),
        Value::Signed(v) => Some(f64::from(v)),
        Value::List(mut values) if values.len() == 1 => values.pop().and_then(value_to_f64),
        _ => None,
    }
}

/// Convert rounded offsets to pixel coordinates, rejecting anything that would
/// land before the canvas origin.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn origin_from_offsets(path: &Path, x: f64, y: f64) -> Result<(u32, u32)> {
    let valid = |v: f64| v.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&v);
    if !valid(x) || !valid(y) {
        return Err(Error::InvalidOrigin {
            path: PathBuf::from(path),
            x,
            y,
        });
    }
    Ok((x as u32, y as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use image::Rgba;

    struct MapLoader(HashMap<PathBuf, RasterImage>);

    impl ImageLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<RasterImage> {
            self.0.get(path).cloned().ok_or_else(|| Error::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such image"),
            })
        }
    }

    fn map_loader(n: u32) -> MapLoader {
        let images = (0..n)
            .map(|i| {
                let px = Rgba([u8::try_from(i).unwrap(), 0, 0, 255]);
                (
                    PathBuf::from(format!("tile_{i}.tif")),
                    RasterImage::new((i, i * 2), RgbaImage::from_pixel(2, 2, px)),
                )
            })
            .collect();
        MapLoader(images)
    }

    #[test]
    fn load_all_preserves_input_order() {
        let loader = map_loader(16);
        let paths: Vec<PathBuf> = (0..16).rev().map(|i| PathBuf::from(format!("tile_{i}.tif"))).collect();
        let images = load_all(&loader, &paths).unwrap();
        assert_eq!(images.len(), 16);
        for (img, i) in images.iter().zip((0..16u32).rev()) {
            assert_eq!(img.origin(), (i, i * 2));
        }
    }

    #[test]
    fn load_all_fails_on_any_missing_image() {
        let loader = map_loader(4);
        let paths = ["tile_0.tif", "tile_1.tif", "missing.tif", "tile_3.tif"];
        let err = load_all(&loader, &paths).unwrap_err();
        assert!(err.to_string().contains("missing.tif"));
    }

    #[test]
    fn load_all_accepts_trait_objects() {
        let loader: &dyn ImageLoader = &map_loader(1);
        let images = load_all(loader, &["tile_0.tif"]).unwrap();
        assert_eq!(images[0].size(), (2, 2));
    }

    #[test]
    fn rational_and_float_values_convert() {
        assert_eq!(value_to_f64(Value::Rational(3, 2)), Some(1.5));
        assert_eq!(value_to_f64(Value::Rational(3, 0)), None);
        assert_eq!(value_to_f64(Value::Float(0.25)), Some(0.25));
        assert_eq!(value_to_f64(Value::List(vec![Value::Short(7)])), Some(7.0));
        assert_eq!(value_to_f64(Value::Ascii("x".into())), None);
    }

    #[test]
    fn negative_origin_is_rejected() {
        let err = origin_from_offsets(Path::new("neg.tif"), -1.0, 4.0).unwrap_err();
        assert!(matches!(err, Error::InvalidOrigin { .. }));
        let err = origin_from_offsets(Path::new("nan.tif"), f64::NAN, 0.0).unwrap_err();
        assert!(err.to_string().contains("nan.tif"));
        assert_eq!(origin_from_offsets(Path::new("ok.tif"), 12.0, 0.0).unwrap(), (12, 0));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TiffLoader::new()
            .load(Path::new("/nonexistent/stack/a.tif"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
