//! Source images, target geometry and the pluggable image operations.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use wristlink_protocol::ScreenInfo;

use crate::error::{AssetError, Result};

/// Pixel layout of a [`SourceImage`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray8,
    Rgb8,
    Rgba8,
    /// Print separations; not accepted by the codec.
    Cmyk8,
    /// Palette indices without the palette; not accepted by the codec.
    Indexed8,
}

impl ColorModel {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorModel::Gray8 | ColorModel::Indexed8 => 1,
            ColorModel::Rgb8 => 3,
            ColorModel::Rgba8 | ColorModel::Cmyk8 => 4,
        }
    }

    /// Whether the codec can convert this model to RGB.
    pub fn is_supported(&self) -> bool {
        matches!(self, ColorModel::Gray8 | ColorModel::Rgb8 | ColorModel::Rgba8)
    }
}

/// A decoded image as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorModel,
    pub data: Vec<u8>,
}

impl SourceImage {
    pub fn new(width: u32, height: u32, color: ColorModel, data: Vec<u8>) -> Self {
        SourceImage {
            width,
            height,
            color,
            data,
        }
    }

    /// Wrap an `image` crate buffer. High bit-depth formats are narrowed to
    /// 8-bit RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(buf) => Self::new(width, height, ColorModel::Gray8, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => Self::new(width, height, ColorModel::Rgb8, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => Self::new(width, height, ColorModel::Rgba8, buf.into_raw()),
            other => Self::new(width, height, ColorModel::Rgba8, other.to_rgba8().into_raw()),
        }
    }

    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_dynamic(image::open(path)?))
    }

    /// Expected buffer length for the declared size and color model.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.color.bytes_per_pixel())
    }

    /// Zero-sized, unsupported, or buffer length disagrees with the header.
    pub fn degenerate_reason(&self) -> Option<String> {
        if self.width == 0 || self.height == 0 {
            return Some(format!("zero dimension {}x{}", self.width, self.height));
        }
        if !self.color.is_supported() {
            return Some(format!("unsupported color model {:?}", self.color));
        }
        match self.expected_len() {
            Some(len) if len == self.data.len() => None,
            Some(len) => Some(format!(
                "buffer holds {} bytes, {}x{} {:?} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.color,
                len
            )),
            None => Some("image size overflows".to_string()),
        }
    }
}

/// Target pixel size on the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Geometry { width, height }
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl From<ScreenInfo> for Geometry {
    fn from(screen: ScreenInfo) -> Self {
        let (w, h) = screen.recommended_image_size();
        Geometry::new(w as u32, h as u32)
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Decode-to-RGBA and resize capability.
pub trait ImageOps: Send + Sync {
    /// Convert a supported source to 8-bit RGBA.
    fn to_rgba(&self, source: &SourceImage) -> Result<RgbaImage>;

    /// Scale to exactly `target`.
    fn resize(&self, raster: &RgbaImage, target: Geometry) -> Result<RgbaImage>;
}

/// [`ImageOps`] backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateOps {
    pub filter: FilterType,
}

impl Default for ImageCrateOps {
    fn default() -> Self {
        ImageCrateOps {
            filter: FilterType::Triangle,
        }
    }
}

impl ImageOps for ImageCrateOps {
    fn to_rgba(&self, source: &SourceImage) -> Result<RgbaImage> {
        let (w, h) = (source.width, source.height);
        let data = source.data.clone();
        let mismatch = || AssetError::InvalidImage(format!("buffer does not match {}x{}", w, h));
        let dynamic = match source.color {
            ColorModel::Gray8 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, data).ok_or_else(mismatch)?),
            ColorModel::Rgb8 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, data).ok_or_else(mismatch)?),
            ColorModel::Rgba8 => return RgbaImage::from_raw(w, h, data).ok_or_else(mismatch),
            other => {
                return Err(AssetError::InvalidImage(format!(
                    "unsupported color model {:?}",
                    other
                )))
            }
        };
        Ok(dynamic.to_rgba8())
    }

    fn resize(&self, raster: &RgbaImage, target: Geometry) -> Result<RgbaImage> {
        if target.width == 0 || target.height == 0 {
            return Err(AssetError::ImageProcess(format!("cannot resize to {}", target)));
        }
        if raster.dimensions() == (target.width, target.height) {
            return Ok(raster.clone());
        }
        Ok(image::imageops::resize(raster, target.width, target.height, self.filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_sources() {
        let zero = SourceImage::new(0, 10, ColorModel::Rgb8, vec![]);
        assert!(zero.degenerate_reason().unwrap().contains("zero"));

        let cmyk = SourceImage::new(1, 1, ColorModel::Cmyk8, vec![0; 4]);
        assert!(cmyk.degenerate_reason().unwrap().contains("Cmyk8"));

        let short = SourceImage::new(2, 2, ColorModel::Rgb8, vec![0; 11]);
        assert!(short.degenerate_reason().is_some());

        let ok = SourceImage::new(2, 2, ColorModel::Gray8, vec![0; 4]);
        assert!(ok.degenerate_reason().is_none());
    }

    #[test]
    fn test_gray_expands_to_rgba() {
        let src = SourceImage::new(1, 1, ColorModel::Gray8, vec![200]);
        let rgba = ImageCrateOps::default().to_rgba(&src).unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_resize_is_exact() {
        let src = RgbaImage::from_pixel(300, 200, image::Rgba([10, 20, 30, 255]));
        let ops = ImageCrateOps {
            filter: FilterType::Nearest,
        };
        let out = ops.resize(&src, Geometry::new(240, 240)).unwrap();
        assert_eq!(out.dimensions(), (240, 240));
        assert_eq!(out.get_pixel(120, 120).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_geometry_from_round_screen() {
        let screen = ScreenInfo {
            shape: wristlink_protocol::ScreenShape::Round,
            width: 454,
            height: 460,
        };
        assert_eq!(Geometry::from(screen), Geometry::new(454, 454));
    }
}
