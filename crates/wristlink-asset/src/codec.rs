//! Budgeted asset preparation.

use bytes::Bytes;
use image::RgbaImage;
use log::{debug, info, warn};
use wristlink_metrics::metric_defs;

use crate::config::CodecConfig;
use crate::container::{AssetFormat, LossyEncoder, Rgb565RleEncoder};
use crate::error::{AssetError, Result};
use crate::pixels::to_raw_pixels;
use crate::raster::{Geometry, ImageCrateOps, ImageOps, SourceImage};

/// Bytes ready for the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    pub bytes: Bytes,
    /// Declared total length; equals `bytes.len()`.
    pub total_len: usize,
    pub format: AssetFormat,
}

impl EncodedAsset {
    pub fn new(bytes: impl Into<Bytes>, format: AssetFormat) -> Self {
        let bytes = bytes.into();
        EncodedAsset {
            total_len: bytes.len(),
            bytes,
            format,
        }
    }

    /// Bare RGB565 pixels.
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, AssetFormat::RawPixels)
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }
}

/// Outcome of [`AssetCodec::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub reason: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Validation {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: String) -> Self {
        Validation {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Resize, convert and compress images for the watch.
pub struct AssetCodec {
    config: CodecConfig,
    ops: Box<dyn ImageOps>,
    encoder: Box<dyn LossyEncoder>,
}

impl Default for AssetCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl AssetCodec {
    /// Codec using the `image` crate and the built-in `WFC1` encoder.
    pub fn new(config: CodecConfig) -> Self {
        Self::with_parts(config, Box::new(ImageCrateOps::default()), Box::new(Rgb565RleEncoder))
    }

    /// Codec with injected image operations and encoder.
    pub fn with_parts(
        config: CodecConfig,
        ops: Box<dyn ImageOps>,
        encoder: Box<dyn LossyEncoder>,
    ) -> Self {
        AssetCodec {
            config,
            ops,
            encoder,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Check a source without touching it.
    pub fn validate(&self, image: &SourceImage) -> Validation {
        if let Some(reason) = image.degenerate_reason() {
            return Validation::reject(reason);
        }
        let (min, max) = (self.config.min_dimension, self.config.max_dimension);
        for (side, value) in [("width", image.width), ("height", image.height)] {
            if value < min {
                return Validation::reject(format!("{} {} below minimum {}", side, value, min));
            }
            if value > max {
                return Validation::reject(format!("{} {} above maximum {}", side, value, max));
            }
        }
        Validation::ok()
    }

    /// [`validate`](Self::validate) plus an aspect-ratio check against the
    /// target screen.
    pub fn validate_for(&self, image: &SourceImage, target: Geometry) -> Validation {
        let base = self.validate(image);
        if !base.valid {
            return base;
        }
        if target.width == 0 || target.height == 0 {
            return Validation::reject(format!("target geometry {} is empty", target));
        }
        let source = image.width as f64 / image.height as f64;
        let deviation = (source - target.aspect()).abs() / target.aspect();
        if deviation > self.config.aspect_tolerance {
            return Validation::reject(format!(
                "aspect {:.3} differs from target {:.3} by {:.0}%",
                source,
                target.aspect(),
                deviation * 100.0
            ));
        }
        Validation::ok()
    }

    /// Scale a source to exactly `target`.
    pub fn resize(&self, source: &SourceImage, target: Geometry) -> Result<RgbaImage> {
        if let Some(reason) = source.degenerate_reason() {
            return Err(AssetError::InvalidImage(reason));
        }
        let rgba = self.ops.to_rgba(source)?;
        let out = self.ops.resize(&rgba, target)?;
        if out.dimensions() != (target.width, target.height) {
            return Err(AssetError::ImageProcess(format!(
                "resize produced {}x{}, wanted {}",
                out.width(),
                out.height(),
                target
            )));
        }
        Ok(out)
    }

    /// Native RGB565 bytes of a raster.
    pub fn to_raw_pixels(&self, raster: &RgbaImage) -> Result<Vec<u8>> {
        to_raw_pixels(raster)
    }

    /// Encode with decreasing quality until the output fits `max_bytes`.
    ///
    /// The raster is resized first if it is not already `target`. Fails with
    /// [`AssetError::ExceedMaxFileSize`] when the quality floor was tried and
    /// was still too large, or [`AssetError::ExceedMaxAttempts`] when the
    /// attempts ran out first.
    pub fn compress_to_budget(
        &self,
        raster: &RgbaImage,
        target: Geometry,
        max_bytes: usize,
        max_attempts: u32,
    ) -> Result<EncodedAsset> {
        let resized;
        let raster = if raster.dimensions() == (target.width, target.height) {
            raster
        } else {
            resized = self.ops.resize(raster, target)?;
            &resized
        };

        let ladder = CodecConfig {
            max_attempts,
            ..self.config.clone()
        }
        .quality_ladder();
        let floor = self.config.min_quality.max(1);

        let mut smallest = usize::MAX;
        for (attempt, &quality) in ladder.iter().enumerate() {
            metrics::counter!(metric_defs::COMPRESSION_ATTEMPTS.name).increment(1);
            let out = self.encoder.encode(raster, quality).map_err(|e| match e {
                AssetError::Compression(_) => e,
                other => AssetError::Compression(other.to_string()),
            })?;
            debug!(
                "Compression attempt {} at quality {}: {} bytes (budget {})",
                attempt + 1,
                quality,
                out.len(),
                max_bytes
            );
            if out.len() <= max_bytes {
                metrics::histogram!(metric_defs::ENCODED_SIZE.name).record(out.len() as f64);
                info!("Encoded {} asset: {} bytes at quality {}", target, out.len(), quality);
                return Ok(EncodedAsset::new(out, self.encoder.format()));
            }
            smallest = smallest.min(out.len());
        }

        if ladder.last() == Some(&floor) {
            warn!("Lowest quality still {} bytes over a {} byte budget", smallest, max_bytes);
            Err(AssetError::ExceedMaxFileSize {
                max_bytes,
                smallest,
            })
        } else {
            warn!("Gave up after {} compression attempts", ladder.len());
            Err(AssetError::ExceedMaxAttempts {
                attempts: ladder.len() as u32,
                max_bytes,
                smallest,
            })
        }
    }

    /// Validate, resize and compress a watch face with the configured budget.
    pub fn encode_watch_face(&self, source: &SourceImage, target: Geometry) -> Result<EncodedAsset> {
        let check = self.validate(source);
        if !check.valid {
            return Err(AssetError::InvalidImage(check.reason.unwrap_or_default()));
        }
        let raster = self.resize(source, target)?;
        self.compress_to_budget(
            &raster,
            target,
            self.config.max_bytes,
            self.config.max_attempts,
        )
    }

    /// Validate, resize and convert to bare RGB565.
    pub fn encode_raw(&self, source: &SourceImage, target: Geometry) -> Result<EncodedAsset> {
        let check = self.validate(source);
        if !check.valid {
            return Err(AssetError::InvalidImage(check.reason.unwrap_or_default()));
        }
        let raster = self.resize(source, target)?;
        Ok(EncodedAsset::raw(self.to_raw_pixels(&raster)?))
    }
}

impl std::fmt::Debug for AssetCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCodec")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
