//! `WFC1` watch-face container and the lossy encoder seam.
//!
//! ```text
//! +--------+---------+----------+---------+----------+-----------------------+
//! | "WFC1" | width   | height   | quality | reserved | runs: (run:u8 px:u16)* |
//! | 4      | u16 BE  | u16 BE   | u8      | u8       | 3 bytes each           |
//! +--------+---------+----------+---------+----------+-----------------------+
//! ```
//!
//! Quality controls how many low bits of each colour channel are cleared
//! before run-length coding, which lengthens runs at the cost of banding.

use bytes::BufMut;
use image::RgbaImage;
use wristlink_protocol::PayloadReader;

use crate::error::{AssetError, Result};
use crate::pixels::rgba_to_rgb565;

/// Container magic.
pub const CONTAINER_MAGIC: &[u8; 4] = b"WFC1";
/// Magic plus fixed header fields.
pub const CONTAINER_HEADER_LEN: usize = 10;
/// Bytes per run record.
pub const RUN_LEN: usize = 3;

/// What the bytes of an encoded asset are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFormat {
    /// Bare RGB565, row-major.
    RawPixels,
    /// A `WFC1` container.
    Container,
}

/// Lossy image encoder driven by the compression loop.
pub trait LossyEncoder: Send + Sync {
    /// Encode at `quality` (1-100, higher is larger and better).
    fn encode(&self, raster: &RgbaImage, quality: u8) -> Result<Vec<u8>>;

    fn format(&self) -> AssetFormat {
        AssetFormat::Container
    }
}

/// Low bits cleared per channel for a quality value.
pub fn dropped_bits(quality: u8) -> u8 {
    ((100 - quality.min(100)) / 20).min(4)
}

fn quantize(pixel: u16, bits: u8) -> u16 {
    if bits == 0 {
        return pixel;
    }
    let low = (1u16 << bits) - 1;
    // Same bit count off each of the R, G and B fields.
    let mask = !((low << 11) | (low << 5) | low);
    pixel & mask
}

/// Parsed fixed header of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub width: u16,
    pub height: u16,
    pub quality: u8,
}

/// The built-in RGB565 run-length encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rgb565RleEncoder;

impl LossyEncoder for Rgb565RleEncoder {
    fn encode(&self, raster: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
        let (w, h) = raster.dimensions();
        let (width, height) = match (u16::try_from(w), u16::try_from(h)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => {
                return Err(AssetError::Compression(format!(
                    "{}x{} does not fit the container header",
                    w, h
                )))
            }
        };
        let bits = dropped_bits(quality);

        let mut out = Vec::with_capacity(CONTAINER_HEADER_LEN + raster.len() / 4);
        out.put_slice(CONTAINER_MAGIC);
        out.put_u16(width);
        out.put_u16(height);
        out.put_u8(quality);
        out.put_u8(0);

        let mut run: Option<(u16, u8)> = None;
        for px in raster.pixels() {
            let value = quantize(rgba_to_rgb565(px.0), bits);
            run = match run {
                Some((current, n)) if current == value && n < u8::MAX => Some((current, n + 1)),
                Some((current, n)) => {
                    out.put_u8(n);
                    out.put_u16(current);
                    Some((value, 1))
                }
                None => Some((value, 1)),
            };
        }
        if let Some((current, n)) = run {
            out.put_u8(n);
            out.put_u16(current);
        }
        Ok(out)
    }
}

/// Parse a container back into its header and RGB565 pixels.
pub fn decode_container(bytes: &[u8]) -> Result<(ContainerHeader, Vec<u16>)> {
    let invalid = |e: wristlink_protocol::ProtocolError| AssetError::InvalidContainer(e.to_string());
    let mut r = PayloadReader::new(bytes);
    if r.bytes(CONTAINER_MAGIC.len()).map_err(invalid)? != CONTAINER_MAGIC {
        return Err(AssetError::InvalidContainer("bad magic".to_string()));
    }
    let width = r.u16().map_err(invalid)?;
    let height = r.u16().map_err(invalid)?;
    let quality = r.u8().map_err(invalid)?;
    let _reserved = r.u8().map_err(invalid)?;

    let expected = width as usize * height as usize;
    if r.remaining() % RUN_LEN != 0 {
        return Err(AssetError::InvalidContainer(format!(
            "{} trailing bytes are not whole runs",
            r.remaining()
        )));
    }
    let mut pixels = Vec::with_capacity(expected);
    while r.remaining() > 0 {
        let n = r.u8().map_err(invalid)?;
        let px = r.u16().map_err(invalid)?;
        if n == 0 {
            return Err(AssetError::InvalidContainer("zero-length run".to_string()));
        }
        pixels.extend(std::iter::repeat(px).take(n as usize));
        if pixels.len() > expected {
            break;
        }
    }
    if pixels.len() != expected {
        return Err(AssetError::InvalidContainer(format!(
            "runs cover {} pixels, header says {}",
            pixels.len(),
            expected
        )));
    }
    Ok((
        ContainerHeader {
            width,
            height,
            quality,
        },
        pixels,
    ))
}
