//! Native RGB565 pixel conversion.

use bytes::BufMut;
use image::RgbaImage;

use crate::error::{AssetError, Result};

/// Bytes per native pixel.
pub const BYTES_PER_PIXEL: usize = 2;

/// Pack 8-bit channels into RGB565.
#[inline]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Expand RGB565 to 8-bit channels, replicating high bits into the low ones.
#[inline]
pub fn rgb565_to_rgb888(pixel: u16) -> [u8; 3] {
    let r5 = (pixel >> 11) & 0x1F;
    let g6 = (pixel >> 5) & 0x3F;
    let b5 = pixel & 0x1F;
    [
        ((r5 << 3) | (r5 >> 2)) as u8,
        ((g6 << 2) | (g6 >> 4)) as u8,
        ((b5 << 3) | (b5 >> 2)) as u8,
    ]
}

/// Composite one RGBA pixel onto black and pack it.
#[inline]
pub fn rgba_to_rgb565(px: [u8; 4]) -> u16 {
    let [r, g, b, a] = px;
    if a == u8::MAX {
        return rgb888_to_rgb565(r, g, b);
    }
    let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    rgb888_to_rgb565(blend(r), blend(g), blend(b))
}

/// Convert a raster to row-major big-endian RGB565 with no row padding.
pub fn to_raw_pixels(raster: &RgbaImage) -> Result<Vec<u8>> {
    let (w, h) = raster.dimensions();
    let len = (w as usize)
        .checked_mul(h as usize)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| AssetError::RawDataConversion(format!("{}x{} overflows", w, h)))?;
    if raster.as_raw().len() != w as usize * h as usize * 4 {
        return Err(AssetError::RawDataConversion(format!(
            "raster buffer of {} bytes does not match {}x{}",
            raster.as_raw().len(),
            w,
            h
        )));
    }
    let mut out = Vec::with_capacity(len);
    for px in raster.pixels() {
        out.put_u16(rgba_to_rgb565(px.0));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb888_to_rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), 0x001F);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
    }

    #[test]
    fn test_expand_is_full_range() {
        assert_eq!(rgb565_to_rgb888(0xFFFF), [255, 255, 255]);
        assert_eq!(rgb565_to_rgb888(0x0000), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0xF800), [255, 0, 0]);
    }

    #[test]
    fn test_raw_pixels_layout() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 0]));
        let raw = to_raw_pixels(&img).unwrap();
        assert_eq!(raw.len(), 2 * 2 * BYTES_PER_PIXEL);
        assert_eq!(raw, vec![0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F, 0x00, 0x00]);
    }

    #[test]
    fn test_half_alpha_darkens() {
        let px = rgba_to_rgb565([255, 255, 255, 128]);
        let [r, g, b] = rgb565_to_rgb888(px);
        assert!(r > 100 && r < 140, "{}", r);
        assert_eq!(r, b);
        assert!(g > 100 && g < 140, "{}", g);
    }
}
