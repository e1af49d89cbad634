//! The pixel store: a tagged variant buffer, one variant per
//! (colour-type, bit-depth) combination, always `width * height` long.

use crate::error::{unsupported, PngError, Result};
use crate::ihdr::{ColorType, Ihdr};
use crate::metadata::RgbaEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba16 {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrayAlpha8 {
    pub y: u8,
    pub a: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrayAlpha16 {
    pub y: u16,
    pub a: u16,
}

/// One variant per (colour type, bit depth) pair this decoder supports.
/// Every variant's backing `Vec` has exactly `width * height` entries.
pub enum PixelBuffer {
    Grayscale1(Vec<u8>),
    Grayscale2(Vec<u8>),
    Grayscale4(Vec<u8>),
    Grayscale8(Vec<u8>),
    Grayscale16(Vec<u16>),
    GrayscaleAlpha8(Vec<GrayAlpha8>),
    GrayscaleAlpha16(Vec<GrayAlpha16>),
    Rgb24(Vec<Rgb8>),
    Rgb48(Vec<Rgb16>),
    Rgba32(Vec<Rgba8>),
    Rgba64(Vec<Rgba16>),
    Indexed1 { indices: Vec<u8>, palette: Vec<RgbaEntry> },
    Indexed2 { indices: Vec<u8>, palette: Vec<RgbaEntry> },
    Indexed4 { indices: Vec<u8>, palette: Vec<RgbaEntry> },
    Indexed8 { indices: Vec<u8>, palette: Vec<RgbaEntry> },
}

impl PixelBuffer {
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::Grayscale1(v)
            | PixelBuffer::Grayscale2(v)
            | PixelBuffer::Grayscale4(v)
            | PixelBuffer::Grayscale8(v) => v.len(),
            PixelBuffer::Grayscale16(v) => v.len(),
            PixelBuffer::GrayscaleAlpha8(v) => v.len(),
            PixelBuffer::GrayscaleAlpha16(v) => v.len(),
            PixelBuffer::Rgb24(v) => v.len(),
            PixelBuffer::Rgb48(v) => v.len(),
            PixelBuffer::Rgba32(v) => v.len(),
            PixelBuffer::Rgba64(v) => v.len(),
            PixelBuffer::Indexed1 { indices, .. }
            | PixelBuffer::Indexed2 { indices, .. }
            | PixelBuffer::Indexed4 { indices, .. }
            | PixelBuffer::Indexed8 { indices, .. } => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes one decoded sample (raw channel values, in colour-type
    /// channel order) to the pixel at flat index `pixel_index`.
    ///
    /// `channels` holds one value per channel of the image's colour type,
    /// widened to `u16` regardless of bit depth (for indexed images, the
    /// single "channel" is the palette index).
    pub fn write_sample(&mut self, pixel_index: usize, channels: &[u16]) {
        match self {
            PixelBuffer::Grayscale1(v)
            | PixelBuffer::Grayscale2(v)
            | PixelBuffer::Grayscale4(v)
            | PixelBuffer::Grayscale8(v) => v[pixel_index] = channels[0] as u8,
            PixelBuffer::Grayscale16(v) => v[pixel_index] = channels[0],
            PixelBuffer::GrayscaleAlpha8(v) => {
                v[pixel_index] = GrayAlpha8 {
                    y: channels[0] as u8,
                    a: channels[1] as u8,
                }
            }
            PixelBuffer::GrayscaleAlpha16(v) => {
                v[pixel_index] = GrayAlpha16 {
                    y: channels[0],
                    a: channels[1],
                }
            }
            PixelBuffer::Rgb24(v) => {
                v[pixel_index] = Rgb8 {
                    r: channels[0] as u8,
                    g: channels[1] as u8,
                    b: channels[2] as u8,
                }
            }
            PixelBuffer::Rgb48(v) => {
                v[pixel_index] = Rgb16 {
                    r: channels[0],
                    g: channels[1],
                    b: channels[2],
                }
            }
            PixelBuffer::Rgba32(v) => {
                v[pixel_index] = Rgba8 {
                    r: channels[0] as u8,
                    g: channels[1] as u8,
                    b: channels[2] as u8,
                    a: channels[3] as u8,
                }
            }
            PixelBuffer::Rgba64(v) => {
                v[pixel_index] = Rgba16 {
                    r: channels[0],
                    g: channels[1],
                    b: channels[2],
                    a: channels[3],
                }
            }
            PixelBuffer::Indexed1 { indices, .. }
            | PixelBuffer::Indexed2 { indices, .. }
            | PixelBuffer::Indexed4 { indices, .. }
            | PixelBuffer::Indexed8 { indices, .. } => indices[pixel_index] = channels[0] as u8,
        }
    }
}

/// Allocates the pixel store for `ihdr`, rejecting images whose pixel count
/// would exceed `max_pixels` before the allocation is attempted.
pub fn allocate(ihdr: &Ihdr, palette: Option<Vec<RgbaEntry>>, max_pixels: Option<u64>) -> Result<PixelBuffer> {
    let pixel_count = ihdr.width as u64 * ihdr.height as u64;
    if let Some(limit) = max_pixels {
        if pixel_count > limit {
            return Err(PngError::OutOfMemory);
        }
    }
    let count: usize = pixel_count
        .try_into()
        .map_err(|_| PngError::OutOfMemory)?;

    let buffer = match (ihdr.color_type, ihdr.bit_depth) {
        (ColorType::Grayscale, 1) => PixelBuffer::Grayscale1(vec![0u8; count]),
        (ColorType::Grayscale, 2) => PixelBuffer::Grayscale2(vec![0u8; count]),
        (ColorType::Grayscale, 4) => PixelBuffer::Grayscale4(vec![0u8; count]),
        (ColorType::Grayscale, 8) => PixelBuffer::Grayscale8(vec![0u8; count]),
        (ColorType::Grayscale, 16) => PixelBuffer::Grayscale16(vec![0u16; count]),
        (ColorType::GrayscaleAlpha, 8) => PixelBuffer::GrayscaleAlpha8(vec![GrayAlpha8::default(); count]),
        (ColorType::GrayscaleAlpha, 16) => {
            PixelBuffer::GrayscaleAlpha16(vec![GrayAlpha16::default(); count])
        }
        (ColorType::Truecolor, 8) => PixelBuffer::Rgb24(vec![Rgb8::default(); count]),
        (ColorType::Truecolor, 16) => PixelBuffer::Rgb48(vec![Rgb16::default(); count]),
        (ColorType::TruecolorAlpha, 8) => PixelBuffer::Rgba32(vec![Rgba8::default(); count]),
        (ColorType::TruecolorAlpha, 16) => PixelBuffer::Rgba64(vec![Rgba16::default(); count]),
        (ColorType::Indexed, depth @ (1 | 2 | 4 | 8)) => {
            let palette = palette.ok_or_else(|| crate::error::invalid("indexed image has no PLTE"))?;
            let indices = vec![0u8; count];
            match depth {
                1 => PixelBuffer::Indexed1 { indices, palette },
                2 => PixelBuffer::Indexed2 { indices, palette },
                4 => PixelBuffer::Indexed4 { indices, palette },
                8 => PixelBuffer::Indexed8 { indices, palette },
                _ => unreachable!(),
            }
        }
        (color_type, depth) => {
            return Err(unsupported(format!(
                "no pixel destination for color type {color_type:?} at bit depth {depth}"
            )))
        }
    };

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ihdr::InterlaceMethod;

    fn ihdr(width: u32, height: u32, depth: u8, color_type: ColorType) -> Ihdr {
        Ihdr {
            width,
            height,
            bit_depth: depth,
            color_type,
            interlace: InterlaceMethod::Standard,
        }
    }

    #[test]
    fn allocates_rgba32_with_correct_length() {
        let h = ihdr(3, 2, 8, ColorType::TruecolorAlpha);
        let buf = allocate(&h, None, None).unwrap();
        assert_eq!(buf.len(), 6);
        assert!(matches!(buf, PixelBuffer::Rgba32(_)));
    }

    #[test]
    fn rejects_oversized_image_before_allocating() {
        let h = ihdr(100_000, 100_000, 8, ColorType::Grayscale);
        let result = allocate(&h, None, Some(1_000));
        assert!(matches!(result, Err(PngError::OutOfMemory)));
    }

    #[test]
    fn indexed_requires_palette() {
        let h = ihdr(1, 1, 8, ColorType::Indexed);
        assert!(allocate(&h, None, None).is_err());
    }

    #[test]
    fn write_sample_for_1x1_rgba() {
        let h = ihdr(1, 1, 8, ColorType::TruecolorAlpha);
        let mut buf = allocate(&h, None, None).unwrap();
        buf.write_sample(0, &[0xAA, 0xBB, 0xCC, 0xDD]);
        match buf {
            PixelBuffer::Rgba32(v) => assert_eq!(
                v[0],
                Rgba8 {
                    r: 0xAA,
                    g: 0xBB,
                    b: 0xCC,
                    a: 0xDD
                }
            ),
            _ => panic!("wrong variant"),
        }
    }
}
