//! Image header (IHDR): geometry and colour configuration.

use crate::error::{invalid, Result};

/// The five PNG colour types, tagged with their on-wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale,
    Truecolor,
    Indexed,
    GrayscaleAlpha,
    TruecolorAlpha,
}

impl ColorType {
    fn from_wire(value: u8) -> Option<ColorType> {
        match value {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Truecolor),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::TruecolorAlpha),
            _ => None,
        }
    }

    /// Number of samples per pixel for this colour type.
    pub fn channels(self) -> u32 {
        match self {
            ColorType::Grayscale => 1,
            ColorType::Truecolor => 3,
            ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::TruecolorAlpha => 4,
        }
    }

    fn legal_bit_depths(self) -> &'static [u8] {
        match self {
            ColorType::Grayscale => &[1, 2, 4, 8, 16],
            ColorType::Truecolor => &[8, 16],
            ColorType::Indexed => &[1, 2, 4, 8],
            ColorType::GrayscaleAlpha => &[8, 16],
            ColorType::TruecolorAlpha => &[8, 16],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlaceMethod {
    Standard,
    Adam7,
}

#[derive(Debug, Clone, Copy)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlace: InterlaceMethod,
}

impl Ihdr {
    /// Bits per pixel, before byte rounding.
    pub fn bits_per_pixel(&self) -> u32 {
        self.bit_depth as u32 * self.color_type.channels()
    }

    /// Bytes in one reconstructed scanline, not counting the filter byte,
    /// for the given row width (the full image width, or a reduced image's
    /// width for an Adam7 pass).
    pub fn line_stride_for(&self, width: u32) -> usize {
        let bits = self.bit_depth as u64 * self.color_type.channels() as u64 * width as u64;
        ((bits + 7) / 8) as usize
    }

    /// `max(1, bit_depth * channels / 8)`: the neighbour-pixel byte
    /// distance used by the filter engine.
    pub fn pixel_stride(&self) -> usize {
        let bytes = (self.bit_depth as u32 * self.color_type.channels()) / 8;
        bytes.max(1) as usize
    }

    pub fn line_stride(&self) -> usize {
        self.line_stride_for(self.width)
    }
}

/// Decodes and validates the 13-byte IHDR payload.
pub fn decode_ihdr(payload: &[u8]) -> Result<Ihdr> {
    if payload.len() != 13 {
        return Err(invalid(format!(
            "IHDR payload must be 13 bytes, got {}",
            payload.len()
        )));
    }

    let width = u32::from_be_bytes(payload[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(payload[4..8].try_into().unwrap());
    let bit_depth = payload[8];
    let color_type_raw = payload[9];
    let compression_method = payload[10];
    let filter_method = payload[11];
    let interlace_raw = payload[12];

    if width == 0 || height == 0 {
        return Err(invalid("width and height must be non-zero"));
    }

    let color_type =
        ColorType::from_wire(color_type_raw).ok_or_else(|| invalid("invalid color type"))?;

    if !color_type.legal_bit_depths().contains(&bit_depth) {
        return Err(invalid(format!(
            "bit depth {bit_depth} is not legal for color type {color_type_raw}"
        )));
    }

    if compression_method != 0 {
        return Err(invalid("unsupported compression method"));
    }
    if filter_method != 0 {
        return Err(invalid("unsupported filter method"));
    }

    let interlace = match interlace_raw {
        0 => InterlaceMethod::Standard,
        1 => InterlaceMethod::Adam7,
        _ => return Err(invalid("invalid interlace method")),
    };

    Ok(Ihdr {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
    })
}
