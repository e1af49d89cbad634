//! PLTE / bKGD / gAMA: the metadata chunks this decoder recognizes.

use crate::error::{invalid, Result};
use crate::ihdr::{ColorType, Ihdr};

/// One palette entry, stored with alpha padded to opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbaEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub entries: Vec<RgbaEntry>,
}

/// Decodes a PLTE payload: 1..256 RGB triples, never more than
/// `2^bit_depth` for indexed images.
pub fn decode_plte(payload: &[u8], ihdr: &Ihdr) -> Result<Palette> {
    if payload.is_empty() || payload.len() % 3 != 0 {
        return Err(invalid("PLTE payload length must be a positive multiple of 3"));
    }
    let count = payload.len() / 3;
    if count > 256 {
        return Err(invalid("PLTE has more than 256 entries"));
    }
    if ihdr.color_type == ColorType::Indexed {
        let max = 1usize << ihdr.bit_depth;
        if count > max {
            return Err(invalid(format!(
                "PLTE has {count} entries, more than 2^{} allowed for this bit depth",
                ihdr.bit_depth
            )));
        }
    }

    let entries = payload
        .chunks_exact(3)
        .map(|c| RgbaEntry {
            r: c[0],
            g: c[1],
            b: c[2],
            a: 255,
        })
        .collect();

    Ok(Palette { entries })
}

/// bKGD is a discriminated union keyed by the image's colour type.
#[derive(Debug, Clone, Copy)]
pub enum Background {
    Grayscale(u16),
    Indexed(u8),
    Truecolor { r: u16, g: u16, b: u16 },
}

pub fn decode_bkgd(payload: &[u8], ihdr: &Ihdr) -> Result<Background> {
    match ihdr.color_type {
        ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            if payload.len() != 2 {
                return Err(invalid("bKGD payload must be 2 bytes for grayscale images"));
            }
            Ok(Background::Grayscale(u16::from_be_bytes([
                payload[0], payload[1],
            ])))
        }
        ColorType::Indexed => {
            if payload.len() != 1 {
                return Err(invalid("bKGD payload must be 1 byte for indexed images"));
            }
            Ok(Background::Indexed(payload[0]))
        }
        ColorType::Truecolor | ColorType::TruecolorAlpha => {
            if payload.len() != 6 {
                return Err(invalid("bKGD payload must be 6 bytes for truecolor images"));
            }
            Ok(Background::Truecolor {
                r: u16::from_be_bytes([payload[0], payload[1]]),
                g: u16::from_be_bytes([payload[2], payload[3]]),
                b: u16::from_be_bytes([payload[4], payload[5]]),
            })
        }
    }
}

/// gAMA is a single 32-bit fixed-point value; divide by 100000 for the
/// exposed gamma exponent.
#[derive(Debug, Clone, Copy)]
pub struct Gamma {
    pub raw: u32,
}

impl Gamma {
    pub fn exponent(self) -> f64 {
        self.raw as f64 / 100_000.0
    }
}

pub fn decode_gama(payload: &[u8]) -> Result<Gamma> {
    if payload.len() != 4 {
        return Err(invalid("gAMA payload must be 4 bytes"));
    }
    Ok(Gamma {
        raw: u32::from_be_bytes(payload.try_into().unwrap()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ihdr::InterlaceMethod;

    fn ihdr_with(color_type: ColorType, bit_depth: u8) -> Ihdr {
        Ihdr {
            width: 1,
            height: 1,
            bit_depth,
            color_type,
            interlace: InterlaceMethod::Standard,
        }
    }

    #[test]
    fn plte_pads_alpha_to_opaque() {
        let payload = [1, 2, 3, 4, 5, 6];
        let ihdr = ihdr_with(ColorType::Truecolor, 8);
        let palette = decode_plte(&payload, &ihdr).unwrap();
        assert_eq!(palette.entries.len(), 2);
        assert_eq!(palette.entries[0], RgbaEntry { r: 1, g: 2, b: 3, a: 255 });
    }

    #[test]
    fn plte_accepts_exactly_2_pow_bit_depth_entries() {
        let ihdr = ihdr_with(ColorType::Indexed, 2); // 2^2 = 4 entries max
        let payload = vec![0u8; 4 * 3];
        assert!(decode_plte(&payload, &ihdr).is_ok());
    }

    #[test]
    fn plte_rejects_one_more_than_2_pow_bit_depth() {
        let ihdr = ihdr_with(ColorType::Indexed, 2);
        let payload = vec![0u8; 5 * 3];
        assert!(decode_plte(&payload, &ihdr).is_err());
    }

    #[test]
    fn bkgd_branches_on_color_type() {
        let ihdr = ihdr_with(ColorType::Indexed, 8);
        match decode_bkgd(&[7], &ihdr).unwrap() {
            Background::Indexed(idx) => assert_eq!(idx, 7),
            _ => panic!("wrong variant"),
        }

        let ihdr = ihdr_with(ColorType::TruecolorAlpha, 8);
        match decode_bkgd(&[0, 1, 0, 2, 0, 3], &ihdr).unwrap() {
            Background::Truecolor { r, g, b } => assert_eq!((r, g, b), (1, 2, 3)),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn gama_exposes_divided_exponent() {
        let gamma = decode_gama(&45455u32.to_be_bytes()).unwrap();
        assert!((gamma.exponent() - 0.45455).abs() < 1e-9);
    }
}
