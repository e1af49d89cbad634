//! The orchestrating decoder: drives chunk parsing, IDAT concatenation and
//! inflate, and dispatches to the non-interlaced or Adam7 unpacker.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::{debug, trace, warn};

use crate::adam7::{expected_len as adam7_expected_len, unpack_adam7};
use crate::chunk::{self, read_chunk, read_signature};
use crate::config::DecoderOptions;
use crate::error::{invalid, Result};
use crate::ihdr::{decode_ihdr, ColorType, InterlaceMethod};
use crate::metadata::{decode_bkgd, decode_gama, decode_plte, Background, Gamma, Palette};
use crate::pixels::{allocate, PixelBuffer};
use crate::registry::OrderTracker;
use crate::unpack::{expected_len as unpack_expected_len, unpack_noninterlaced};

/// The decoded image this crate hands back on success: a typed pixel
/// buffer plus the image's basic geometry and whatever optional metadata
/// chunks were present.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: PixelBuffer,
    pub gamma: Option<Gamma>,
    pub background: Option<Background>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Decoder { options }
    }

    /// Decodes one PNG datastream from `reader`, which must be positioned
    /// at the very start (the 8-byte signature).
    pub fn decode<R: Read>(&self, reader: &mut R) -> Result<DecodedImage> {
        read_signature(reader)?;

        let first = read_chunk(reader)?;
        if first.tag != chunk::IHDR {
            return Err(invalid("first chunk must be IHDR"));
        }
        let ihdr = decode_ihdr(&first.payload)?;
        debug!(
            "decoding png {}x{} color_type={:?} bit_depth={} interlace={:?}",
            ihdr.width, ihdr.height, ihdr.color_type, ihdr.bit_depth, ihdr.interlace
        );

        let mut tracker = OrderTracker::default();
        let mut palette: Option<Palette> = None;
        let mut gamma: Option<Gamma> = None;
        let mut background: Option<Background> = None;
        let mut idat_buffer: Vec<u8> = Vec::new();

        loop {
            let raw = read_chunk(reader)?;
            trace!("chunk {}", raw.tag_str());

            if raw.tag == chunk::IEND {
                break;
            }
            if raw.tag != chunk::IDAT {
                tracker.on_non_idat_chunk();
            }

            if raw.tag == chunk::PLTE {
                tracker.on_plte()?;
                // PLTE is a critical chunk; a malformed payload aborts decode.
                palette = Some(decode_plte(&raw.payload, &ihdr)?);
            } else if raw.tag == chunk::IDAT {
                tracker.on_idat()?;
                idat_buffer.extend_from_slice(&raw.payload);
            } else if raw.tag == chunk::GAMA {
                tracker.on_gama()?;
                match decode_gama(&raw.payload) {
                    Ok(g) => gamma = Some(g),
                    Err(e) => warn!("skipping malformed gAMA chunk: {e}"),
                }
            } else if raw.tag == chunk::BKGD {
                tracker.on_bkgd()?;
                match decode_bkgd(&raw.payload, &ihdr) {
                    Ok(b) => background = Some(b),
                    Err(e) => warn!("skipping malformed bKGD chunk: {e}"),
                }
            } else if raw.is_critical() {
                return Err(invalid(format!(
                    "unknown critical chunk {:?}",
                    raw.tag_str()
                )));
            } else {
                trace!("skipping unknown ancillary chunk {:?}", raw.tag_str());
            }
        }

        tracker.require_idat_seen()?;

        if ihdr.color_type == ColorType::Indexed && palette.is_none() {
            return Err(invalid("indexed image is missing a required PLTE chunk"));
        }

        let expected_decompressed_len = match ihdr.interlace {
            InterlaceMethod::Standard => unpack_expected_len(&ihdr),
            InterlaceMethod::Adam7 => adam7_expected_len(&ihdr),
        };
        let decompressed = inflate(&idat_buffer, expected_decompressed_len)?;

        let palette_entries = palette.as_ref().map(|p| p.entries.clone());
        let mut pixels = allocate(&ihdr, palette_entries, self.options.max_pixels)?;

        match ihdr.interlace {
            InterlaceMethod::Standard => unpack_noninterlaced(&ihdr, &decompressed, &mut pixels)?,
            InterlaceMethod::Adam7 => unpack_adam7(&ihdr, &decompressed, &mut pixels)?,
        }

        debug!("decoded {} pixels", pixels.len());

        Ok(DecodedImage {
            width: ihdr.width,
            height: ihdr.height,
            pixels,
            gamma,
            background,
        })
    }
}

/// Decompresses `data` (the concatenated IDAT payloads), bounding the
/// amount read to `expected_len + 1` bytes so a zlib bomb whose declared
/// IHDR geometry is tiny cannot inflate an unbounded amount into memory —
/// the scanline/pass length check the caller runs afterwards rejects
/// anything that doesn't land on exactly `expected_len`.
fn inflate(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    let limit = expected_len as u64 + 1;
    ZlibDecoder::new(data)
        .take(limit)
        .read_to_end(&mut decompressed)
        .map_err(|e| invalid(format!("zlib decompression failed: {e}")))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::chunk_crc;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn encode_chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(payload);
        out.extend_from_slice(&chunk_crc(tag, payload).to_be_bytes());
        out
    }

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn ihdr_payload(width: u32, height: u32, depth: u8, color: u8, interlace: u8) -> Vec<u8> {
        let mut v = Vec::with_capacity(13);
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[depth, color, 0, 0, interlace]);
        v
    }

    fn build_simple_png(ihdr_payload: &[u8], extra: &[Vec<u8>], raw_scanlines: &[u8]) -> Vec<u8> {
        let mut out = chunk::SIGNATURE.to_vec();
        out.extend(encode_chunk(b"IHDR", ihdr_payload));
        for chunk_bytes in extra {
            out.extend_from_slice(chunk_bytes);
        }
        out.extend(encode_chunk(b"IDAT", &zlib_compress(raw_scanlines)));
        out.extend(encode_chunk(b"IEND", &[]));
        out
    }

    #[test]
    fn signature_guard_rejects_all_zero_input() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        let decoder = Decoder::new();
        let result = decoder.decode(&mut cursor);
        assert!(matches!(
            result,
            Err(crate::error::PngError::NotAnImageOfThisFormat)
        ));
    }

    #[test]
    fn minimal_1x1_rgba_truecolor() {
        // Lets a developer running this test with `--nocapture` see this
        // crate's `debug!`/`trace!` decode-path logging; harmless if a
        // global logger is already installed.
        let _ = env_logger::try_init();

        let ihdr = ihdr_payload(1, 1, 8, 6, 0);
        let scanline = [0x00, 0xAA, 0xBB, 0xCC, 0xDD];
        let png = build_simple_png(&ihdr, &[], &scanline);
        let mut cursor = Cursor::new(png);
        let image = Decoder::new().decode(&mut cursor).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        match image.pixels {
            PixelBuffer::Rgba32(v) => assert_eq!(
                v[0],
                crate::pixels::Rgba8 {
                    r: 0xAA,
                    g: 0xBB,
                    b: 0xCC,
                    a: 0xDD
                }
            ),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn two_by_two_grayscale_sub_filter() {
        // row0 filter=none 0x10,0x20; row1 filter=sub 0x05,0x07. Sub only
        // depends on the left neighbour in the same row: R[0]=0x05+0=0x05,
        // R[1]=0x07+R[0]=0x0C.
        let ihdr = ihdr_payload(2, 2, 8, 0, 0);
        let scanlines = [0x00, 0x10, 0x20, 0x01, 0x05, 0x07];
        let png = build_simple_png(&ihdr, &[], &scanlines);
        let mut cursor = Cursor::new(png);
        let image = Decoder::new().decode(&mut cursor).unwrap();
        match image.pixels {
            PixelBuffer::Grayscale8(v) => assert_eq!(v, vec![0x10, 0x20, 0x05, 0x0C]),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_critical_chunk_aborts_decode() {
        let ihdr = ihdr_payload(1, 1, 8, 0, 0);
        let mut out = chunk::SIGNATURE.to_vec();
        out.extend(encode_chunk(b"IHDR", &ihdr));
        out.extend(encode_chunk(b"BLUB", &[1, 2, 3])); // uppercase first byte: critical
        out.extend(encode_chunk(b"IDAT", &zlib_compress(&[0x00, 0x00])));
        out.extend(encode_chunk(b"IEND", &[]));
        let mut cursor = Cursor::new(out);
        assert!(matches!(
            Decoder::new().decode(&mut cursor),
            Err(crate::error::PngError::InvalidData(_))
        ));
    }

    #[test]
    fn unknown_ancillary_chunk_is_skipped() {
        let ihdr = ihdr_payload(1, 1, 8, 0, 0);
        let mut out = chunk::SIGNATURE.to_vec();
        out.extend(encode_chunk(b"IHDR", &ihdr));
        out.extend(encode_chunk(b"bLUB", &[1, 2, 3])); // lowercase first byte: ancillary
        out.extend(encode_chunk(b"IDAT", &zlib_compress(&[0x00, 0x00])));
        out.extend(encode_chunk(b"IEND", &[]));
        let mut cursor = Cursor::new(out);
        assert!(Decoder::new().decode(&mut cursor).is_ok());
    }

    #[test]
    fn adam7_8x8_grayscale_solid_value() {
        let ihdr = ihdr_payload(8, 8, 8, 0, 1); // adam7 interlace
        let mut data = Vec::new();
        for pass in 0..7 {
            let (pw, ph) = crate::adam7::pass_dimensions(8, 8, pass);
            if pw == 0 || ph == 0 {
                continue;
            }
            for _ in 0..ph {
                data.push(0);
                data.extend(std::iter::repeat(0x42u8).take(pw as usize));
            }
        }
        let png = build_simple_png(&ihdr, &[], &data);
        let mut cursor = Cursor::new(png);
        let image = Decoder::new().decode(&mut cursor).unwrap();
        match image.pixels {
            PixelBuffer::Grayscale8(v) => {
                assert_eq!(v.len(), 64);
                assert!(v.iter().all(|&b| b == 0x42));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn truncated_idat_is_rejected() {
        let ihdr = ihdr_payload(2, 2, 8, 0, 0);
        let scanlines = [0x00, 0x10, 0x20, 0x01, 0x05, 0x07];
        let compressed = zlib_compress(&scanlines);
        let mut out = chunk::SIGNATURE.to_vec();
        out.extend(encode_chunk(b"IHDR", &ihdr));
        out.extend(encode_chunk(b"IDAT", &compressed[..compressed.len() - 1]));
        out.extend(encode_chunk(b"IEND", &[]));
        let mut cursor = Cursor::new(out);
        assert!(matches!(
            Decoder::new().decode(&mut cursor),
            Err(crate::error::PngError::InvalidData(_))
        ));
    }

    #[test]
    fn max_pixels_rejects_oversized_image() {
        let ihdr = ihdr_payload(1000, 1000, 8, 0, 0);
        let png = build_simple_png(&ihdr, &[], &[]);
        let mut cursor = Cursor::new(png);
        let decoder = Decoder::with_options(DecoderOptions::new().with_max_pixels(10));
        assert!(matches!(
            decoder.decode(&mut cursor),
            Err(crate::error::PngError::OutOfMemory)
        ));
    }

    #[test]
    fn oversized_decompressed_stream_is_rejected_without_unbounded_inflate() {
        // Declared geometry is tiny (1x1 grayscale8, expected decompressed
        // length 2 bytes) but the IDAT's zlib stream inflates to far more
        // than that — a zip-bomb shape independent of `max_pixels`, since
        // `max_pixels` only bounds the *declared* pixel count. `inflate`
        // must stop reading once it has well more than `expected_len`
        // bytes rather than buffering the whole bomb before the length
        // check in `unpack_noninterlaced` ever runs.
        let ihdr = ihdr_payload(1, 1, 8, 0, 0);
        let bomb = vec![0u8; 1_000_000];
        let png = build_simple_png(&ihdr, &[], &bomb);
        let mut cursor = Cursor::new(png);
        assert!(matches!(
            Decoder::new().decode(&mut cursor),
            Err(crate::error::PngError::InvalidData(_))
        ));
    }

    #[test]
    fn decoding_twice_yields_identical_pixels() {
        let ihdr = ihdr_payload(1, 1, 8, 6, 0);
        let scanline = [0x00, 0xAA, 0xBB, 0xCC, 0xDD];
        let png = build_simple_png(&ihdr, &[], &scanline);

        let decode_once = || {
            let mut cursor = Cursor::new(png.clone());
            let image = Decoder::new().decode(&mut cursor).unwrap();
            match image.pixels {
                PixelBuffer::Rgba32(v) => v,
                _ => panic!("wrong variant"),
            }
        };
        assert_eq!(decode_once(), decode_once());
    }

    #[test]
    fn indexed_image_without_palette_is_rejected() {
        let ihdr = ihdr_payload(1, 1, 8, 3, 0);
        let png = build_simple_png(&ihdr, &[], &[0x00, 0x00]);
        let mut cursor = Cursor::new(png);
        assert!(Decoder::new().decode(&mut cursor).is_err());
    }
}
