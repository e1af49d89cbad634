//! Non-interlaced scanline unpacker: walks filtered scanlines one row at a
//! time and emits `width` typed pixels per row into the pixel store.

use crate::error::{invalid, Result};
use crate::filter::FilterEngine;
use crate::ihdr::Ihdr;
use crate::pixels::PixelBuffer;
use crate::sampling::extract_pixel_channels;

/// The exact decompressed length a non-interlaced IDAT stream must have:
/// one filter byte plus `line_stride` bytes per scanline.
pub fn expected_len(ihdr: &Ihdr) -> usize {
    ihdr.height as usize * (1 + ihdr.line_stride())
}

/// Unpacks `data` (the full decompressed, non-interlaced scanline stream)
/// into `pixels`. `data` must be exactly `height * (1 + line_stride)` bytes.
pub fn unpack_noninterlaced(ihdr: &Ihdr, data: &[u8], pixels: &mut PixelBuffer) -> Result<()> {
    let line_stride = ihdr.line_stride();
    let expected_len = expected_len(ihdr);
    if data.len() != expected_len {
        return Err(invalid(format!(
            "decompressed length {} does not match expected {expected_len}",
            data.len()
        )));
    }

    let mut engine = FilterEngine::new(line_stride, ihdr.pixel_stride());
    let channels = ihdr.color_type.channels();
    let width = ihdr.width as usize;

    let mut offset = 0usize;
    for y in 0..ihdr.height as usize {
        let filter_type = data[offset];
        offset += 1;
        let raw = &data[offset..offset + line_stride];
        offset += line_stride;

        let row = engine.invert_row(filter_type, raw)?;

        for x in 0..width {
            let sample = extract_pixel_channels(row, x, ihdr.bit_depth, channels);
            pixels.write_sample(y * width + x, &sample[..channels as usize]);
        }
    }

    Ok(())
}
