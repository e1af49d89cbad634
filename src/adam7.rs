//! Adam7 de-interlacer: seven passes, each painting a block of destination
//! pixels per decoded sample so a partially-decoded progressive view still
//! renders sensibly.

use crate::error::{invalid, Result};
use crate::filter::FilterEngine;
use crate::ihdr::Ihdr;
use crate::pixels::PixelBuffer;
use crate::sampling::extract_pixel_channels;

pub const START_X: [u32; 7] = [0, 4, 0, 2, 0, 1, 0];
pub const START_Y: [u32; 7] = [0, 0, 4, 0, 2, 0, 1];
pub const X_STEP: [u32; 7] = [8, 8, 4, 4, 2, 2, 1];
pub const Y_STEP: [u32; 7] = [8, 8, 8, 4, 4, 2, 2];
pub const BLOCK_W: [u32; 7] = [8, 4, 4, 2, 2, 1, 1];
pub const BLOCK_H: [u32; 7] = [8, 8, 4, 4, 2, 2, 1];

/// Sub-image dimensions for one of the seven passes. Either component may
/// be zero, in which case the pass is skipped entirely.
pub fn pass_dimensions(width: u32, height: u32, pass: usize) -> (u32, u32) {
    let w = if width > START_X[pass] {
        (width - START_X[pass] + X_STEP[pass] - 1) / X_STEP[pass]
    } else {
        0
    };
    let h = if height > START_Y[pass] {
        (height - START_Y[pass] + Y_STEP[pass] - 1) / Y_STEP[pass]
    } else {
        0
    };
    (w, h)
}

/// The exact decompressed length an Adam7 IDAT stream must have: the sum
/// over the seven passes of `pass_height * (1 + pass_line_stride)`, skipping
/// passes with zero width or height.
pub fn expected_len(ihdr: &Ihdr) -> usize {
    let mut total = 0usize;
    for pass in 0..7 {
        let (pw, ph) = pass_dimensions(ihdr.width, ihdr.height, pass);
        if pw == 0 || ph == 0 {
            continue;
        }
        let stride = ihdr.line_stride_for(pw);
        total += ph as usize * (1 + stride);
    }
    total
}

/// Unpacks `data` (the full decompressed, Adam7-interlaced stream: the
/// seven passes back to back) into `pixels`.
pub fn unpack_adam7(ihdr: &Ihdr, data: &[u8], pixels: &mut PixelBuffer) -> Result<()> {
    let channels = ihdr.color_type.channels();
    let width = ihdr.width;
    let height = ihdr.height;

    let expected_total = expected_len(ihdr);
    if data.len() != expected_total {
        return Err(invalid(format!(
            "adam7 decompressed length {} does not match expected {expected_total}",
            data.len()
        )));
    }

    let mut offset = 0usize;
    for pass in 0..7 {
        let (pw, ph) = pass_dimensions(width, height, pass);
        if pw == 0 || ph == 0 {
            continue;
        }

        let stride = ihdr.line_stride_for(pw);
        let pass_len = ph as usize * (1 + stride);
        let pass_data = &data[offset..offset + pass_len];
        offset += pass_len;

        // Each pass gets its own filter engine: the "previous row" resets
        // to zero at every pass boundary.
        let mut engine = FilterEngine::new(stride, ihdr.pixel_stride());
        let mut pos = 0usize;

        for py in 0..ph as usize {
            let filter_type = pass_data[pos];
            pos += 1;
            let raw = &pass_data[pos..pos + stride];
            pos += stride;

            let row = engine.invert_row(filter_type, raw)?;

            for px in 0..pw as usize {
                let sample = extract_pixel_channels(row, px, ihdr.bit_depth, channels);

                let dest_x0 = START_X[pass] + px as u32 * X_STEP[pass];
                let dest_y0 = START_Y[pass] + py as u32 * Y_STEP[pass];
                let x_end = (dest_x0 + BLOCK_W[pass]).min(width);
                let y_end = (dest_y0 + BLOCK_H[pass]).min(height);

                for y in dest_y0..y_end {
                    for x in dest_x0..x_end {
                        let dest_index = y as usize * width as usize + x as usize;
                        pixels.write_sample(dest_index, &sample[..channels as usize]);
                    }
                }
            }
        }
    }

    Ok(())
}
