//! The PNG filter engine: inverts the five per-scanline predictive filters.
//!
//! Keeps exactly two scanlines of memory, addressed modulo `2 * line_stride`
//! so that advancing to the next row never copies bytes between the two
//! halves of the buffer — the "previous" and "current" row simply swap
//! which half of the buffer they point into.

use crate::error::{invalid, Result};

pub struct FilterEngine {
    buffer: Vec<u8>,
    line_stride: usize,
    pixel_stride: usize,
    row_index: u64,
}

impl FilterEngine {
    pub fn new(line_stride: usize, pixel_stride: usize) -> Self {
        FilterEngine {
            buffer: vec![0u8; 2 * line_stride],
            line_stride,
            pixel_stride: pixel_stride.max(1),
            row_index: 0,
        }
    }

    fn current_offset(&self) -> usize {
        (self.row_index % 2) as usize * self.line_stride
    }

    fn previous_offset(&self) -> usize {
        ((self.row_index + 1) % 2) as usize * self.line_stride
    }

    /// Inverts one filtered scanline (`filter_type` + `raw` bytes of length
    /// `line_stride`) and returns the reconstructed row.
    pub fn invert_row(&mut self, filter_type: u8, raw: &[u8]) -> Result<&[u8]> {
        if raw.len() != self.line_stride {
            return Err(invalid(format!(
                "scanline has {} bytes, expected {}",
                raw.len(),
                self.line_stride
            )));
        }
        if filter_type > 4 {
            return Err(invalid(format!("filter type {filter_type} is not 0..4")));
        }

        let ps = self.pixel_stride;
        let cur_off = self.current_offset();
        let prev_off = self.previous_offset();
        let has_previous_row = self.row_index > 0;

        for i in 0..self.line_stride {
            let x = raw[i] as i32;
            let a = if i >= ps {
                self.buffer[cur_off + i - ps] as i32
            } else {
                0
            };
            let b = if has_previous_row {
                self.buffer[prev_off + i] as i32
            } else {
                0
            };
            let c = if has_previous_row && i >= ps {
                self.buffer[prev_off + i - ps] as i32
            } else {
                0
            };

            let reconstructed = match filter_type {
                0 => x,
                1 => x + a,
                2 => x + b,
                3 => x + (a + b) / 2,
                4 => x + paeth_predictor(a, b, c),
                _ => unreachable!("validated above"),
            };
            self.buffer[cur_off + i] = (reconstructed & 0xFF) as u8;
        }

        self.row_index += 1;
        Ok(&self.buffer[cur_off..cur_off + self.line_stride])
    }
}

/// The Paeth predictor, widened to signed arithmetic before subtracting so
/// that `a + b - c` never wraps the way it would in byte-modular math.
pub fn paeth_predictor(a: i32, b: i32, c: i32) -> i32 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
