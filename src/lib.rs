//! PNG decoder core: chunk-stream parsing, filter inversion, Adam7
//! de-interlacing, and pixel unpacking into a typed pixel store.
//!
//! This crate does not perform colour management, gamma application, or
//! alpha premultiplication, and does not write PNGs — it only decodes the
//! chunks and pixel formats listed in [`ihdr::ColorType`] and
//! [`pixels::PixelBuffer`].

mod adam7;
mod chunk;
mod config;
mod crc;
mod decoder;
mod error;
mod filter;
mod ihdr;
mod metadata;
mod pixels;
mod registry;
mod sampling;
mod unpack;

pub use config::DecoderOptions;
pub use decoder::{DecodedImage, Decoder};
pub use error::{PngError, Result};
pub use ihdr::{ColorType, InterlaceMethod};
pub use metadata::{Background, Gamma, Palette, RgbaEntry};
pub use pixels::{GrayAlpha16, GrayAlpha8, PixelBuffer, Rgb16, Rgb8, Rgba16, Rgba8};
