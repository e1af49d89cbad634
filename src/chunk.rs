//! Chunk framing: reads one length-tagged, CRC-protected record at a time.

use std::io::Read;

use crate::crc::chunk_crc;
use crate::error::{invalid, Result};

pub const IHDR: u32 = u32::from_be_bytes(*b"IHDR");
pub const PLTE: u32 = u32::from_be_bytes(*b"PLTE");
pub const IDAT: u32 = u32::from_be_bytes(*b"IDAT");
pub const IEND: u32 = u32::from_be_bytes(*b"IEND");
pub const GAMA: u32 = u32::from_be_bytes(*b"gAMA");
pub const BKGD: u32 = u32::from_be_bytes(*b"bKGD");

pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One raw chunk record: its type tag (as a big-endian u32 for fast
/// dispatch), and its payload. The CRC has already been validated by the
/// time a `RawChunk` exists.
pub struct RawChunk {
    pub tag: u32,
    pub tag_bytes: [u8; 4],
    pub payload: Vec<u8>,
}

impl RawChunk {
    /// `type[0]` bit 5 clear means critical; set means ancillary.
    pub fn is_critical(&self) -> bool {
        self.tag_bytes[0] & 0x20 == 0
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag_bytes).into_owned()
    }
}

/// Reads and CRC-validates one chunk from `reader`, positioned immediately
/// after the signature or a previous chunk's CRC.
pub fn read_chunk<R: Read>(reader: &mut R) -> Result<RawChunk> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .map_err(|_| invalid("truncated chunk length"))?;
    let length = u32::from_be_bytes(len_buf) as usize;

    let mut tag_bytes = [0u8; 4];
    reader
        .read_exact(&mut tag_bytes)
        .map_err(|_| invalid("truncated chunk type"))?;
    let tag = u32::from_be_bytes(tag_bytes);

    let mut payload = vec![0u8; length];
    reader
        .read_exact(&mut payload)
        .map_err(|_| invalid("truncated chunk payload"))?;

    let mut crc_buf = [0u8; 4];
    reader
        .read_exact(&mut crc_buf)
        .map_err(|_| invalid("truncated chunk crc"))?;
    let crc = u32::from_be_bytes(crc_buf);

    if chunk_crc(&tag_bytes, &payload) != crc {
        return Err(invalid(format!(
            "crc mismatch in chunk {:?}",
            String::from_utf8_lossy(&tag_bytes)
        )));
    }

    Ok(RawChunk {
        tag,
        tag_bytes,
        payload,
    })
}

/// Reads and checks the 8-byte PNG signature. Must be called first.
pub fn read_signature<R: Read>(reader: &mut R) -> Result<()> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| crate::error::PngError::NotAnImageOfThisFormat)?;
    if buf != SIGNATURE {
        return Err(crate::error::PngError::NotAnImageOfThisFormat);
    }
    Ok(())
}
