//! Canonical 44-byte-header, 16-bit stereo PCM WAV encoding.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//!  0  "RIFF"          4  36 + data_size     8  "WAVE"
//! 12  "fmt "         16  16                20  1 (PCM)      22  channels
//! 24  sample_rate    28  byte_rate         32  block_align  34  bits
//! 36  "data"         40  data_size         44  interleaved i16 L,R,L,R...
//! ```

use crate::error::{RenderError, Result};
use crate::types::PcmContainer;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

pub const HEADER_LEN: usize = 44;
pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Float sample → i16: clamp, scale by 32767, truncate toward zero.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = (sample as f64).clamp(-1.0, 1.0);
    (clamped * 32767.0) as i16
}

/// Encode a stereo pair into an owned WAV container.
///
/// Panics if the channels differ in length; that is a wiring bug, not bad input.
pub fn encode(left: &[f32], right: &[f32], sample_rate: u32) -> Result<PcmContainer> {
    assert_eq!(
        left.len(),
        right.len(),
        "encoder needs equal-length channels"
    );
    let frames = left.len();
    let data_size = data_size_for(frames)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + data_size as usize);
    write_header(&mut bytes, sample_rate, data_size)?;
    for (&l, &r) in left.iter().zip(right) {
        bytes.write_i16::<LittleEndian>(sample_to_i16(l))?;
        bytes.write_i16::<LittleEndian>(sample_to_i16(r))?;
    }
    debug_assert_eq!(bytes.len(), HEADER_LEN + data_size as usize);

    Ok(PcmContainer::from_parts(bytes, sample_rate, frames))
}

/// Payload bytes for `frames` stereo frames, if the RIFF size fields can hold them.
pub fn data_size_for(frames: usize) -> Result<u32> {
    frames
        .checked_mul(BLOCK_ALIGN as usize)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or(RenderError::ContainerTooLarge { samples: frames })
}

/// Header byte rate. Sample rates above `u32::MAX / 4` have none.
pub fn byte_rate_for(sample_rate: u32) -> Result<u32> {
    sample_rate
        .checked_mul(BLOCK_ALIGN as u32)
        .ok_or_else(|| RenderError::out_of_range("sample_rate", sample_rate as f64))
}

/// Write the 44-byte header for `data_size` payload bytes.
pub fn write_header<W: Write>(w: &mut W, sample_rate: u32, data_size: u32) -> Result<()> {
    let byte_rate = byte_rate_for(sample_rate)?;
    let riff_size = data_size
        .checked_add(36)
        .ok_or(RenderError::ContainerTooLarge {
            samples: data_size as usize / BLOCK_ALIGN as usize,
        })?;

    w.write_all(b"RIFF")?;
    w.write_u32::<LittleEndian>(riff_size)?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_u32::<LittleEndian>(FMT_CHUNK_LEN)?;
    w.write_u16::<LittleEndian>(PCM_FORMAT)?;
    w.write_u16::<LittleEndian>(CHANNELS)?;
    w.write_u32::<LittleEndian>(sample_rate)?;
    w.write_u32::<LittleEndian>(byte_rate)?;
    w.write_u16::<LittleEndian>(BLOCK_ALIGN)?;
    w.write_u16::<LittleEndian>(BITS_PER_SAMPLE)?;

    w.write_all(b"data")?;
    w.write_u32::<LittleEndian>(data_size)?;
    Ok(())
}

/// Fields of a canonical header, as read back from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the fixed 44-byte layout. Only the canonical chunk order is accepted.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(RenderError::InvalidInputFormat(format!(
                "header too short: {} bytes",
                data.len()
            )));
        }
        let mut c = Cursor::new(&data[..HEADER_LEN]);
        expect_tag(&mut c, b"RIFF")?;
        let riff_size = c.read_u32::<LittleEndian>()?;
        expect_tag(&mut c, b"WAVE")?;
        expect_tag(&mut c, b"fmt ")?;
        let fmt_len = c.read_u32::<LittleEndian>()?;
        if fmt_len != FMT_CHUNK_LEN {
            return Err(RenderError::InvalidInputFormat(format!(
                "unexpected fmt chunk length {}",
                fmt_len
            )));
        }
        let format = c.read_u16::<LittleEndian>()?;
        let channels = c.read_u16::<LittleEndian>()?;
        let sample_rate = c.read_u32::<LittleEndian>()?;
        let byte_rate = c.read_u32::<LittleEndian>()?;
        let block_align = c.read_u16::<LittleEndian>()?;
        let bits_per_sample = c.read_u16::<LittleEndian>()?;
        expect_tag(&mut c, b"data")?;
        let data_size = c.read_u32::<LittleEndian>()?;

        Ok(Self {
            riff_size,
            format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_size,
        })
    }
}

fn expect_tag(c: &mut Cursor<&[u8]>, tag: &[u8; 4]) -> Result<()> {
    let mut got = [0u8; 4];
    c.read_exact(&mut got)?;
    if &got != tag {
        return Err(RenderError::InvalidInputFormat(format!(
            "expected {:?}, found {:?}",
            String::from_utf8_lossy(tag),
            String::from_utf8_lossy(&got)
        )));
    }
    Ok(())
}
