use crate::error::{RenderError, Result};
use crate::types::DecodedAudio;
use hound::{SampleFormat, WavReader};
use log::{info, warn};
use std::io::Cursor;
use std::path::Path;

/// Turns raw file bytes into per-channel float samples.
///
/// Compressed formats are left to other implementations of this trait;
/// the bundled `WavDecoder` handles uncompressed PCM and IEEE float WAV.
pub trait SourceDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl SourceDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio> {
        decode_wav(bytes)
    }
}

/// Source file kinds the picker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Wav,
    Mp3,
}

/// Accept `.wav` / `.mp3` (any case), reject everything else.
pub fn source_kind(name: &str) -> Result<SourceKind> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => Ok(SourceKind::Wav),
        Some("mp3") => Ok(SourceKind::Mp3),
        _ => Err(RenderError::InvalidInputFormat(format!(
            "{}: please select a WAV or MP3 file",
            name
        ))),
    }
}

/// Decode an in-memory WAV file.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| RenderError::InvalidInputFormat(e.to_string()))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    info!(
        "WAV: {} Hz  {} ch  {:?}  {} bit  {} frames",
        spec.sample_rate,
        channels,
        spec.sample_format,
        spec.bits_per_sample,
        reader.duration(),
    );

    if spec.sample_format == SampleFormat::Int && spec.bits_per_sample != 16 {
        warn!(
            "Source is {}-bit; samples are rescaled to float and rendered at 16-bit",
            spec.bits_per_sample
        );
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| RenderError::InvalidInputFormat(e.to_string()))?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| RenderError::InvalidInputFormat(e.to_string()))?
        }
    };

    DecodedAudio::from_interleaved(&samples, channels, spec.sample_rate)
}

/// Decode by file name: WAV is handled here, MP3 needs an external decoder.
pub fn decode_named(name: &str, bytes: &[u8], decoder: &dyn SourceDecoder) -> Result<DecodedAudio> {
    match source_kind(name)? {
        SourceKind::Wav => decoder.decode(bytes),
        SourceKind::Mp3 => decoder.decode(bytes).map_err(|e| match e {
            RenderError::InvalidInputFormat(msg) => RenderError::InvalidInputFormat(format!(
                "{}: MP3 needs a compressed-audio decoder ({})",
                name, msg
            )),
            other => other,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes_i16(channels: u16, rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut w = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                w.write_sample(s).unwrap();
            }
            w.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decodes_stereo_int16() {
        let bytes = wav_bytes_i16(2, 22050, &[16384, -16384, 0, 8192]);
        let audio = decode_wav(&bytes).unwrap();
        assert_eq!(audio.sample_rate(), 22050);
        assert_eq!(audio.left(), &[0.5, 0.0]);
        assert_eq!(audio.right(), &[-0.5, 0.25]);
    }

    #[test]
    fn test_mono_is_duplicated() {
        let bytes = wav_bytes_i16(1, 8000, &[16384, -32768]);
        let audio = decode_wav(&bytes).unwrap();
        assert_eq!(audio.left(), &[0.5, -1.0]);
        assert_eq!(audio.left(), audio.right());
    }

    #[test]
    fn test_decodes_float() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut w = WavWriter::new(&mut cursor, spec).unwrap();
            w.write_sample(0.125f32).unwrap();
            w.write_sample(-0.75f32).unwrap();
            w.finalize().unwrap();
        }
        let audio = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(audio.left(), &[0.125, -0.75]);
    }

    #[test]
    fn test_garbage_is_invalid_format() {
        let err = decode_wav(b"ID3\x04\x00 definitely not riff").unwrap_err();
        assert!(matches!(err, RenderError::InvalidInputFormat(_)));
    }

    #[test]
    fn test_empty_data_chunk_is_empty_source() {
        let bytes = wav_bytes_i16(2, 8000, &[]);
        assert!(matches!(decode_wav(&bytes), Err(RenderError::EmptySource)));
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(source_kind("take1.WAV").unwrap(), SourceKind::Wav);
        assert_eq!(source_kind("song.mp3").unwrap(), SourceKind::Mp3);
        assert!(source_kind("notes.txt").is_err());
        assert!(source_kind("noext").is_err());
    }

    #[test]
    fn test_mp3_without_decoder_is_invalid_format() {
        let err = decode_named("song.mp3", b"\xFF\xFB\x90\x00", &WavDecoder).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("MP3"), "msg={}", err);
    }
}
