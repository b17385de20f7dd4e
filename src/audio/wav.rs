//! Utterance assembly and WAV encoding.
//!
//! The chat backend expects a canonical 44-byte header: PCM, mono, 16-bit,
//! little-endian, followed by the samples.

use std::io::Cursor;

use crate::error::Result;

/// Header size of the canonical PCM WAV layout
pub const WAV_HEADER_LEN: usize = 44;

/// The samples of one recording, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Utterance {
    /// Concatenate captured blocks without reordering or truncation
    pub fn from_chunks(chunks: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in chunks {
            samples.extend_from_slice(&chunk);
        }
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }

    /// Consume the utterance into a WAV container
    pub fn into_wav(self) -> Result<Vec<u8>> {
        encode_wav(&self.samples, self.sample_rate)
    }
}

/// Convert one float sample to signed 16-bit PCM
///
/// Clamps to [-1.0, 1.0] first; negative values scale by 32768, positive by 32767.
pub fn float_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode mono float samples as a 16-bit PCM WAV file
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(float_to_pcm16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
