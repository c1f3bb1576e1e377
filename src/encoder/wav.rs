use crate::core::{AudioFrame, BitDepth, Channels};
use crate::error::{SectionizeError, SectionizeResult};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};

/// WAV audio encoder
pub struct WavEncoder<W: Write + Seek> {
    writer: Option<WavWriter<W>>,
    sample_rate: u32,
    channels: Channels,
    bit_depth: BitDepth,
}

impl<W: Write + Seek> WavEncoder<W> {
    /// Create a new WAV encoder writing to `sink`
    pub fn new(
        sink: W,
        sample_rate: u32,
        channels: Channels,
        bit_depth: BitDepth,
    ) -> SectionizeResult<Self> {
        let spec = WavSpec {
            channels: channels.count() as u16,
            sample_rate,
            bits_per_sample: bit_depth.bits(),
            sample_format: match bit_depth {
                BitDepth::F32 => SampleFormat::Float,
                BitDepth::I16 | BitDepth::I24 => SampleFormat::Int,
            },
        };

        let writer = WavWriter::new(sink, spec)?;

        Ok(WavEncoder {
            writer: Some(writer),
            sample_rate,
            channels,
            bit_depth,
        })
    }

    /// Get the number of samples written
    pub fn samples_written(&self) -> u32 {
        self.writer.as_ref().map(|w| w.len()).unwrap_or(0)
    }

    fn write_sample(writer: &mut WavWriter<W>, sample: f32, bit_depth: BitDepth) -> SectionizeResult<()> {
        let clamped = sample.clamp(-1.0, 1.0);
        match bit_depth {
            BitDepth::F32 => writer.write_sample(clamped)?,
            BitDepth::I16 => writer.write_sample((clamped * i16::MAX as f32).round() as i16)?,
            BitDepth::I24 => writer.write_sample((clamped * 8_388_607.0).round() as i32)?,
        }
        Ok(())
    }
}

impl<W: Write + Seek> super::Encoder for WavEncoder<W> {
    fn encode(&mut self, frame: &AudioFrame) -> SectionizeResult<()> {
        if frame.sample_rate() != self.sample_rate {
            return Err(SectionizeError::InvalidSampleRate {
                rate: frame.sample_rate(),
            });
        }

        if frame.channels() != self.channels {
            return Err(SectionizeError::InvalidChannels {
                expected: self.channels.count(),
                got: frame.channels().count(),
            });
        }

        let bit_depth = self.bit_depth;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SectionizeError::EncodeError("Encoder already finalized".to_string()))?;

        for &sample in frame.samples() {
            Self::write_sample(writer, sample, bit_depth)?;
        }

        Ok(())
    }

    fn finalize(&mut self) -> SectionizeResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

/// Encode a whole frame as an in-memory WAV file
pub fn encode_to_vec(frame: &AudioFrame, bit_depth: BitDepth) -> SectionizeResult<Vec<u8>> {
    use super::Encoder;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = WavEncoder::new(&mut cursor, frame.sample_rate(), frame.channels(), bit_depth)?;
        encoder.encode(frame)?;
        encoder.finalize()?;
    }
    Ok(cursor.into_inner())
}
