use crate::error::{SectionizeError, SectionizeResult};
use std::fmt;
use std::time::Duration;

/// Channel configuration for audio
///
/// Counts with a named layout always map to that variant; `Other` holds
/// every remaining count, so two values compare equal exactly when their
/// counts do as long as both come from [`Channels::from_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// Mono (1 channel)
    Mono,
    /// Stereo (2 channels)
    Stereo,
    /// Quad (4 channels)
    Quad,
    /// 5.1 surround sound
    SurroundFivePointOne,
    /// 7.1 surround sound
    SurroundSevenPointOne,
    /// Any other non-zero channel count
    Other(u32),
}

impl Channels {
    /// Create Channels from channel count
    pub fn from_count(count: u32) -> SectionizeResult<Self> {
        match count {
            0 => Err(SectionizeError::InvalidMetadata(
                "Stream has no channels".to_string(),
            )),
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            4 => Ok(Channels::Quad),
            6 => Ok(Channels::SurroundFivePointOne),
            8 => Ok(Channels::SurroundSevenPointOne),
            n => Ok(Channels::Other(n)),
        }
    }

    /// Get the number of channels
    pub fn count(&self) -> u32 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
            Channels::Quad => 4,
            Channels::SurroundFivePointOne => 6,
            Channels::SurroundSevenPointOne => 8,
            Channels::Other(n) => *n,
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Mono => write!(f, "Mono"),
            Channels::Stereo => write!(f, "Stereo"),
            Channels::Quad => write!(f, "Quad"),
            Channels::SurroundFivePointOne => write!(f, "5.1 Surround"),
            Channels::SurroundSevenPointOne => write!(f, "7.1 Surround"),
            Channels::Other(n) => write!(f, "{} channels", n),
        }
    }
}

/// Sample format used when rendering sections to WAV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 16-bit signed PCM
    #[default]
    I16,
    /// 24-bit signed PCM
    I24,
    /// 32-bit floating point
    F32,
}

impl BitDepth {
    /// Parse a bit count as given on the command line
    pub fn from_bits(bits: u16) -> SectionizeResult<Self> {
        match bits {
            16 => Ok(BitDepth::I16),
            24 => Ok(BitDepth::I24),
            32 => Ok(BitDepth::F32),
            other => Err(SectionizeError::ConfigError(format!(
                "bit depth must be 16, 24 or 32, got {}",
                other
            ))),
        }
    }

    /// Bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::I16 => 16,
            BitDepth::I24 => 24,
            BitDepth::F32 => 32,
        }
    }
}

/// Block of interleaved audio samples positioned in a stream
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Audio samples (interleaved for multiple channels, f32 from -1.0 to 1.0)
    samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 44100, 48000, 22050)
    sample_rate: u32,
    /// Number of channels
    channels: Channels,
    /// Position of the first sample in the source stream
    start: Duration,
}

impl AudioFrame {
    /// Create a new audio frame starting at the beginning of the stream
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: Channels) -> SectionizeResult<Self> {
        Self::starting_at(samples, sample_rate, channels, Duration::ZERO)
    }

    /// Create a new audio frame positioned at `start`
    pub fn starting_at(
        samples: Vec<f32>,
        sample_rate: u32,
        channels: Channels,
        start: Duration,
    ) -> SectionizeResult<Self> {
        if sample_rate == 0 {
            return Err(SectionizeError::InvalidSampleRate { rate: sample_rate });
        }

        if samples.len() % channels.count() as usize != 0 {
            return Err(SectionizeError::BufferError(
                "Sample count not divisible by channel count".to_string(),
            ));
        }

        Ok(AudioFrame {
            samples,
            sample_rate,
            channels,
            start,
        })
    }

    /// Get reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get channel configuration
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.channels.count() as usize
    }

    /// Position of this frame in the source stream
    pub fn start(&self) -> Duration {
        self.start
    }

    /// Get duration of this frame
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_per_channel() as f64 / self.sample_rate as f64)
    }

    /// Check if frame is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append another frame of the same format to the end of this one
    pub fn append(&mut self, other: &AudioFrame) -> SectionizeResult<()> {
        if other.sample_rate != self.sample_rate {
            return Err(SectionizeError::InvalidSampleRate {
                rate: other.sample_rate,
            });
        }
        if other.channels != self.channels {
            return Err(SectionizeError::InvalidChannels {
                expected: self.channels.count(),
                got: other.channels.count(),
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}
