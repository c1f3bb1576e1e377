use crate::core::{AudioFrame, Channels};
use crate::error::{SectionizeError, SectionizeResult};
use log::debug;
use rubato::{FftFixedInOut, Resampler};

/// Input frames handed to rubato per call
const CHUNK_SIZE: usize = 1024;

/// Mono sample rate converter built on rubato's FFT resampler
pub struct Resample {
    output_rate: u32,
}

impl Resample {
    /// Create a resampler targeting `output_rate`
    pub fn new(output_rate: u32) -> SectionizeResult<Self> {
        if output_rate == 0 {
            return Err(SectionizeError::InvalidSampleRate { rate: 0 });
        }

        Ok(Resample { output_rate })
    }

    /// Get the output sample rate
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Resample mono samples, falling back to linear interpolation when rubato refuses
    fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> SectionizeResult<Vec<f32>> {
        let mut resampler =
            match FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1) {
                Ok(r) => r,
                Err(e) => {
                    debug!("rubato initialisation failed ({}), using linear fallback", e);
                    return Ok(Self::linear_resample(samples, from_rate as f64 / to_rate as f64));
                }
            };

        let ratio = to_rate as f64 / from_rate as f64;
        let frames_in = resampler.input_frames_next();
        let delay = resampler.output_delay();
        let expected = (samples.len() as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(expected + delay + resampler.output_frames_max());

        // Keep feeding zero-padded chunks past the end until the delayed tail is out
        let mut pos = 0;
        while output.len() < expected + delay {
            let begin = pos.min(samples.len());
            let end = (pos + frames_in).min(samples.len());
            let mut chunk = samples[begin..end].to_vec();
            chunk.resize(frames_in, 0.0);

            let input = vec![chunk];
            let resampled = resampler
                .process(&input, None)
                .map_err(|e| SectionizeError::ResamplingError(e.to_string()))?;

            match resampled.first() {
                Some(channel) if !channel.is_empty() => output.extend_from_slice(channel),
                _ => {
                    return Err(SectionizeError::ResamplingError(
                        "resampler produced no output".to_string(),
                    ));
                }
            }

            pos += frames_in;
        }

        output.drain(..delay);
        output.truncate(expected);
        Ok(output)
    }

    /// Linear interpolation resampling; `ratio` is input rate over output rate
    fn linear_resample(input: &[f32], ratio: f64) -> Vec<f32> {
        if input.is_empty() || ratio <= 0.0 {
            return Vec::new();
        }

        let output_len = (input.len() as f64 / ratio).ceil() as usize;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let input_pos = i as f64 * ratio;
            let input_idx = input_pos.floor() as usize;

            if input_idx + 1 < input.len() {
                let frac = input_pos - input_idx as f64;
                let sample = (input[input_idx] as f64 * (1.0 - frac)
                    + input[input_idx + 1] as f64 * frac) as f32;
                output.push(sample.clamp(-1.0, 1.0));
            } else if input_idx < input.len() {
                output.push(input[input_idx]);
            }
        }

        output
    }
}

impl super::Filter for Resample {
    fn process(&mut self, frame: &AudioFrame) -> SectionizeResult<AudioFrame> {
        if frame.channels() != Channels::Mono {
            return Err(SectionizeError::InvalidChannels {
                expected: 1,
                got: frame.channels().count(),
            });
        }

        if frame.sample_rate() == self.output_rate || frame.is_empty() {
            return AudioFrame::starting_at(
                frame.samples().to_vec(),
                self.output_rate,
                Channels::Mono,
                frame.start(),
            );
        }

        let resampled = Self::resample(frame.samples(), frame.sample_rate(), self.output_rate)?;
        AudioFrame::starting_at(resampled, self.output_rate, Channels::Mono, frame.start())
    }
}
