use crate::core::AudioFrame;
use crate::error::{SectionizeError, SectionizeResult};
use std::time::Duration;

/// Cuts time spans out of a decoded track, sample accurate
#[derive(Debug, Clone)]
pub struct SectionSlicer {
    /// Sample rate of the audio being cut
    sample_rate: u32,
}

impl SectionSlicer {
    /// Create a slicer for audio at `sample_rate`
    pub fn new(sample_rate: u32) -> SectionizeResult<Self> {
        if sample_rate == 0 {
            return Err(SectionizeError::InvalidSampleRate { rate: 0 });
        }

        Ok(SectionSlicer { sample_rate })
    }

    /// Index of the sample frame nearest to `seconds`
    pub fn sample_index(&self, seconds: f64) -> usize {
        (seconds.max(0.0) * self.sample_rate as f64).round() as usize
    }

    /// Extract `[start, start + duration)` from `frame`
    ///
    /// A span running past the end of the audio is clamped; a span starting at
    /// or after the end is an error.
    pub fn cut(&self, frame: &AudioFrame, start: f64, duration: f64) -> SectionizeResult<AudioFrame> {
        if frame.sample_rate() != self.sample_rate {
            return Err(SectionizeError::InvalidSampleRate {
                rate: frame.sample_rate(),
            });
        }

        let available = frame.samples_per_channel();
        let first = self.sample_index(start);
        let last = self.sample_index(start + duration.max(0.0)).min(available);

        if first >= available || first >= last {
            return Err(SectionizeError::SectionOutOfRange {
                start,
                end: start + duration,
                available: frame.duration().as_secs_f64(),
            });
        }

        let num_channels = frame.channels().count() as usize;
        let samples = frame.samples()[first * num_channels..last * num_channels].to_vec();

        AudioFrame::starting_at(
            samples,
            self.sample_rate,
            frame.channels(),
            Duration::from_secs_f64(first as f64 / self.sample_rate as f64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Channels;

    fn ramp(len: usize, channels: Channels) -> AudioFrame {
        let n = len * channels.count() as usize;
        let samples = (0..n).map(|i| i as f32 / n as f32).collect();
        AudioFrame::new(samples, 100, channels).unwrap()
    }

    #[test]
    fn test_slicer_invalid_rate() {
        assert!(SectionSlicer::new(0).is_err());
    }

    #[test]
    fn test_cut_interleaved() {
        let frame = ramp(1000, Channels::Stereo);
        let slicer = SectionSlicer::new(100).unwrap();

        let cut = slicer.cut(&frame, 2.0, 3.0).unwrap();
        assert_eq!(cut.samples_per_channel(), 300);
        assert_eq!(cut.channels(), Channels::Stereo);
        assert_eq!(cut.samples()[0], frame.samples()[400]);
        assert_eq!(cut.start(), Duration::from_secs(2));
    }

    #[test]
    fn test_cut_clamps_tail() {
        let frame = ramp(1000, Channels::Mono);
        let slicer = SectionSlicer::new(100).unwrap();

        let cut = slicer.cut(&frame, 8.0, 5.0).unwrap();
        assert_eq!(cut.samples_per_channel(), 200);
    }

    #[test]
    fn test_cut_past_end() {
        let frame = ramp(1000, Channels::Mono);
        let slicer = SectionSlicer::new(100).unwrap();

        let err = slicer.cut(&frame, 10.0, 1.0).unwrap_err();
        assert!(matches!(err, SectionizeError::SectionOutOfRange { .. }));
    }

    #[test]
    fn test_cut_wrong_rate() {
        let frame = AudioFrame::new(vec![0.0; 10], 44100, Channels::Mono).unwrap();
        let slicer = SectionSlicer::new(100).unwrap();
        assert!(slicer.cut(&frame, 0.0, 0.1).is_err());
    }
}
