use crate::core::{AudioFrame, Channels};
use crate::error::SectionizeResult;

/// Audio channel remixer - folds any channel layout down to mono
pub struct Remix;

impl Remix {
    /// Remixer that folds any layout down to mono
    pub fn to_mono() -> Self {
        Remix
    }

    /// Average every interleaved frame of `channels` samples into one
    fn downmix(input: &[f32], channels: usize) -> Vec<f32> {
        if channels == 1 {
            return input.to_vec();
        }
        input
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

impl super::Filter for Remix {
    fn process(&mut self, frame: &AudioFrame) -> SectionizeResult<AudioFrame> {
        let mono = Self::downmix(frame.samples(), frame.channels().count() as usize);
        AudioFrame::starting_at(mono, frame.sample_rate(), Channels::Mono, frame.start())
    }
}
