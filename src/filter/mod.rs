//! Audio filter implementations

pub mod remix;
pub mod resample;

pub use remix::Remix;
pub use resample::Resample;

use crate::core::AudioFrame;
use crate::error::SectionizeResult;

/// Trait for audio filters
pub trait Filter {
    /// Process an audio frame through this filter
    fn process(&mut self, frame: &AudioFrame) -> SectionizeResult<AudioFrame>;
}
