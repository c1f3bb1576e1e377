//! Audio encoder implementations

pub mod wav;

pub use wav::{WavEncoder, encode_to_vec};

use crate::core::AudioFrame;
use crate::error::SectionizeResult;

/// Trait for audio encoders
pub trait Encoder {
    /// Encode an audio frame to output
    fn encode(&mut self, frame: &AudioFrame) -> SectionizeResult<()>;

    /// Finalize encoding (flush any remaining data)
    fn finalize(&mut self) -> SectionizeResult<()> {
        Ok(())
    }
}
