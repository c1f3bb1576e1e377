//! Audio decoder implementations

pub mod symphonia;

pub use self::symphonia::SymphoniaDecoder;

use crate::core::AudioFrame;
use crate::error::SectionizeResult;
use log::debug;
use std::path::Path;

/// Trait for audio decoders
pub trait Decoder {
    /// Get next audio frame from the stream
    fn decode_frame(&mut self) -> SectionizeResult<Option<AudioFrame>>;

    /// Check if decoder is finished
    fn is_finished(&self) -> bool;
}

/// Decode a whole file into one interleaved frame
pub fn decode_file<P: AsRef<Path>>(path: P) -> SectionizeResult<AudioFrame> {
    let path = path.as_ref();
    let mut decoder = SymphoniaDecoder::from_file(path)?;
    let mut audio = AudioFrame::new(Vec::new(), decoder.sample_rate(), decoder.channels())?;

    while let Some(frame) = decoder.decode_frame()? {
        audio.append(&frame)?;
    }

    debug!(
        "Decoded {} ({:.2}s)",
        path.display(),
        audio.duration().as_secs_f64()
    );

    Ok(audio)
}
