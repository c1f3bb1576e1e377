//! Turning analysed sections back into audio

use crate::analysis::Section;
use crate::core::{AudioFrame, BitDepth};
use crate::decoder;
use crate::encoder;
use crate::error::SectionizeResult;
use crate::processor::SectionSlicer;
use log::debug;
use std::path::PathBuf;

/// Produces the encoded audio of one section
pub trait SectionRenderer {
    /// File extension of the encoded bytes, without the dot
    fn extension(&self) -> &'static str;

    /// Encode the audio spanned by `section`
    fn render(&mut self, section: &Section) -> SectionizeResult<Vec<u8>>;
}

impl<R: SectionRenderer + ?Sized> SectionRenderer for &mut R {
    fn extension(&self) -> &'static str {
        (**self).extension()
    }

    fn render(&mut self, section: &Section) -> SectionizeResult<Vec<u8>> {
        (**self).render(section)
    }
}

/// Renders sections of a source file as RIFF/WAVE at the source rate and layout
///
/// The source is decoded on the first render and kept for the following ones.
pub struct WavSectionRenderer {
    source: PathBuf,
    bit_depth: BitDepth,
    audio: Option<AudioFrame>,
}

impl WavSectionRenderer {
    /// Renderer for sections of `source`
    pub fn new(source: impl Into<PathBuf>, bit_depth: BitDepth) -> Self {
        WavSectionRenderer {
            source: source.into(),
            bit_depth,
            audio: None,
        }
    }

    /// Renderer over audio that is already decoded
    pub fn from_audio(audio: AudioFrame, bit_depth: BitDepth) -> Self {
        WavSectionRenderer {
            source: PathBuf::new(),
            bit_depth,
            audio: Some(audio),
        }
    }

    fn audio(&mut self) -> SectionizeResult<&AudioFrame> {
        let audio = match self.audio.take() {
            Some(audio) => audio,
            None => {
                debug!("Decoding {} for rendering", self.source.display());
                decoder::decode_file(&self.source)?
            }
        };
        Ok(self.audio.insert(audio))
    }
}

impl SectionRenderer for WavSectionRenderer {
    fn extension(&self) -> &'static str {
        "wav"
    }

    fn render(&mut self, section: &Section) -> SectionizeResult<Vec<u8>> {
        let bit_depth = self.bit_depth;
        let audio = self.audio()?;
        let slice = SectionSlicer::new(audio.sample_rate())?.cut(audio, section.start, section.duration)?;
        debug!(
            "Rendering {:.3}s..{:.3}s ({} samples per channel)",
            section.start,
            section.end(),
            slice.samples_per_channel()
        );
        encoder::encode_to_vec(&slice, bit_depth)
    }
}
