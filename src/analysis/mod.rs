//! Track structure analysis
//!
//! [`Analyzer`] is the seam between the command-line workflow and whatever
//! produces a [`Track`]. [`LocalAnalyzer`] computes one in-process from the
//! decoded audio; tests substitute their own implementations.

pub mod features;
pub mod key;
pub mod local;
pub mod model;
pub mod structure;
pub mod tempo;

pub use local::{AnalyzerConfig, LocalAnalyzer};
pub use model::{KeySignature, Mode, Section, Segment, TimeQuantum, Track};

use crate::error::SectionizeResult;
use std::path::Path;

/// Something that can compute a structure analysis for an audio file
pub trait Analyzer {
    /// Short name recorded in the analysis cache
    fn name(&self) -> &'static str;

    /// Analyse the audio file at `path`
    fn analyze(&self, path: &Path) -> SectionizeResult<Track>;
}

impl<A: Analyzer + ?Sized> Analyzer for &A {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn analyze(&self, path: &Path) -> SectionizeResult<Track> {
        (**self).analyze(path)
    }
}
