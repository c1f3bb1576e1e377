//! Serializable analysis results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch class names, C = 0
const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A timed marker: tatum, beat or bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeQuantum {
    /// Start in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
    /// Detection confidence, 0..=1
    pub confidence: f64,
}

/// Major or minor tonality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Minor key
    Minor,
    /// Major key
    Major,
}

/// Estimated key of a track or section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Pitch class of the tonic, 0 = C through 11 = B
    pub tonic: u8,
    /// Major or minor
    pub mode: Mode,
    /// Correlation with the best matching key profile, 0..=1
    pub confidence: f64,
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        write!(f, "{} {}", PITCH_NAMES[(self.tonic % 12) as usize], mode)
    }
}

/// Low-level timed event with roughly uniform timbre and pitch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
    /// Onset strength relative to the strongest onset, 0..=1
    pub confidence: f64,
    /// Loudness at the onset in dB
    pub loudness_start: f64,
    /// Peak loudness in dB
    pub loudness_max: f64,
    /// Offset of the loudness peak from `start`, seconds
    pub loudness_max_time: f64,
    /// Mean spectral centroid in Hz
    pub brightness: f64,
    /// Chroma vector, 12 values in 0..=1
    pub pitches: Vec<f64>,
}

/// Large-scale part of a track such as a verse, chorus or bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Start in seconds
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
    /// Boundary strength, 0..=1
    pub confidence: f64,
    /// Mean loudness in dB
    pub loudness: f64,
    /// Tempo in BPM
    pub tempo: f64,
    /// Tempo confidence, 0..=1
    pub tempo_confidence: f64,
    /// Estimated key, if the section is tonal
    pub key: Option<KeySignature>,
    /// Beats per bar
    pub time_signature: u32,
    /// Time signature confidence, 0..=1
    pub time_signature_confidence: f64,
}

impl Section {
    /// End of the section in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Complete structure analysis of one audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Length in seconds
    pub duration: f64,
    /// Sample rate the features were computed at
    pub sample_rate: u32,
    /// Overall loudness in dB
    pub loudness: f64,
    /// Global tempo in BPM
    pub tempo: f64,
    /// Tempo confidence, 0..=1
    pub tempo_confidence: f64,
    /// Estimated key, if the track is tonal
    pub key: Option<KeySignature>,
    /// Beats per bar
    pub time_signature: u32,
    /// Time signature confidence, 0..=1
    pub time_signature_confidence: f64,
    /// Lowest regular pulse train
    pub tatums: Vec<TimeQuantum>,
    /// Beat markers
    pub beats: Vec<TimeQuantum>,
    /// Bar markers, each starting on a downbeat
    pub bars: Vec<TimeQuantum>,
    /// Onset-delimited segments
    pub segments: Vec<Segment>,
    /// Sections in chronological order
    pub sections: Vec<Section>,
}

impl Track {
    /// Whether any section was detected
    pub fn has_sections(&self) -> bool {
        !self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = KeySignature {
            tonic: 6,
            mode: Mode::Minor,
            confidence: 0.7,
        };
        assert_eq!(key.to_string(), "F# minor");
    }

    #[test]
    fn test_section_end() {
        let section = Section {
            start: 10.5,
            duration: 20.25,
            confidence: 1.0,
            loudness: -12.0,
            tempo: 120.0,
            tempo_confidence: 0.5,
            key: None,
            time_signature: 4,
            time_signature_confidence: 0.3,
        };
        assert_eq!(section.end(), 30.75);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Major).unwrap(), "\"major\"");
    }
}
