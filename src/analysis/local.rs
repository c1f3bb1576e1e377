//! In-process analyzer built on the decoder, filters and spectral features

use super::features::{self, FeatureExtractor, FrameFeatures, SILENCE_DB};
use super::key::estimate_key;
use super::model::{Section, Segment, TimeQuantum, Track};
use super::structure::{self, StructureConfig};
use super::tempo::{self, Meter, TempoEstimate};
use super::Analyzer;
use crate::core::AudioFrame;
use crate::decoder;
use crate::error::{SectionizeError, SectionizeResult};
use crate::filter::{Filter, Remix, Resample};
use log::{debug, info};
use std::path::Path;

/// Parameters of the local analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Rate the signal is resampled to before feature extraction
    pub sample_rate: u32,
    /// FFT window length in samples
    pub frame_size: usize,
    /// Hop between windows in samples
    pub hop_size: usize,
    /// Lowest tempo considered
    pub min_bpm: f32,
    /// Highest tempo considered
    pub max_bpm: f32,
    /// Minimum spacing of segment onsets in seconds
    pub min_onset_gap_secs: f64,
    /// Shortest span that gets its own tempo estimate
    pub min_tempo_span_secs: f64,
    /// Section boundary detection
    pub structure: StructureConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            min_onset_gap_secs: 0.1,
            min_tempo_span_secs: 4.0,
            structure: StructureConfig::default(),
        }
    }
}

/// Analyzer that decodes the file and computes the structure itself
#[derive(Debug, Clone, Default)]
pub struct LocalAnalyzer {
    config: AnalyzerConfig,
}

impl LocalAnalyzer {
    /// Create an analyzer with explicit parameters
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Decode `path` and reduce it to mono at the analysis rate
    fn prepare(&self, path: &Path) -> SectionizeResult<(AudioFrame, f64)> {
        let audio = decoder::decode_file(path)?;
        let duration = audio.duration().as_secs_f64();

        let mono = Remix::to_mono().process(&audio)?;
        let analysed = Resample::new(self.config.sample_rate)?.process(&mono)?;
        Ok((analysed, duration))
    }

    /// Analyse mono samples at the configured rate
    ///
    /// `duration` is the length of the original audio, which resampling may
    /// have stretched by a few samples.
    pub fn analyze_samples(&self, samples: &[f32], duration: f64) -> Track {
        let cfg = &self.config;
        let extractor = FeatureExtractor::new(cfg.sample_rate, cfg.frame_size, cfg.hop_size);
        let frames = extractor.extract(samples);
        let frame_rate = extractor.frame_rate();
        let flux: Vec<f32> = frames.iter().map(|f| f.flux).collect();

        let silent = frames.iter().all(|f| f.rms_db <= SILENCE_DB);
        let loudness = features::power_mean_db(frames.iter().map(|f| f.rms_db)) as f64;

        let pulse = tempo::estimate_tempo(&flux, frame_rate, cfg.min_bpm, cfg.max_bpm)
            .unwrap_or_else(TempoEstimate::fallback);

        let beats = if silent {
            Vec::new()
        } else {
            tempo::beat_grid(&flux, frame_rate, pulse.bpm, duration)
        };
        let meter = tempo::estimate_meter(&beats);
        let bars = tempo::group(
            &beats[meter.downbeat.min(beats.len())..],
            meter.beats_per_bar as usize,
        );
        let tatums = tempo::subdivide(&beats, 2);

        let min_gap = (cfg.min_onset_gap_secs * frame_rate as f64).round() as usize;
        let radius = (frame_rate as f64 * 0.1).round() as usize;
        let onsets = features::pick_onsets(&flux, radius.max(1), min_gap);
        let segments = build_segments(&frames, &flux, &onsets, frame_rate, duration);

        let sections = if silent || duration <= 0.0 {
            Vec::new()
        } else {
            self.build_sections(&frames, &flux, &bars, pulse, meter, frame_rate, duration)
        };

        debug!(
            "{} frames, {:.1} BPM ({:.2}), {} beats, {} segments, {} sections",
            frames.len(),
            pulse.bpm,
            pulse.confidence,
            beats.len(),
            segments.len(),
            sections.len()
        );

        Track {
            duration,
            sample_rate: cfg.sample_rate,
            loudness,
            tempo: pulse.bpm,
            tempo_confidence: pulse.confidence,
            key: estimate_key(&features::mean_chroma(&frames)),
            time_signature: meter.beats_per_bar,
            time_signature_confidence: meter.confidence,
            tatums,
            beats,
            bars,
            segments,
            sections,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_sections(
        &self,
        frames: &[FrameFeatures],
        flux: &[f32],
        bars: &[TimeQuantum],
        pulse: TempoEstimate,
        meter: Meter,
        frame_rate: f32,
        duration: f64,
    ) -> Vec<Section> {
        let cfg = &self.config;
        let min_half = cfg.structure.min_section_secs / 2.0;
        let bar_secs = 60.0 / pulse.bpm * meter.beats_per_bar as f64;

        let mut starts: Vec<(f64, f64)> = vec![(0.0, 1.0)];
        for boundary in structure::find_boundaries(frames, frame_rate, &cfg.structure) {
            let time = snap_to_bar(boundary.time, bars, bar_secs / 2.0);
            let previous = starts[starts.len() - 1].0;
            if time - previous >= min_half && duration - time >= min_half {
                starts.push((time, boundary.strength));
            }
        }

        let fr = frame_rate as f64;
        starts
            .iter()
            .enumerate()
            .map(|(i, &(start, confidence))| {
                let end = starts.get(i + 1).map(|s| s.0).unwrap_or(duration);
                let f0 = ((start * fr).floor() as usize).min(frames.len());
                let f1 = ((end * fr).ceil() as usize).clamp(f0, frames.len());
                let span = &frames[f0..f1];

                let local_tempo = (end - start >= cfg.min_tempo_span_secs)
                    .then(|| {
                        tempo::estimate_tempo(&flux[f0..f1], frame_rate, cfg.min_bpm, cfg.max_bpm)
                    })
                    .flatten()
                    .unwrap_or(pulse);

                Section {
                    start,
                    duration: end - start,
                    confidence,
                    loudness: features::power_mean_db(span.iter().map(|f| f.rms_db)) as f64,
                    tempo: local_tempo.bpm,
                    tempo_confidence: local_tempo.confidence,
                    key: estimate_key(&features::mean_chroma(span)),
                    time_signature: meter.beats_per_bar,
                    time_signature_confidence: meter.confidence,
                }
            })
            .collect()
    }
}

impl Analyzer for LocalAnalyzer {
    fn name(&self) -> &'static str {
        "local"
    }

    fn analyze(&self, path: &Path) -> SectionizeResult<Track> {
        info!("Analysing {}", path.display());
        let (mono, duration) = self
            .prepare(path)
            .map_err(|e| SectionizeError::analysis(path, e))?;
        Ok(self.analyze_samples(mono.samples(), duration))
    }
}

/// Move `time` onto the nearest bar start within `tolerance` seconds
fn snap_to_bar(time: f64, bars: &[TimeQuantum], tolerance: f64) -> f64 {
    bars.iter()
        .map(|b| b.start)
        .min_by(|a, b| (a - time).abs().total_cmp(&(b - time).abs()))
        .filter(|start| (start - time).abs() <= tolerance)
        .unwrap_or(time)
}

/// Turn onset frames into contiguous segments covering the whole track
fn build_segments(
    frames: &[FrameFeatures],
    flux: &[f32],
    onsets: &[usize],
    frame_rate: f32,
    duration: f64,
) -> Vec<Segment> {
    let fr = frame_rate as f64;
    let peak_flux = flux.iter().cloned().fold(0.0f32, f32::max);

    onsets
        .iter()
        .enumerate()
        .filter_map(|(i, &f0)| {
            let f1 = onsets.get(i + 1).copied().unwrap_or(frames.len());
            let start = f0 as f64 / fr;
            let end = if i + 1 < onsets.len() {
                (f1 as f64 / fr).min(duration)
            } else {
                duration
            };
            if end <= start || f1 <= f0 {
                return None;
            }

            let span = &frames[f0..f1];
            let (max_idx, loudness_max) = span
                .iter()
                .map(|f| f.rms_db)
                .enumerate()
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            let brightness = span.iter().map(|f| f.centroid as f64).sum::<f64>() / span.len() as f64;

            Some(Segment {
                start,
                duration: end - start,
                confidence: if peak_flux > 0.0 {
                    (flux[f0] / peak_flux) as f64
                } else {
                    0.0
                },
                loudness_start: span[0].rms_db as f64,
                loudness_max: loudness_max as f64,
                loudness_max_time: max_idx as f64 / fr,
                brightness,
                pitches: features::mean_chroma(span).iter().map(|&c| c as f64).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SR: u32 = 22050;

    fn sine(freq: f32, amplitude: f32, secs: f32) -> Vec<f32> {
        (0..(secs * SR as f32) as usize)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// Deterministic white-ish noise
    fn noise(amplitude: f32, secs: f32) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..(secs * SR as f32) as usize)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                amplitude * ((state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0)
            })
            .collect()
    }

    fn assert_contiguous(track: &Track) {
        let sections = &track.sections;
        assert_eq!(sections[0].start, 0.0);
        for pair in sections.windows(2) {
            assert!((pair[0].end() - pair[1].start).abs() < 1e-9);
        }
        assert!((sections.last().unwrap().end() - track.duration).abs() < 1e-9);
    }

    #[test]
    fn test_silence_has_no_sections() {
        let analyzer = LocalAnalyzer::default();
        let track = analyzer.analyze_samples(&vec![0.0; SR as usize * 5], 5.0);
        assert_eq!(track.duration, 5.0);
        assert!(track.sections.is_empty());
        assert!(track.beats.is_empty());
        assert_eq!(track.loudness, SILENCE_DB as f64);
    }

    #[test]
    fn test_empty_signal() {
        let track = LocalAnalyzer::default().analyze_samples(&[], 0.0);
        assert!(track.sections.is_empty());
        assert!(track.segments.is_empty());
        assert_eq!(track.tempo, tempo::DEFAULT_TEMPO);
    }

    #[test]
    fn test_short_tone_is_one_section() {
        let track = LocalAnalyzer::default().analyze_samples(&sine(220.0, 0.3, 3.0), 3.0);
        assert_eq!(track.sections.len(), 1);
        assert_contiguous(&track);
        assert!(!track.segments.is_empty());
        assert_eq!(track.segments[0].start, 0.0);
    }

    #[test]
    fn test_contrasting_halves_split() {
        let mut samples = sine(220.0, 0.2, 20.0);
        samples.extend(noise(0.8, 20.0));

        let track = LocalAnalyzer::default().analyze_samples(&samples, 40.0);
        assert!(track.sections.len() >= 2, "{} sections", track.sections.len());
        assert_contiguous(&track);

        let nearest = track
            .sections
            .iter()
            .skip(1)
            .map(|s| (s.start - 20.0).abs())
            .fold(f64::MAX, f64::min);
        assert!(nearest <= 3.0, "no boundary near 20s: {:?}", track.sections);
        assert!(track.sections[0].loudness < track.sections.last().unwrap().loudness);
    }

    #[test]
    fn test_analyze_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..(44100 * 2) {
            let s = (0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin()
                * i16::MAX as f32) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let track = LocalAnalyzer::default().analyze(&path).unwrap();
        assert!((track.duration - 2.0).abs() < 1e-6);
        assert_eq!(track.sample_rate, 22050);
        assert_eq!(track.sections.len(), 1);
        assert_eq!(track.key.as_ref().map(|k| k.tonic), Some(9));
    }

    #[test]
    fn test_analyze_three_channel_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stems.wav");
        let spec = hound::WavSpec {
            channels: 3,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in sine(330.0, 0.3, 2.0) {
            let s = (s * i16::MAX as f32) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let track = LocalAnalyzer::default().analyze(&path).unwrap();
        assert!((track.duration - 2.0).abs() < 1e-6);
        assert_eq!(track.sections.len(), 1);
        assert_contiguous(&track);
    }

    #[test]
    fn test_analyze_missing_file() {
        let err = LocalAnalyzer::default()
            .analyze(Path::new("/nonexistent/track.mp3"))
            .unwrap_err();
        assert!(matches!(err, SectionizeError::AnalysisError { .. }));
    }

    #[test]
    fn test_snap_to_bar() {
        let bars: Vec<TimeQuantum> = (0..10)
            .map(|i| TimeQuantum {
                start: i as f64 * 2.0,
                duration: 2.0,
                confidence: 1.0,
            })
            .collect();
        assert_eq!(snap_to_bar(9.4, &bars, 1.0), 10.0);
        assert_eq!(snap_to_bar(9.0, &bars, 0.5), 9.0);
        assert_eq!(snap_to_bar(5.0, &[], 1.0), 5.0);
    }
}
