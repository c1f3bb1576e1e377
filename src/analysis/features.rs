//! Per-frame spectral features
//!
//! Every hop produces one [`FrameFeatures`]: loudness, log spectral flux,
//! spectral centroid and a 12-bin chroma vector. Tempo, onsets, keys and
//! section boundaries are all derived from this one pass.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Loudness floor in dB
pub const SILENCE_DB: f32 = -60.0;

/// Lowest frequency folded into chroma (C2)
const CHROMA_MIN_HZ: f32 = 65.0;
/// Highest frequency folded into chroma
const CHROMA_MAX_HZ: f32 = 2100.0;
/// Compression constant for log magnitudes
const LOG_COMPRESSION: f32 = 100.0;

/// Features of one analysis frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    /// RMS loudness in dB, floored at [`SILENCE_DB`]
    pub rms_db: f32,
    /// Half-wave rectified log spectral flux
    pub flux: f32,
    /// Spectral centroid in Hz, 0 for silent frames
    pub centroid: f32,
    /// Chroma energy per pitch class (C = 0), peak-normalised
    pub chroma: [f32; 12],
}

/// Sliding-window FFT feature extractor
pub struct FeatureExtractor {
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    bin_pitch_class: Vec<Option<usize>>,
}

impl FeatureExtractor {
    /// Build an extractor; `frame_size` and `hop_size` are in samples
    pub fn new(sample_rate: u32, frame_size: usize, hop_size: usize) -> Self {
        let frame_size = frame_size.max(2);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window: Vec<f32> = (0..frame_size)
            .map(|i| {
                let t = i as f32 / (frame_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let bin_hz = sample_rate as f32 / frame_size as f32;
        let bin_pitch_class = (0..frame_size / 2 + 1)
            .map(|k| {
                let freq = k as f32 * bin_hz;
                if (CHROMA_MIN_HZ..=CHROMA_MAX_HZ).contains(&freq) {
                    Some(pitch_class(freq))
                } else {
                    None
                }
            })
            .collect();

        Self {
            sample_rate,
            frame_size,
            hop_size: hop_size.max(1),
            window,
            fft,
            bin_pitch_class,
        }
    }

    /// Feature frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size as f32
    }

    /// Extract one feature frame per hop, covering every input sample
    pub fn extract(&self, samples: &[f32]) -> Vec<FrameFeatures> {
        if samples.is_empty() {
            return Vec::new();
        }

        let num_frames = samples.len().div_ceil(self.hop_size);
        let bins = self.frame_size / 2 + 1;
        let bin_hz = self.sample_rate as f32 / self.frame_size as f32;
        let scale = 4.0 / self.frame_size as f32;

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.frame_size];
        let mut prev_log = vec![0.0f32; bins];
        let mut frames = Vec::with_capacity(num_frames);

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_size;
            let end = (start + self.frame_size).min(samples.len());
            let raw = &samples[start..end];

            let energy: f32 = raw.iter().map(|s| s * s).sum();
            let rms = (energy / raw.len() as f32).sqrt();

            for (j, slot) in buffer.iter_mut().enumerate() {
                let s = raw.get(j).copied().unwrap_or(0.0);
                *slot = Complex::new(s * self.window[j], 0.0);
            }
            self.fft.process(&mut buffer);

            let mut flux = 0.0f32;
            let mut weighted = 0.0f32;
            let mut total = 0.0f32;
            let mut chroma = [0.0f32; 12];

            for k in 0..bins {
                let mag = buffer[k].norm() * scale;
                let log_mag = (1.0 + LOG_COMPRESSION * mag).ln();
                flux += (log_mag - prev_log[k]).max(0.0);
                prev_log[k] = log_mag;

                weighted += k as f32 * bin_hz * mag;
                total += mag;

                if let Some(pc) = self.bin_pitch_class[k] {
                    chroma[pc] += mag * mag;
                }
            }

            let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
            if peak > f32::EPSILON {
                chroma.iter_mut().for_each(|c| *c /= peak);
            }

            frames.push(FrameFeatures {
                rms_db: amplitude_to_db(rms),
                flux: flux / bins as f32,
                centroid: if total > 1e-6 { weighted / total } else { 0.0 },
                chroma,
            });
        }

        frames
    }
}

/// Pitch class of a frequency, C = 0
pub fn pitch_class(freq: f32) -> usize {
    let semitones_from_a4 = (12.0 * (freq / 440.0).log2()).round() as i32;
    (semitones_from_a4 + 9).rem_euclid(12) as usize
}

/// Linear amplitude to dB, floored at [`SILENCE_DB`]
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 1e-6 {
        SILENCE_DB
    } else {
        (20.0 * amplitude.log10()).max(SILENCE_DB)
    }
}

/// Mean of dB values taken in the power domain
pub fn power_mean_db<I: IntoIterator<Item = f32>>(values: I) -> f32 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0f64, 0usize), |(sum, n), db| (sum + 10f64.powf(db as f64 / 10.0), n + 1));
    if count == 0 {
        return SILENCE_DB;
    }
    ((10.0 * (sum / count as f64).log10()) as f32).max(SILENCE_DB)
}

/// Sum the chroma of `frames` and peak-normalise the result
pub fn mean_chroma(frames: &[FrameFeatures]) -> [f32; 12] {
    let mut chroma = [0.0f32; 12];
    for frame in frames {
        for (acc, c) in chroma.iter_mut().zip(frame.chroma.iter()) {
            *acc += c;
        }
    }
    let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
    if peak > f32::EPSILON {
        chroma.iter_mut().for_each(|c| *c /= peak);
    }
    chroma
}

/// Onset frames picked from the flux with a local adaptive threshold
///
/// Frame 0 is always reported. Successive onsets are at least `min_gap` frames apart.
pub fn pick_onsets(flux: &[f32], radius: usize, min_gap: usize) -> Vec<usize> {
    if flux.is_empty() {
        return Vec::new();
    }

    let max = flux.iter().cloned().fold(0.0f32, f32::max);
    let delta = 0.05 * max;
    let mut onsets = vec![0];

    for i in 1..flux.len() {
        let value = flux[i];
        let prev = flux[i - 1];
        let next = flux.get(i + 1).copied().unwrap_or(0.0);
        if value < prev || value <= next {
            continue;
        }

        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(flux.len());
        let local_mean = flux[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
        if value <= 1.5 * local_mean + delta {
            continue;
        }

        let last = onsets[onsets.len() - 1];
        if i - last >= min_gap.max(1) {
            onsets.push(i);
        }
    }

    onsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, secs: f32, sr: u32) -> Vec<f32> {
        (0..(secs * sr as f32) as usize)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_pitch_class() {
        assert_eq!(pitch_class(440.0), 9);
        assert_eq!(pitch_class(261.63), 0);
        assert_eq!(pitch_class(130.81), 0);
        assert_eq!(pitch_class(369.99), 6);
    }

    #[test]
    fn test_frame_count_covers_input() {
        let extractor = FeatureExtractor::new(22050, 2048, 512);
        assert_eq!(extractor.extract(&vec![0.1; 1025]).len(), 3);
        assert!(extractor.extract(&[]).is_empty());
    }

    #[test]
    fn test_sine_features() {
        let extractor = FeatureExtractor::new(22050, 2048, 512);
        let frames = extractor.extract(&sine(440.0, 0.5, 1.0, 22050));
        let mid = &frames[frames.len() / 2];

        // 0.5 amplitude sine has RMS 0.354 (-9 dB)
        assert!((mid.rms_db + 9.03).abs() < 0.5, "rms_db {}", mid.rms_db);
        assert!((mid.centroid - 440.0).abs() < 60.0, "centroid {}", mid.centroid);
        assert_eq!(mid.chroma[9], 1.0);
        assert!(mid.chroma[0] < 0.1);
    }

    #[test]
    fn test_silence() {
        let extractor = FeatureExtractor::new(22050, 2048, 512);
        let frames = extractor.extract(&vec![0.0; 22050]);
        assert!(frames.iter().all(|f| f.rms_db == SILENCE_DB && f.flux == 0.0));
        assert!(frames.iter().all(|f| f.centroid == 0.0));
    }

    #[test]
    fn test_power_mean_db() {
        assert!((power_mean_db([-10.0, -10.0]) + 10.0).abs() < 1e-4);
        // 0 dB and -inf-ish average to -3 dB
        assert!((power_mean_db([0.0, -60.0]) + 3.01).abs() < 0.01);
        assert_eq!(power_mean_db(Vec::<f32>::new()), SILENCE_DB);
    }

    #[test]
    fn test_pick_onsets() {
        let mut flux = vec![0.0f32; 100];
        for i in [10, 30, 32, 60] {
            flux[i] = 1.0;
        }
        flux[32] = 0.8;
        let onsets = pick_onsets(&flux, 5, 4);
        assert_eq!(onsets, vec![0, 10, 30, 60]);
    }
}
