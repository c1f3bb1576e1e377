//! Tempo, beat grid and meter estimation from an onset envelope

use super::model::TimeQuantum;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Tempo used when none can be detected
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Centre of the log-normal tempo prior, BPM
const PRIOR_CENTER_BPM: f64 = 120.0;
/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f64 = 1.0;

/// Estimated tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    /// Beats per minute
    pub bpm: f64,
    /// Autocorrelation peak relative to zero lag, 0..=1
    pub confidence: f64,
}

impl TempoEstimate {
    /// Fallback used when the envelope carries no periodicity
    pub fn fallback() -> Self {
        Self {
            bpm: DEFAULT_TEMPO,
            confidence: 0.0,
        }
    }
}

/// Meter derived from the accent pattern of a beat grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meter {
    /// Beats per bar (3 or 4)
    pub beats_per_bar: u32,
    /// 0..=1
    pub confidence: f64,
    /// Index of the first downbeat in the beat list
    pub downbeat: usize,
}

/// Linear autocorrelation via FFT (Wiener-Khinchin)
pub fn autocorrelate(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }

    // Zero-pad to avoid circular wrap-around
    let fft_len = (signal.len() * 2).next_power_of_two();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();

    fft.process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_len as f32;
    buffer
        .iter()
        .take(signal.len())
        .map(|c| c.re * scale)
        .collect()
}

/// Estimate the dominant tempo of an onset envelope sampled at `frame_rate` Hz
pub fn estimate_tempo(
    envelope: &[f32],
    frame_rate: f32,
    min_bpm: f32,
    max_bpm: f32,
) -> Option<TempoEstimate> {
    if envelope.len() < 4 || frame_rate <= 0.0 || min_bpm <= 0.0 || max_bpm <= min_bpm {
        return None;
    }

    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|v| v - mean).collect();
    let acf = autocorrelate(&centered);
    if acf[0] <= f32::EPSILON {
        return None;
    }

    let min_lag = ((60.0 * frame_rate / max_bpm).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / min_bpm).ceil() as usize).min(acf.len() - 2);
    if min_lag >= max_lag {
        return None;
    }

    let weight = |lag: f64| {
        let bpm = 60.0 * frame_rate as f64 / lag;
        let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_OCTAVES;
        (-0.5 * octaves * octaves).exp()
    };

    let (best_lag, best_score) = (min_lag..=max_lag)
        .map(|lag| (lag, acf[lag] as f64 * weight(lag as f64)))
        .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

    if best_score <= 0.0 {
        return None;
    }

    // Parabolic interpolation around the integer peak
    let (y0, y1, y2) = (
        acf[best_lag - 1] as f64,
        acf[best_lag] as f64,
        acf[best_lag + 1] as f64,
    );
    let denom = y0 - 2.0 * y1 + y2;
    let offset = if denom.abs() > f64::EPSILON {
        (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };
    let lag = best_lag as f64 + offset;

    Some(TempoEstimate {
        bpm: 60.0 * frame_rate as f64 / lag,
        confidence: (y1 / acf[0] as f64).clamp(0.0, 1.0),
    })
}

/// Fixed-tempo beat grid aligned to the strongest pulse phase
pub fn beat_grid(envelope: &[f32], frame_rate: f32, bpm: f64, duration: f64) -> Vec<TimeQuantum> {
    if envelope.is_empty() || bpm <= 0.0 || duration <= 0.0 || frame_rate <= 0.0 {
        return Vec::new();
    }

    let fr = frame_rate as f64;
    let period = 60.0 / bpm;
    let period_frames = period * fr;
    let at = |pos: f64| envelope.get(pos.round() as usize).copied().unwrap_or(0.0);

    let best_phase = (0..period_frames.ceil().max(1.0) as usize)
        .map(|offset| {
            let mut score = 0.0f32;
            let mut pos = offset as f64;
            while (pos.round() as usize) < envelope.len() {
                score += at(pos);
                pos += period_frames;
            }
            (offset, score)
        })
        .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best })
        .0;

    let peak = envelope.iter().cloned().fold(0.0f32, f32::max);
    let mut beats = Vec::new();
    let mut k = 0usize;
    loop {
        let start = best_phase as f64 / fr + k as f64 * period;
        if start >= duration {
            break;
        }
        let confidence = if peak > 0.0 {
            (at(start * fr) / peak) as f64
        } else {
            0.0
        };
        beats.push(TimeQuantum {
            start,
            duration: period.min(duration - start),
            confidence,
        });
        k += 1;
    }

    beats
}

/// Split every quantum into `parts` equal pieces
pub fn subdivide(quanta: &[TimeQuantum], parts: usize) -> Vec<TimeQuantum> {
    let parts = parts.max(1);
    quanta
        .iter()
        .flat_map(|q| {
            let step = q.duration / parts as f64;
            (0..parts).map(move |i| TimeQuantum {
                start: q.start + i as f64 * step,
                duration: step,
                confidence: if i == 0 { q.confidence } else { q.confidence * 0.5 },
            })
        })
        .collect()
}

/// Group consecutive quanta `per_group` at a time
pub fn group(quanta: &[TimeQuantum], per_group: usize) -> Vec<TimeQuantum> {
    quanta
        .chunks(per_group.max(1))
        .map(|chunk| TimeQuantum {
            start: chunk[0].start,
            duration: chunk.iter().map(|q| q.duration).sum(),
            confidence: chunk.iter().map(|q| q.confidence).sum::<f64>() / chunk.len() as f64,
        })
        .collect()
}

/// Choose between 3 and 4 beats per bar from the accent pattern of `beats`
pub fn estimate_meter(beats: &[TimeQuantum]) -> Meter {
    const DEFAULT: Meter = Meter {
        beats_per_bar: 4,
        confidence: 0.0,
        downbeat: 0,
    };
    if beats.len() < 8 {
        return DEFAULT;
    }

    let contrast = |meter: usize| {
        let accents: Vec<f64> = (0..meter)
            .map(|phase| {
                let picked: Vec<f64> = beats
                    .iter()
                    .skip(phase)
                    .step_by(meter)
                    .map(|b| b.confidence)
                    .collect();
                picked.iter().sum::<f64>() / picked.len().max(1) as f64
            })
            .collect();
        let mean = accents.iter().sum::<f64>() / meter as f64;
        let (phase, max) = accents
            .iter()
            .cloned()
            .enumerate()
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        (max - mean, phase)
    };

    let (c3, phase3) = contrast(3);
    let (c4, phase4) = contrast(4);
    if c3 <= 0.0 && c4 <= 0.0 {
        return DEFAULT;
    }

    let confidence = ((c4 - c3).abs() / (c4 + c3).max(f64::EPSILON)).clamp(0.0, 1.0);
    if c3 > c4 {
        Meter {
            beats_per_bar: 3,
            confidence,
            downbeat: phase3,
        }
    } else {
        Meter {
            beats_per_bar: 4,
            confidence,
            downbeat: phase4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pulse every `period` frames, first pulse at `phase`
    fn pulses(len: usize, period: usize, phase: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i >= phase && (i - phase) % period == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    fn beat(start: f64, confidence: f64) -> TimeQuantum {
        TimeQuantum {
            start,
            duration: 0.5,
            confidence,
        }
    }

    #[test]
    fn test_autocorrelate_zero_lag_is_energy() {
        let acf = autocorrelate(&[1.0, 2.0, 3.0]);
        assert!((acf[0] - 14.0).abs() < 1e-4);
        assert!((acf[1] - 8.0).abs() < 1e-4);
        assert!((acf[2] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_estimate_tempo_pulse_train() {
        // 40 frames/s, pulse every 20 frames = 120 BPM
        let envelope = pulses(800, 20, 3);
        let tempo = estimate_tempo(&envelope, 40.0, 60.0, 200.0).unwrap();
        assert!((tempo.bpm - 120.0).abs() < 2.0, "bpm {}", tempo.bpm);
        assert!(tempo.confidence > 0.5);
    }

    #[test]
    fn test_estimate_tempo_flat_envelope() {
        assert!(estimate_tempo(&vec![0.3; 400], 40.0, 60.0, 200.0).is_none());
        assert!(estimate_tempo(&[], 40.0, 60.0, 200.0).is_none());
    }

    #[test]
    fn test_beat_grid_finds_phase() {
        let envelope = pulses(400, 20, 7);
        let beats = beat_grid(&envelope, 40.0, 120.0, 10.0);
        assert_eq!(beats.len(), 20);
        assert!((beats[0].start - 7.0 / 40.0).abs() < 1e-9);
        assert!((beats[1].start - beats[0].start - 0.5).abs() < 1e-9);
        assert!(beats.iter().all(|b| b.confidence > 0.99));
        let last = beats.last().unwrap();
        assert!(last.start + last.duration <= 10.0 + 1e-9);
    }

    #[test]
    fn test_beat_grid_empty_inputs() {
        assert!(beat_grid(&[], 40.0, 120.0, 10.0).is_empty());
        assert!(beat_grid(&[1.0; 10], 40.0, 120.0, 0.0).is_empty());
    }

    #[test]
    fn test_subdivide_and_group() {
        let beats: Vec<TimeQuantum> = (0..8).map(|i| beat(i as f64 * 0.5, 1.0)).collect();

        let tatums = subdivide(&beats, 2);
        assert_eq!(tatums.len(), 16);
        assert!((tatums[1].start - 0.25).abs() < 1e-12);

        let bars = group(&beats, 4);
        assert_eq!(bars.len(), 2);
        assert!((bars[1].start - 2.0).abs() < 1e-12);
        assert!((bars[1].duration - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_meter_waltz() {
        let beats: Vec<TimeQuantum> = (0..24)
            .map(|i| beat(i as f64 * 0.5, if i % 3 == 1 { 1.0 } else { 0.2 }))
            .collect();
        let meter = estimate_meter(&beats);
        assert_eq!(meter.beats_per_bar, 3);
        assert_eq!(meter.downbeat, 1);
    }

    #[test]
    fn test_estimate_meter_common_time() {
        let beats: Vec<TimeQuantum> = (0..32)
            .map(|i| beat(i as f64 * 0.5, if i % 4 == 0 { 1.0 } else { 0.3 }))
            .collect();
        let meter = estimate_meter(&beats);
        assert_eq!(meter.beats_per_bar, 4);
        assert_eq!(meter.downbeat, 0);
        assert!(meter.confidence > 0.0);
    }
}
