//! Key estimation by correlating chroma against Krumhansl-Kessler profiles

use super::model::{KeySignature, Mode};

/// Krumhansl-Kessler major profile, tonic first
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor profile, tonic first
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Pearson correlation of `chroma` with `profile` rotated to `tonic`
fn correlate(chroma: &[f32; 12], profile: &[f32; 12], tonic: usize) -> f32 {
    let rotated: Vec<f32> = (0..12).map(|pc| profile[(pc + 12 - tonic) % 12]).collect();

    let mean_c = chroma.iter().sum::<f32>() / 12.0;
    let mean_p = rotated.iter().sum::<f32>() / 12.0;

    let mut cov = 0.0;
    let mut var_c = 0.0;
    let mut var_p = 0.0;
    for (c, p) in chroma.iter().zip(rotated.iter()) {
        let dc = c - mean_c;
        let dp = p - mean_p;
        cov += dc * dp;
        var_c += dc * dc;
        var_p += dp * dp;
    }

    if var_c <= f32::EPSILON || var_p <= f32::EPSILON {
        return 0.0;
    }
    cov / (var_c.sqrt() * var_p.sqrt())
}

/// Best matching key for a chroma vector, or `None` when it carries no tonal information
pub fn estimate_key(chroma: &[f32; 12]) -> Option<KeySignature> {
    let mut best: Option<(usize, Mode, f32)> = None;

    for tonic in 0..12 {
        for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
            let score = correlate(chroma, profile, tonic);
            if best.is_none_or(|(_, _, s)| score > s) {
                best = Some((tonic, mode, score));
            }
        }
    }

    match best {
        Some((tonic, mode, score)) if score > 0.0 => Some(KeySignature {
            tonic: tonic as u8,
            mode,
            confidence: score.clamp(0.0, 1.0) as f64,
        }),
        _ => None,
    }
}
