//! Section boundary detection
//!
//! Frame features are pooled into fixed-length blocks, z-scored per
//! dimension, and compared pairwise by cosine similarity. A Gaussian-tapered
//! checkerboard kernel slid along the diagonal of that matrix yields a
//! novelty curve whose strongest, well-separated peaks become boundaries.

use super::features::FrameFeatures;

/// Tuning for boundary detection
#[derive(Debug, Clone)]
pub struct StructureConfig {
    /// Length of one feature block in seconds
    pub block_secs: f64,
    /// Full checkerboard kernel width in blocks
    pub kernel_blocks: usize,
    /// Shortest allowed section in seconds
    pub min_section_secs: f64,
    /// Peaks must exceed mean + `peak_alpha` * std of the novelty curve
    pub peak_alpha: f32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            block_secs: 2.0,
            kernel_blocks: 16,
            min_section_secs: 8.0,
            peak_alpha: 0.5,
        }
    }
}

/// A detected change point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Position in seconds
    pub time: f64,
    /// Normalised novelty at the boundary, 0..=1
    pub strength: f64,
}

/// Pool frames into blocks of loudness, brightness and chroma
pub fn block_features(frames: &[FrameFeatures], frames_per_block: usize) -> Vec<Vec<f32>> {
    frames
        .chunks(frames_per_block.max(1))
        .map(|block| {
            let n = block.len() as f32;
            let mut v = vec![0.0f32; 14];
            for frame in block {
                v[0] += frame.rms_db / n;
                v[1] += frame.centroid / n;
                for (acc, c) in v[2..].iter_mut().zip(frame.chroma.iter()) {
                    *acc += c / n;
                }
            }
            v
        })
        .collect()
}

/// Z-score every dimension across blocks; constant dimensions become zero
pub fn standardize(blocks: &mut [Vec<f32>]) {
    if blocks.is_empty() {
        return;
    }
    let dims = blocks[0].len();
    let n = blocks.len() as f32;

    for d in 0..dims {
        let mean = blocks.iter().map(|b| b[d]).sum::<f32>() / n;
        let var = blocks.iter().map(|b| (b[d] - mean).powi(2)).sum::<f32>() / n;
        let std = var.sqrt();
        for b in blocks.iter_mut() {
            b[d] = if std > 1e-6 { (b[d] - mean) / std } else { 0.0 };
        }
    }
}

/// Cosine similarity matrix; two all-zero blocks count as identical
pub fn self_similarity(blocks: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let norms: Vec<f32> = blocks
        .iter()
        .map(|b| b.iter().map(|x| x * x).sum::<f32>().sqrt())
        .collect();

    (0..blocks.len())
        .map(|i| {
            (0..blocks.len())
                .map(|j| {
                    let (ni, nj) = (norms[i], norms[j]);
                    if ni < 1e-6 && nj < 1e-6 {
                        1.0
                    } else if ni < 1e-6 || nj < 1e-6 {
                        0.0
                    } else {
                        let dot: f32 = blocks[i].iter().zip(&blocks[j]).map(|(a, b)| a * b).sum();
                        dot / (ni * nj)
                    }
                })
                .collect()
        })
        .collect()
}

/// Gaussian-tapered checkerboard kernel of even `size`
pub fn checkerboard_kernel(size: usize) -> Vec<Vec<f32>> {
    let half = size as f32 / 2.0;
    let sigma = half / 2.0;

    (0..size)
        .map(|i| {
            (0..size)
                .map(|j| {
                    let x = i as f32 - half + 0.5;
                    let y = j as f32 - half + 0.5;
                    let sign = (x * y).signum();
                    sign * (-(x * x + y * y) / (2.0 * sigma * sigma)).exp()
                })
                .collect()
        })
        .collect()
}

/// Novelty at every block boundary, normalised to a peak of 1
///
/// `novelty[i]` scores the change between block `i - 1` and block `i`.
pub fn novelty_curve(ssm: &[Vec<f32>], kernel_size: usize) -> Vec<f32> {
    let n = ssm.len();
    let mut novelty = vec![0.0f32; n];
    let size = kernel_size & !1;
    if size < 2 || n < size {
        return novelty;
    }

    let kernel = checkerboard_kernel(size);
    let kernel_mass: f32 = kernel.iter().flatten().map(|k| k.abs()).sum();
    let half = size / 2;

    for i in half..=(n - half) {
        let start = i - half;
        let mut score = 0.0f32;
        for (ki, row) in kernel.iter().enumerate() {
            for (kj, k) in row.iter().enumerate() {
                score += ssm[start + ki][start + kj] * k;
            }
        }
        novelty[i] = score.max(0.0);
    }

    // Rounding residue on homogeneous input must not be stretched into peaks
    let peak = novelty.iter().cloned().fold(0.0f32, f32::max);
    if peak < 1e-3 * kernel_mass {
        return vec![0.0; n];
    }
    novelty.iter_mut().for_each(|v| *v /= peak);
    novelty
}

/// Strongest local maxima at least `min_gap` apart and from either end
pub fn pick_peaks(novelty: &[f32], min_gap: usize, alpha: f32) -> Vec<usize> {
    let n = novelty.len();
    if n < 3 {
        return Vec::new();
    }

    let mean = novelty.iter().sum::<f32>() / n as f32;
    let std = (novelty.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n as f32).sqrt();
    let threshold = mean + alpha * std;

    let mut candidates: Vec<usize> = (1..n - 1)
        .filter(|&i| {
            let v = novelty[i];
            v > 0.0 && v > threshold && v >= novelty[i - 1] && v > novelty[i + 1]
        })
        .collect();
    candidates.sort_by(|&a, &b| novelty[b].total_cmp(&novelty[a]));

    let mut accepted: Vec<usize> = Vec::new();
    for i in candidates {
        if i < min_gap || n - i < min_gap {
            continue;
        }
        if accepted.iter().all(|&a| a.abs_diff(i) >= min_gap) {
            accepted.push(i);
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Internal section boundaries (not including time zero)
pub fn find_boundaries(
    frames: &[FrameFeatures],
    frame_rate: f32,
    config: &StructureConfig,
) -> Vec<Boundary> {
    let frames_per_block = ((config.block_secs * frame_rate as f64).round() as usize).max(1);
    let mut blocks = block_features(frames, frames_per_block);
    if blocks.len() < 4 {
        return Vec::new();
    }

    standardize(&mut blocks);
    let ssm = self_similarity(&blocks);
    let kernel_size = config.kernel_blocks.min(blocks.len());
    let novelty = novelty_curve(&ssm, kernel_size);
    let min_gap = ((config.min_section_secs / config.block_secs).ceil() as usize).max(1);

    pick_peaks(&novelty, min_gap, config.peak_alpha)
        .into_iter()
        .map(|i| Boundary {
            time: (i * frames_per_block) as f64 / frame_rate as f64,
            strength: novelty[i] as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rms_db: f32, centroid: f32, pc: usize) -> FrameFeatures {
        let mut chroma = [0.0f32; 12];
        chroma[pc] = 1.0;
        FrameFeatures {
            rms_db,
            flux: 0.0,
            centroid,
            chroma,
        }
    }

    #[test]
    fn test_kernel_quadrant_signs() {
        let k = checkerboard_kernel(4);
        assert!(k[0][0] > 0.0 && k[3][3] > 0.0);
        assert!(k[0][3] < 0.0 && k[3][0] < 0.0);
    }

    #[test]
    fn test_standardize_constant_dimension() {
        let mut blocks = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        standardize(&mut blocks);
        assert_eq!(blocks[0], vec![-1.0, 0.0]);
        assert_eq!(blocks[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_self_similarity_zero_blocks() {
        let ssm = self_similarity(&[vec![0.0, 0.0], vec![0.0, 0.0], vec![1.0, 0.0]]);
        assert_eq!(ssm[0][1], 1.0);
        assert_eq!(ssm[0][2], 0.0);
        assert!((ssm[2][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pick_peaks_respects_gap() {
        let mut novelty = vec![0.0f32; 40];
        novelty[10] = 1.0;
        novelty[12] = 0.9;
        novelty[25] = 0.8;
        novelty[38] = 0.95;
        assert_eq!(pick_peaks(&novelty, 4, 0.5), vec![10, 25]);
    }

    #[test]
    fn test_single_change_point() {
        // 1 frame per block at frame_rate 0.5 => 2 s blocks
        let mut frames: Vec<FrameFeatures> = (0..15).map(|_| frame(-30.0, 300.0, 0)).collect();
        frames.extend((0..15).map(|_| frame(-10.0, 3000.0, 7)));

        let boundaries = find_boundaries(&frames, 0.5, &StructureConfig::default());
        assert_eq!(boundaries.len(), 1);
        assert!((boundaries[0].time - 30.0).abs() < 1e-9);
        assert!((boundaries[0].strength - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_homogeneous_track_has_no_boundaries() {
        let frames: Vec<FrameFeatures> = (0..40).map(|_| frame(-20.0, 1000.0, 2)).collect();
        assert!(find_boundaries(&frames, 0.5, &StructureConfig::default()).is_empty());
    }
}
