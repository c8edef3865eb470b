use patloc_core::{Correspondence, Descriptor};
use rayon::prelude::*;

/// Hamming distance between two 256-bit descriptors
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Brute-force 1-NN matcher over binary descriptors.
///
/// Produces one correspondence per template descriptor: the scene descriptor
/// with the smallest Hamming distance. No ratio test here; the distance gate
/// downstream owns the filtering policy.
pub struct HammingMatcher;

impl HammingMatcher {
    pub fn match_descriptors(
        template: &[Descriptor],
        scene: &[Descriptor],
    ) -> Vec<Correspondence> {
        if template.is_empty() || scene.is_empty() {
            return Vec::new();
        }
        template
            .par_iter()
            .enumerate()
            .map(|(ti, td)| {
                let mut best_idx = 0usize;
                let mut best_dist = u32::MAX;
                for (si, sd) in scene.iter().enumerate() {
                    let d = hamming(td, sd);
                    if d < best_dist {
                        best_dist = d;
                        best_idx = si;
                    }
                }
                Correspondence {
                    template_idx: ti,
                    scene_idx: best_idx,
                    distance: best_dist as f32,
                }
            })
            .collect()
    }
}
