use patloc_core::{Descriptor, Image, Keypoint};
use rand::prelude::*;
use rayon::prelude::*;

const DESCRIPTOR_BITS: usize = 256;

/// Fixed seed for the comparison-pair pattern; every generator must produce
/// the same pattern or descriptors from different calls would not match.
const PATTERN_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Rotated-BRIEF descriptor generator.
///
/// The 256 pixel-comparison pairs are drawn once, uniformly within the patch
/// radius, from a fixed-seed generator; each pair is rotated by the keypoint
/// orientation before sampling so descriptors are rotation-invariant.
pub struct BriefDescriptor {
    w: usize,
    h: usize,
    pairs: Vec<(f32, f32, f32, f32)>,
}

impl BriefDescriptor {
    pub fn new(width: usize, height: usize, patch_size: usize) -> Self {
        assert!(width > 0 && height > 0);
        let radius = (patch_size / 2).max(1) as f32;
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let pairs = (0..DESCRIPTOR_BITS)
            .map(|_| {
                (
                    rng.gen_range(-radius..=radius),
                    rng.gen_range(-radius..=radius),
                    rng.gen_range(-radius..=radius),
                    rng.gen_range(-radius..=radius),
                )
            })
            .collect();
        Self { w: width, h: height, pairs }
    }

    pub fn describe(&self, img: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let mut d = [0u8; 32];
                for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
                    let v1 = self.sample(img, kp.x + c * dx1 - s * dy1, kp.y + s * dx1 + c * dy1);
                    let v2 = self.sample(img, kp.x + c * dx2 - s * dy2, kp.y + s * dx2 + c * dy2);
                    d[i / 8] |= ((v1 < v2) as u8) << (i % 8);
                }
                d
            })
            .collect()
    }

    /// Bilinear interpolation, clamping at the image border
    fn sample(&self, img: &Image, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();

        if x0 < 0.0 || y0 < 0.0 || x0 + 1.0 >= self.w as f32 || y0 + 1.0 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img[cy * self.w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;
        let xi = x0 as usize;
        let yi = y0 as usize;

        let p00 = img[yi * self.w + xi] as f32;
        let p10 = img[yi * self.w + xi + 1] as f32;
        let p01 = img[(yi + 1) * self.w + xi] as f32;
        let p11 = img[(yi + 1) * self.w + xi + 1] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;
        top * (1.0 - dy) + bottom * dy
    }
}
