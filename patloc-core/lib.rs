#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point = corner location + orientation (radians) in pixel coordinates
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// 2D point in scene-image pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<&Keypoint> for Point2 {
    fn from(kp: &Keypoint) -> Self {
        Self { x: kp.x, y: kp.y }
    }
}

/// Claimed pairing between one template keypoint and one scene keypoint.
///
/// Indices refer into the keypoint sets of the localization call that
/// produced the correspondence; `distance` is the descriptor distance
/// reported by the matcher (Hamming bits for the default backend).
#[derive(Debug, Clone, Copy)]
pub struct Correspondence {
    pub template_idx: usize,
    pub scene_idx: usize,
    pub distance: f32,
}

/// Capability interface for pluggable extraction/matching backends.
///
/// The localization pipeline only ever talks to a backend through these two
/// operations, so alternative feature types can be swapped in without
/// touching clustering or verification.
pub trait FeatureBackend {
    /// Detect keypoints and compute their descriptors for one image.
    fn extract(&self, img: &Image, width: usize, height: usize) -> (Vec<Keypoint>, Vec<Descriptor>);

    /// For each template descriptor, find the best-scoring scene descriptor.
    fn match_descriptors(
        &self,
        template: &[Descriptor],
        scene: &[Descriptor],
    ) -> Vec<Correspondence>;
}

/// Per-call numeric policy for the localization pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocateConfig {
    /// RANSAC reprojection tolerance in pixels (smaller = stricter fit)
    pub ransac_reproj_thresh: f64,
    /// Maximum RANSAC iterations per homography fit
    pub ransac_max_iters: usize,
    /// Keep a match iff distance <= max(multiplier * min_distance, floor)
    pub match_distance_multiplier: f32,
    /// Absolute floor for the match-distance gate; prevents over-pruning
    /// when all distances are small (near-duplicate templates)
    pub match_distance_floor: f32,
    /// Cluster adjacency threshold = template diagonal * this factor
    pub cluster_radius_factor: f32,
    /// Minimum correspondences before homography verification is attempted
    pub min_matches_per_instance: usize,
    /// Sampling-box shrink toward the centroid (0 = centroid only, 1 = full AABB)
    pub sample_shrink_factor: f32,
    /// Degeneracy epsilon for AABB and sampling-range comparisons
    pub sample_epsilon: f32,
    /// Rejection-sampling attempts before falling back to the centroid
    pub sample_max_tries: u32,
    /// Randomize the representative point instead of returning the centroid
    pub random_sampling: bool,
    /// Worker threads for the default backend
    pub n_threads: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            ransac_reproj_thresh: 5.0,
            ransac_max_iters: 2000,
            // Hamming-distance defaults; the gate itself is metric-agnostic
            match_distance_multiplier: 2.0,
            match_distance_floor: 64.0,
            cluster_radius_factor: 1.5,
            min_matches_per_instance: 4,
            sample_shrink_factor: 0.6,
            sample_epsilon: 1e-5,
            sample_max_tries: 20,
            random_sampling: true,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn keypoint_to_point() {
        let kp = Keypoint { x: 7.5, y: -2.0, angle: 0.3 };
        let p = Point2::from(&kp);
        assert_eq!(p.x, 7.5);
        assert_eq!(p.y, -2.0);
    }

    #[test]
    fn default_config_is_sane() {
        let cfg = LocateConfig::default();
        assert!(cfg.ransac_reproj_thresh > 0.0);
        assert!(cfg.min_matches_per_instance >= 4);
        assert!(cfg.sample_shrink_factor >= 0.0 && cfg.sample_shrink_factor <= 1.0);
        assert!(cfg.n_threads >= 1);
    }
}
