//! High-level template instance localization.
//!
//! `Localizer` wires a feature backend into the matching pipeline: distance
//! gate, scene-side spatial clustering, per-cluster homography verification,
//! and representative-point estimation. One call, one image pair, zero or
//! more actionable points.

mod cache;

pub use cache::TemplateCache;
pub use patloc_core::{
    Correspondence, FeatureBackend, Keypoint, LocateConfig, Point2, init_thread_pool,
};
pub use patloc_orb::OrbBackend;

use image::{DynamicImage, GrayImage};
use patloc_geom::{cluster_matches, point_from_cloud, point_in_quad, verify_instance};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Pipeline counters for one localization call.
///
/// `dropped_empty` counts clusters that produced no point because their
/// derived point cloud was empty (every member referenced an out-of-range
/// scene index) — lossy by design, but visible here instead of silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocateStats {
    pub raw_matches: usize,
    pub filtered_matches: usize,
    pub clusters: usize,
    pub verified: usize,
    pub fallbacks: usize,
    pub dropped_empty: usize,
}

/// Keep a correspondence iff its distance clears the adaptive gate:
/// `distance <= max(multiplier * min_distance, floor)`.
///
/// The absolute floor matters when every distance is small (near-duplicate
/// templates) and a purely relative threshold would prune everything.
pub fn filter_matches(
    matches: &[Correspondence],
    multiplier: f32,
    floor: f32,
) -> Vec<Correspondence> {
    let min_dist = matches
        .iter()
        .map(|m| m.distance)
        .fold(f32::INFINITY, f32::min);
    let threshold = (multiplier * min_dist).max(floor);
    matches
        .iter()
        .filter(|m| m.distance <= threshold)
        .copied()
        .collect()
}

/// Scale/rotation-tolerant template locator over a pluggable feature backend.
pub struct Localizer<B: FeatureBackend = OrbBackend> {
    backend: B,
    config: LocateConfig,
}

impl Localizer<OrbBackend> {
    /// Localizer over the bundled FAST + BRIEF + Hamming backend.
    pub fn new(config: LocateConfig) -> Self {
        Self { backend: OrbBackend::default(), config }
    }
}

impl<B: FeatureBackend> Localizer<B> {
    pub fn with_backend(backend: B, config: LocateConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &LocateConfig {
        &self.config
    }

    /// Locate template instances in a scene. Both images are converted to
    /// grayscale internally; every failure path yields an empty list.
    pub fn locate(&self, scene: &DynamicImage, template: &DynamicImage) -> Vec<Point2> {
        let mut rng = StdRng::from_entropy();
        self.locate_with_rng(scene, template, &mut rng)
    }

    /// `locate` with a caller-supplied generator, for deterministic runs and
    /// for concurrent callers that manage their own RNG state.
    pub fn locate_with_rng<R: Rng>(
        &self,
        scene: &DynamicImage,
        template: &DynamicImage,
        rng: &mut R,
    ) -> Vec<Point2> {
        self.locate_gray(&scene.to_luma8(), &template.to_luma8(), rng).0
    }

    /// Full pipeline over already-grayscale images, with diagnostics.
    pub fn locate_gray<R: Rng>(
        &self,
        scene: &GrayImage,
        template: &GrayImage,
        rng: &mut R,
    ) -> (Vec<Point2>, LocateStats) {
        let mut stats = LocateStats::default();
        let cfg = &self.config;

        let (sw, sh) = scene.dimensions();
        let (tw, th) = template.dimensions();
        if sw == 0 || sh == 0 || tw == 0 || th == 0 {
            return (Vec::new(), stats);
        }

        let (template_kps, template_descs) =
            self.backend
                .extract(template.as_raw(), tw as usize, th as usize);
        if template_kps.is_empty() || template_descs.is_empty() {
            log::debug!("template yielded no features");
            return (Vec::new(), stats);
        }

        let (scene_kps, scene_descs) = self
            .backend
            .extract(scene.as_raw(), sw as usize, sh as usize);
        if scene_kps.is_empty() || scene_descs.is_empty() {
            log::debug!("scene yielded no features");
            return (Vec::new(), stats);
        }

        let raw = self.backend.match_descriptors(&template_descs, &scene_descs);
        stats.raw_matches = raw.len();

        let good = filter_matches(&raw, cfg.match_distance_multiplier, cfg.match_distance_floor);
        stats.filtered_matches = good.len();
        if good.is_empty() {
            return (Vec::new(), stats);
        }

        let template_diag = ((tw as f32).powi(2) + (th as f32).powi(2)).sqrt();
        let radius = template_diag * cfg.cluster_radius_factor;
        let clusters = cluster_matches(&good, &scene_kps, radius);
        stats.clusters = clusters.len();

        let mut points = Vec::new();
        for cluster in &clusters {
            let quad = if cluster.matches.len() >= cfg.min_matches_per_instance {
                verify_instance(
                    cluster,
                    &template_kps,
                    &scene_kps,
                    tw as f32,
                    th as f32,
                    cfg,
                    rng,
                )
            } else {
                None
            };

            if let Some(quad) = quad {
                stats.verified += 1;
                points.push(point_in_quad(&quad, cfg, rng));
                continue;
            }

            match point_from_cloud(&cluster.scene_points, cfg, rng) {
                Some(p) => {
                    stats.fallbacks += 1;
                    points.push(p);
                }
                None => {
                    stats.dropped_empty += 1;
                    log::warn!(
                        "cluster of {} correspondences dropped: empty scene point cloud",
                        cluster.matches.len()
                    );
                }
            }
        }

        log::debug!(
            "matches {}/{} kept, {} clusters -> {} verified, {} fallback, {} dropped",
            stats.filtered_matches,
            stats.raw_matches,
            stats.clusters,
            stats.verified,
            stats.fallbacks,
            stats.dropped_empty
        );
        (points, stats)
    }
}
