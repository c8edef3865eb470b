//! Per-cluster geometric verification.

use crate::cluster::Cluster;
use crate::homography;
use crate::quad::{area_in_band, is_convex, quad_area};
use patloc_core::{Keypoint, LocateConfig, Point2};
use rand::Rng;

/// Verify one cluster by fitting a template-to-scene homography over its
/// correspondences and sanity-checking the projected template outline.
///
/// Returns the projected corner quadrilateral (top-left, top-right,
/// bottom-right, bottom-left order) when the fit passes the convexity and
/// area checks; None is a per-cluster verification failure and the caller
/// falls back to the raw point cloud. The precondition that the cluster has
/// at least `min_matches_per_instance` members is the caller's.
pub fn verify_instance<R: Rng>(
    cluster: &Cluster,
    template_kps: &[Keypoint],
    scene_kps: &[Keypoint],
    template_w: f32,
    template_h: f32,
    cfg: &LocateConfig,
    rng: &mut R,
) -> Option<[Point2; 4]> {
    let mut template_pts = Vec::with_capacity(cluster.matches.len());
    let mut scene_pts = Vec::with_capacity(cluster.matches.len());
    for m in &cluster.matches {
        let (Some(tkp), Some(skp)) = (template_kps.get(m.template_idx), scene_kps.get(m.scene_idx))
        else {
            continue;
        };
        template_pts.push(Point2::from(tkp));
        scene_pts.push(Point2::from(skp));
    }

    if template_pts.len() < cfg.min_matches_per_instance {
        return None;
    }

    let h = homography::fit_ransac(
        &template_pts,
        &scene_pts,
        cfg.ransac_reproj_thresh,
        cfg.ransac_max_iters,
        rng,
    )
    .ok()?;
    if !homography::is_finite(&h) {
        return None;
    }

    let corners = [
        homography::project(&h, Point2::new(0.0, 0.0)),
        homography::project(&h, Point2::new(template_w, 0.0)),
        homography::project(&h, Point2::new(template_w, template_h)),
        homography::project(&h, Point2::new(0.0, template_h)),
    ];
    if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }

    let area = quad_area(&corners);
    let template_area = template_w as f64 * template_h as f64;
    if is_convex(&corners) && area_in_band(area, template_area) {
        Some(corners)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patloc_core::Correspondence;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid_kps(offset_x: f32, offset_y: f32, scale: f32) -> Vec<Keypoint> {
        let mut kps = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                kps.push(Keypoint {
                    x: offset_x + x as f32 * 20.0 * scale,
                    y: offset_y + y as f32 * 20.0 * scale,
                    angle: 0.0,
                });
            }
        }
        kps
    }

    fn one_to_one(n: usize) -> Cluster {
        let matches: Vec<Correspondence> = (0..n)
            .map(|i| Correspondence { template_idx: i, scene_idx: i, distance: 1.0 })
            .collect();
        Cluster { matches, scene_points: Vec::new() }
    }

    #[test]
    fn clean_translation_is_verified() {
        let template_kps = grid_kps(0.0, 0.0, 1.0);
        let scene_kps = grid_kps(200.0, 100.0, 1.0);
        let cluster = one_to_one(25);
        let mut rng = StdRng::seed_from_u64(1);

        let quad = verify_instance(
            &cluster,
            &template_kps,
            &scene_kps,
            100.0,
            100.0,
            &LocateConfig::default(),
            &mut rng,
        )
        .expect("clean translation must verify");

        // outline lands on the translated template rectangle
        assert!((quad[0].x - 200.0).abs() < 1.0 && (quad[0].y - 100.0).abs() < 1.0);
        assert!((quad[2].x - 300.0).abs() < 1.0 && (quad[2].y - 200.0).abs() < 1.0);
        let area = quad_area(&quad);
        assert!((area - 10_000.0).abs() / 10_000.0 < 0.05);
    }

    #[test]
    fn tiny_projected_area_is_rejected() {
        // scene shrunk to 1% of the template scale: area falls far below
        // the 0.05x relative bound
        let template_kps = grid_kps(0.0, 0.0, 1.0);
        let scene_kps = grid_kps(50.0, 50.0, 0.01);
        let cluster = one_to_one(25);
        let mut rng = StdRng::seed_from_u64(2);

        let quad = verify_instance(
            &cluster,
            &template_kps,
            &scene_kps,
            100.0,
            100.0,
            &LocateConfig::default(),
            &mut rng,
        );
        assert!(quad.is_none());
    }

    #[test]
    fn out_of_range_members_are_dropped_before_fitting() {
        let template_kps = grid_kps(0.0, 0.0, 1.0);
        let scene_kps = grid_kps(10.0, 10.0, 1.0);
        // half the members point past the keypoint sets; the remainder is
        // below the minimum
        let matches: Vec<Correspondence> = (0..6)
            .map(|i| Correspondence {
                template_idx: if i < 3 { i } else { 1000 + i },
                scene_idx: i,
                distance: 1.0,
            })
            .collect();
        let cluster = Cluster { matches, scene_points: Vec::new() };
        let mut rng = StdRng::seed_from_u64(3);

        let quad = verify_instance(
            &cluster,
            &template_kps,
            &scene_kps,
            100.0,
            100.0,
            &LocateConfig::default(),
            &mut rng,
        );
        assert!(quad.is_none());
    }
}
