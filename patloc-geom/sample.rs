//! Representative-point estimation.
//!
//! One 2D point per detected or suspected instance. A fixed centroid is easy
//! to fingerprint by automated-interaction detectors, so when
//! `random_sampling` is on the point is drawn from a sampling box shrunk
//! toward the centroid instead of returned verbatim.

use crate::quad::{Aabb, contains_point};
use patloc_core::{LocateConfig, Point2};
use rand::Rng;

fn centroid(points: &[Point2]) -> Point2 {
    let n = points.len() as f32;
    let sx: f32 = points.iter().map(|p| p.x).sum();
    let sy: f32 = points.iter().map(|p| p.y).sum();
    Point2::new(sx / n, sy / n)
}

/// Sampling box: each half-extent from the centroid to the AABB edge is
/// clamped to non-negative, scaled by the shrink factor, and re-centered.
fn shrunk_box(center: Point2, bounds: &Aabb, shrink: f32) -> Aabb {
    let ext_xn = (center.x - bounds.min_x).max(0.0);
    let ext_xp = (bounds.max_x - center.x).max(0.0);
    let ext_yn = (center.y - bounds.min_y).max(0.0);
    let ext_yp = (bounds.max_y - center.y).max(0.0);
    Aabb {
        min_x: center.x - ext_xn * shrink,
        max_x: center.x + ext_xp * shrink,
        min_y: center.y - ext_yn * shrink,
        max_y: center.y + ext_yp * shrink,
    }
}

/// Representative point for a verified quadrilateral.
///
/// Rejection-samples the shrunk box until a draw lands inside (or on the
/// boundary of) the quad; any degeneracy or exhausted tries falls back to
/// the corner centroid.
pub fn point_in_quad<R: Rng>(corners: &[Point2; 4], cfg: &LocateConfig, rng: &mut R) -> Point2 {
    let center = centroid(corners);
    if !cfg.random_sampling {
        return center;
    }

    let eps = cfg.sample_epsilon;
    let Some(bounds) = Aabb::from_points(corners) else {
        return center;
    };
    if bounds.is_degenerate(eps) {
        return center;
    }

    let sample = shrunk_box(center, &bounds, cfg.sample_shrink_factor);
    if sample.is_degenerate(eps) {
        return center;
    }

    for _ in 0..cfg.sample_max_tries {
        let candidate = Point2::new(
            rng.gen_range(sample.min_x..sample.max_x),
            rng.gen_range(sample.min_y..sample.max_y),
        );
        if contains_point(corners, candidate) {
            return candidate;
        }
    }
    center
}

/// Representative point for a raw scene-point cloud (clusters that were not
/// or could not be verified). Returns None only for an empty cloud.
///
/// Unlike the quad case there is no boundary to test against, so a single
/// draw from the (possibly axis-degenerate) sampling box is returned as-is.
pub fn point_from_cloud<R: Rng>(
    points: &[Point2],
    cfg: &LocateConfig,
    rng: &mut R,
) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }

    let center = centroid(points);
    if !cfg.random_sampling || points.len() < 2 {
        return Some(center);
    }

    let eps = cfg.sample_epsilon;
    let Some(bounds) = Aabb::from_points(points) else {
        return Some(center);
    };
    if bounds.is_degenerate(eps) {
        return Some(center);
    }

    let mut sample = shrunk_box(center, &bounds, cfg.sample_shrink_factor);

    // An axis can collapse on its own (all mass on one side of the centroid,
    // or shrink factor 0). Keep the distribution alive with a tiny symmetric
    // interval when the original axis range was real, otherwise pin the axis
    // to the centroid.
    if sample.max_x <= sample.min_x + eps {
        if bounds.max_x - bounds.min_x > eps && cfg.sample_shrink_factor > eps {
            sample.min_x = center.x - eps * 10.0;
            sample.max_x = center.x + eps * 10.0;
        } else {
            sample.min_x = center.x;
            sample.max_x = center.x;
        }
    }
    if sample.max_y <= sample.min_y + eps {
        if bounds.max_y - bounds.min_y > eps && cfg.sample_shrink_factor > eps {
            sample.min_y = center.y - eps * 10.0;
            sample.max_y = center.y + eps * 10.0;
        } else {
            sample.min_y = center.y;
            sample.max_y = center.y;
        }
    }
    if sample.min_x > sample.max_x {
        sample.min_x = center.x;
        sample.max_x = center.x;
    }
    if sample.min_y > sample.max_y {
        sample.min_y = center.y;
        sample.max_y = center.y;
    }

    let x = if sample.min_x < sample.max_x {
        rng.gen_range(sample.min_x..sample.max_x)
    } else {
        center.x
    };
    let y = if sample.min_y < sample.max_y {
        rng.gen_range(sample.min_y..sample.max_y)
    } else {
        center.y
    };
    Some(Point2::new(x, y))
}
