//! Shape sanity checks for projected template quadrilaterals.

use patloc_core::Point2;

/// Quadrilateral area via the shoelace formula (absolute value).
pub fn quad_area(corners: &[Point2; 4]) -> f64 {
    let mut twice = 0.0f64;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        twice += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    twice.abs() * 0.5
}

/// Convexity test: every edge-to-edge cross product carries the same sign.
/// Collinear corners (zero cross) do not flip the verdict on their own; a
/// fully collapsed quad is caught by the area band instead.
pub fn is_convex(corners: &[Point2; 4]) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = (b.x as f64 - a.x as f64) * (c.y as f64 - b.y as f64)
            - (b.y as f64 - a.y as f64) * (c.x as f64 - b.x as f64);
        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }
    true
}

/// Containment for a convex quadrilateral, boundary inclusive. Callers check
/// `is_convex` first; for non-convex input the answer is meaningless.
pub fn contains_point(corners: &[Point2; 4], p: Point2) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let cross = (b.x as f64 - a.x as f64) * (p.y as f64 - a.y as f64)
            - (b.y as f64 - a.y as f64) * (p.x as f64 - a.x as f64);
        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }
    true
}

/// Template-relative acceptance band for the projected area. Degenerate
/// template areas switch to absolute pixel bounds so the relative band never
/// divides by a vanishing area.
pub fn area_in_band(area: f64, template_area: f64) -> bool {
    if template_area > 1e-5 {
        area >= 0.05 * template_area && area <= 200.0 * template_area
    } else {
        (10.0..=500_000.0).contains(&area)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Aabb {
    /// None for an empty point set.
    pub fn from_points(pts: &[Point2]) -> Option<Self> {
        let first = pts.first()?;
        let mut b = Aabb {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for p in &pts[1..] {
            b.min_x = b.min_x.min(p.x);
            b.max_x = b.max_x.max(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    /// Degenerate when either extent collapses below epsilon.
    pub fn is_degenerate(&self, epsilon: f32) -> bool {
        self.max_x <= self.min_x + epsilon || self.max_y <= self.min_y + epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f32) -> [Point2; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    #[test]
    fn square_area() {
        assert!((quad_area(&square(10.0)) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn winding_does_not_change_area() {
        let q = square(4.0);
        let reversed = [q[3], q[2], q[1], q[0]];
        assert_eq!(quad_area(&q), quad_area(&reversed));
    }

    #[test]
    fn convexity() {
        assert!(is_convex(&square(5.0)));
        // bow-tie (self-intersecting)
        let bowtie = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(!is_convex(&bowtie));
        // dart (one reflex corner)
        let dart = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(!is_convex(&dart));
    }

    #[test]
    fn containment_boundary_inclusive() {
        let q = square(10.0);
        assert!(contains_point(&q, Point2::new(5.0, 5.0)));
        assert!(contains_point(&q, Point2::new(0.0, 0.0)));
        assert!(contains_point(&q, Point2::new(10.0, 5.0)));
        assert!(!contains_point(&q, Point2::new(10.1, 5.0)));
        assert!(!contains_point(&q, Point2::new(-0.1, 3.0)));
    }

    #[test]
    fn area_band_relative() {
        let ta = 100.0;
        assert!(area_in_band(100.0, ta));
        assert!(area_in_band(5.0, ta));
        assert!(area_in_band(20_000.0, ta));
        assert!(!area_in_band(4.9, ta));
        assert!(!area_in_band(20_001.0, ta));
    }

    #[test]
    fn area_band_degenerate_template() {
        assert!(area_in_band(10.0, 0.0));
        assert!(area_in_band(500_000.0, 0.0));
        assert!(!area_in_band(9.9, 0.0));
        assert!(!area_in_band(500_001.0, 0.0));
    }

    #[test]
    fn aabb_basics() {
        assert!(Aabb::from_points(&[]).is_none());
        let pts = [
            Point2::new(1.0, 5.0),
            Point2::new(-3.0, 2.0),
            Point2::new(4.0, -1.0),
        ];
        let b = Aabb::from_points(&pts).unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (-3.0, 4.0, -1.0, 5.0));
        assert!(!b.is_degenerate(1e-5));
        let single = Aabb::from_points(&[Point2::new(2.0, 2.0)]).unwrap();
        assert!(single.is_degenerate(1e-5));
    }
}
