use crate::error::{BackendError, BackendResult};
use patloc_core::{Image, Keypoint};
use rayon::prelude::*;

/// Bresenham circle of radius 3 used by the segment test
const CIRCLE: [(i32, i32); 16] = [
    (-3, 0), (-3, 1), (-2, 2), (-1, 3),
    (0, 3), (1, 3), (2, 2), (3, 1),
    (3, 0), (3, -1), (2, -2), (1, -3),
    (0, -3), (-1, -3), (-2, -2), (-3, -1),
];

/// Ring pixels that must be brighter or darker than the center
const MIN_ARC: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct ScoredKeypoint {
    keypoint: Keypoint,
    response: f32,
}

/// FAST corner detector with intensity-centroid orientation.
///
/// Unlike a per-image detector this is sized per call: `detect` validates the
/// dimensions it is handed, because the localizer runs it on both the scene
/// and the (much smaller) template.
pub struct CornerDetector {
    threshold: u8,
    patch_size: usize,
    nms_distance: f32,
}

impl CornerDetector {
    pub fn new(threshold: u8, patch_size: usize) -> BackendResult<Self> {
        if threshold == 0 || threshold > 127 {
            return Err(BackendError::InvalidThreshold(threshold));
        }
        if patch_size % 2 == 0 || patch_size < 3 {
            return Err(BackendError::InvalidPatchSize { patch_size, min_image_dim: 0 });
        }
        Ok(Self { threshold, patch_size, nms_distance: 3.0 })
    }

    fn validate(&self, img: &Image, w: usize, h: usize) -> BackendResult<()> {
        if w == 0 || h == 0 {
            return Err(BackendError::InvalidImageSize { width: w, height: h });
        }
        if img.len() != w * h {
            return Err(BackendError::InvalidImageData {
                expected_len: w * h,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    pub fn detect(&self, img: &Image, w: usize, h: usize) -> BackendResult<Vec<Keypoint>> {
        self.validate(img, w, h)?;
        // The segment test needs a 3-pixel border; smaller images simply
        // have no interior and yield no keypoints.
        if w < 7 || h < 7 {
            return Ok(Vec::new());
        }

        let scored: Vec<ScoredKeypoint> = (3..h - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_hits = Vec::new();
                for x in 3..w - 3 {
                    let center = img[y * w + x];
                    let mut brighter = 0u32;
                    let mut darker = 0u32;
                    let mut contrast = 0i32;

                    for &(dx, dy) in &CIRCLE {
                        let q = img[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
                        if q >= center.saturating_add(self.threshold) {
                            brighter += 1;
                            contrast += q as i32 - center as i32;
                        } else if q.saturating_add(self.threshold) <= center {
                            darker += 1;
                            contrast += center as i32 - q as i32;
                        }
                    }

                    let arc = brighter.max(darker);
                    if arc >= MIN_ARC {
                        let angle = self.orientation(img, w, h, x, y);
                        row_hits.push(ScoredKeypoint {
                            keypoint: Keypoint { x: x as f32, y: y as f32, angle },
                            response: contrast as f32 / arc as f32,
                        });
                    }
                }
                row_hits
            })
            .collect();

        Ok(self.suppress(scored))
    }

    /// Orientation from the intensity centroid of the patch around (x, y).
    /// Patches that do not fit inside the image keep the default angle.
    fn orientation(&self, img: &Image, w: usize, h: usize, x: usize, y: usize) -> f32 {
        let half = (self.patch_size / 2) as i32;
        let (cx, cy) = (x as i32, y as i32);
        if cx - half < 0 || cy - half < 0 || cx + half >= w as i32 || cy + half >= h as i32 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for dy in -half..=half {
            let row = (cy + dy) as usize * w;
            for dx in -half..=half {
                let val = img[row + (cx + dx) as usize] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }
        (m01 as f32).atan2(m10 as f32)
    }

    /// Greedy non-maximum suppression: strongest responses first, drop any
    /// candidate closer than `nms_distance` to an already accepted corner.
    fn suppress(&self, mut scored: Vec<ScoredKeypoint>) -> Vec<Keypoint> {
        scored.sort_by(|a, b| {
            b.response
                .partial_cmp(&a.response)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let min_sq = self.nms_distance * self.nms_distance;
        let mut kept: Vec<ScoredKeypoint> = Vec::new();
        for cand in scored {
            let crowded = kept.iter().any(|k| {
                let dx = cand.keypoint.x - k.keypoint.x;
                let dy = cand.keypoint.y - k.keypoint.y;
                dx * dx + dy * dy < min_sq
            });
            if !crowded {
                kept.push(cand);
            }
        }
        kept.into_iter().map(|s| s.keypoint).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_image(w: usize, h: usize) -> Image {
        vec![128; w * h]
    }

    fn blob_image(w: usize, h: usize, centers: &[(usize, usize)]) -> Image {
        let mut img = vec![40u8; w * h];
        for &(cx, cy) in centers {
            for dy in -2i32..=2 {
                for dx in -2i32..=2 {
                    let x = cx as i32 + dx;
                    let y = cy as i32 + dy;
                    if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                        img[y as usize * w + x as usize] = 250;
                    }
                }
            }
        }
        img
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            CornerDetector::new(0, 15),
            Err(BackendError::InvalidThreshold(0))
        ));
        assert!(matches!(
            CornerDetector::new(200, 15),
            Err(BackendError::InvalidThreshold(200))
        ));
        assert!(matches!(
            CornerDetector::new(20, 16),
            Err(BackendError::InvalidPatchSize { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let det = CornerDetector::new(20, 15).unwrap();
        let img = vec![0u8; 50];
        assert!(matches!(
            det.detect(&img, 10, 10),
            Err(BackendError::InvalidImageData { .. })
        ));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let det = CornerDetector::new(20, 5).unwrap();
        let kps = det.detect(&flat_image(32, 32), 32, 32).unwrap();
        assert!(kps.is_empty());
    }

    #[test]
    fn tiny_image_is_empty_not_error() {
        let det = CornerDetector::new(20, 5).unwrap();
        let kps = det.detect(&flat_image(5, 5), 5, 5).unwrap();
        assert!(kps.is_empty());
    }

    #[test]
    fn detects_bright_blob() {
        let det = CornerDetector::new(20, 5).unwrap();
        let kps = det.detect(&blob_image(32, 32, &[(16, 16)]), 32, 32).unwrap();
        assert!(!kps.is_empty());
        for kp in &kps {
            assert!(kp.x >= 3.0 && kp.x < 29.0);
            assert!(kp.y >= 3.0 && kp.y < 29.0);
            assert!(kp.angle.is_finite());
        }
    }

    #[test]
    fn suppression_keeps_corners_apart() {
        let det = CornerDetector::new(20, 5).unwrap();
        let img = blob_image(64, 64, &[(16, 16), (48, 16), (32, 48)]);
        let kps = det.detect(&img, 64, 64).unwrap();
        for i in 0..kps.len() {
            for j in (i + 1)..kps.len() {
                let dx = kps[i].x - kps[j].x;
                let dy = kps[i].y - kps[j].y;
                assert!(
                    (dx * dx + dy * dy).sqrt() >= 3.0,
                    "corners too close after suppression"
                );
            }
        }
    }
}
