//! Spatial grouping of correspondences by scene-side proximity.

use patloc_core::{Correspondence, Keypoint, Point2};

/// One spatially coherent group of correspondences, presumed to originate
/// from a single template instance.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Member correspondences in BFS discovery order
    pub matches: Vec<Correspondence>,
    /// Scene-side locations of the members whose scene index resolved
    pub scene_points: Vec<Point2>,
}

/// Partition correspondences into connected components.
///
/// Two correspondences are adjacent iff their scene-side points are closer
/// than `radius` (strict). Components are grown breadth-first, seeded from
/// each unvisited correspondence in input order, so cluster order follows
/// seed discovery and is stable but not spatial.
///
/// A correspondence whose `scene_idx` does not resolve against `scene_kps`
/// still occupies its visited slot and stays a member of whatever cluster
/// reached it, but contributes no point and no adjacency.
pub fn cluster_matches(
    matches: &[Correspondence],
    scene_kps: &[Keypoint],
    radius: f32,
) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut visited = vec![false; matches.len()];

    for seed in 0..matches.len() {
        if visited[seed] {
            continue;
        }

        let mut members = Vec::new();
        let mut scene_points = Vec::new();
        let mut queue = vec![seed];
        visited[seed] = true;
        let mut head = 0;

        while head < queue.len() {
            let current = queue[head];
            head += 1;
            members.push(matches[current]);

            let Some(kp) = scene_kps.get(matches[current].scene_idx) else {
                continue;
            };
            let here = Point2::from(kp);
            scene_points.push(here);

            for (j, other) in matches.iter().enumerate() {
                if visited[j] {
                    continue;
                }
                let Some(other_kp) = scene_kps.get(other.scene_idx) else {
                    continue;
                };
                if here.distance(&Point2::from(other_kp)) < radius {
                    visited[j] = true;
                    queue.push(j);
                }
            }
        }

        clusters.push(Cluster { matches: members, scene_points });
    }

    clusters
}
