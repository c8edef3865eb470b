//! Geometry for keypoint-based template localization: spatial clustering,
//! homography fitting, projected-quad sanity checks, and representative
//! point sampling.

pub mod cluster;
pub mod homography;
pub mod quad;
pub mod sample;
pub mod verify;

pub use cluster::{Cluster, cluster_matches};
pub use homography::{HomographyError, HomographyResult, fit_dlt, fit_ransac, project};
pub use quad::{Aabb, area_in_band, contains_point, is_convex, quad_area};
pub use sample::{point_from_cloud, point_in_quad};
pub use verify::verify_instance;
