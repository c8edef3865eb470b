mod describe;
mod detect;
mod error;
mod matcher;

pub use describe::BriefDescriptor;
pub use detect::CornerDetector;
pub use error::{BackendError, BackendResult};
pub use matcher::{HammingMatcher, hamming};

use patloc_core::{Correspondence, Descriptor, FeatureBackend, Image, Keypoint};

/// Default feature backend: FAST corners + rotated BRIEF + Hamming 1-NN.
pub struct OrbBackend {
    threshold: u8,
    patch_size: usize,
}

impl OrbBackend {
    pub fn new(threshold: u8, patch_size: usize) -> BackendResult<Self> {
        // Construct a detector once just to validate the parameters.
        CornerDetector::new(threshold, patch_size)?;
        Ok(Self { threshold, patch_size })
    }

    /// Fallible extraction for callers that want the validation errors.
    pub fn try_extract(
        &self,
        img: &Image,
        width: usize,
        height: usize,
    ) -> BackendResult<(Vec<Keypoint>, Vec<Descriptor>)> {
        let detector = CornerDetector::new(self.threshold, self.patch_size)?;
        let kps = detector.detect(img, width, height)?;
        if kps.is_empty() {
            return Ok((kps, Vec::new()));
        }
        let descriptor = BriefDescriptor::new(width, height, self.patch_size);
        let descs = descriptor.describe(img, &kps);
        Ok((kps, descs))
    }
}

impl Default for OrbBackend {
    fn default() -> Self {
        Self { threshold: 20, patch_size: 15 }
    }
}

impl FeatureBackend for OrbBackend {
    /// The pipeline contract is "no features" on any malformed input, so
    /// validation errors collapse to an empty extraction here.
    fn extract(&self, img: &Image, width: usize, height: usize) -> (Vec<Keypoint>, Vec<Descriptor>) {
        match self.try_extract(img, width, height) {
            Ok(out) => out,
            Err(e) => {
                log::warn!("feature extraction skipped: {}", e);
                (Vec::new(), Vec::new())
            }
        }
    }

    fn match_descriptors(
        &self,
        template: &[Descriptor],
        scene: &[Descriptor],
    ) -> Vec<Correspondence> {
        HammingMatcher::match_descriptors(template, scene)
    }
}
