use image::GrayImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-through cache of decoded grayscale templates, keyed by path.
///
/// Population happens through `&mut self`, so first-load races are ruled out
/// by the borrow checker; once filled, the cache (or the `Arc`s handed out)
/// can be shared read-only across threads.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: HashMap<PathBuf, Arc<GrayImage>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded template for `path`, loading and converting on first use.
    pub fn get_or_load(&mut self, path: &Path) -> image::ImageResult<Arc<GrayImage>> {
        if let Some(cached) = self.templates.get(path) {
            return Ok(Arc::clone(cached));
        }
        let decoded = Arc::new(image::open(path)?.to_luma8());
        self.templates.insert(path.to_path_buf(), Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Seed the cache with an already-decoded template.
    pub fn insert(&mut self, path: impl Into<PathBuf>, template: GrayImage) {
        self.templates.insert(path.into(), Arc::new(template));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.templates.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cache = TemplateCache::new();
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_then_hit() {
        let mut cache = TemplateCache::new();
        cache.insert("button.png", GrayImage::new(8, 8));
        assert!(cache.contains(Path::new("button.png")));
        assert_eq!(cache.len(), 1);

        let img = cache.get_or_load(Path::new("button.png")).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
        // still one entry: the hit did not reload
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error_not_an_entry() {
        let mut cache = TemplateCache::new();
        assert!(cache.get_or_load(Path::new("/nonexistent/t.png")).is_err());
        assert!(cache.is_empty());
    }
}
