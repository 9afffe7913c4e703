//! Rendered flower images keyed by genome.

use crate::genetics::FlowerImage;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    images: HashMap<String, FlowerImage>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, genome: impl Into<String>, image: FlowerImage) {
        self.images.insert(genome.into(), image);
    }

    #[must_use]
    pub fn get(&self, genome: &str) -> Option<&FlowerImage> {
        self.images.get(genome)
    }

    #[must_use]
    pub fn contains(&self, genome: &str) -> bool {
        self.images.contains_key(genome)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Evicts every image whose genome is not in `live`. Returns the number
    /// evicted.
    pub fn collect_garbage<'a>(&mut self, live: impl IntoIterator<Item = &'a str>) -> usize {
        let live: HashSet<&str> = live.into_iter().collect();
        let before = self.images.len();
        self.images.retain(|genome, _| live.contains(genome.as_str()));
        let evicted = before - self.images.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.images.len(), "Image cache collected");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> FlowerImage {
        FlowerImage {
            width: 1,
            height: 1,
            rgba: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn test_gc_keeps_only_live_genomes() {
        let mut cache = ImageCache::new();
        cache.insert("AAA", image());
        cache.insert("CCC", image());
        cache.insert("GGG", image());

        let evicted = cache.collect_garbage(["CCC", "TTT"]);
        assert_eq!(evicted, 2);
        assert!(cache.contains("CCC"));
        assert!(!cache.contains("AAA"));
        assert_eq!(cache.len(), 1);
    }
}
