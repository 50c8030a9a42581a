//! Per-circle, per-category result cache.
//!
//! Each layer manager owns one cache instance for its own record type.
//! Entries are keyed by `(service id, category key)` and the whole service
//! side is invalidated when its circle moves or is removed - stale geodata
//! must never be served for a new position.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::trace;

use crate::registry::ServiceId;

/// Cache of fetched records, keyed by `(service, category)`.
///
/// Lookups clone the stored vector; records are expected to be cheap to
/// clone (ids, names, coordinates).
pub struct ServiceDataCache<T> {
    entries: RwLock<HashMap<(ServiceId, String), Vec<T>>>,
}

impl<T: Clone> ServiceDataCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached records for a category, `None` on a miss.
    pub fn get(&self, service: ServiceId, category: &str) -> Option<Vec<T>> {
        self.entries
            .read()
            .ok()
            .and_then(|e| e.get(&(service, category.to_string())).cloned())
    }

    /// Whether a category has a cache entry (possibly empty).
    pub fn contains(&self, service: ServiceId, category: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(&(service, category.to_string())))
            .unwrap_or(false)
    }

    /// Store records for a category, replacing any previous entry.
    pub fn put(&self, service: ServiceId, category: impl Into<String>, items: Vec<T>) {
        if let Ok(mut e) = self.entries.write() {
            e.insert((service, category.into()), items);
        }
    }

    /// Drop every entry for a service.
    pub fn invalidate(&self, service: ServiceId) {
        if let Ok(mut e) = self.entries.write() {
            let before = e.len();
            e.retain(|(s, _), _| *s != service);
            trace!(%service, removed = before - e.len(), "cache invalidated");
        }
    }

    /// Total number of entries across all services.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for ServiceDataCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let cache: ServiceDataCache<u32> = ServiceDataCache::new();
        assert!(cache.get(ServiceId::Places, "cafe").is_none());

        cache.put(ServiceId::Places, "cafe", vec![1, 2, 3]);
        assert_eq!(cache.get(ServiceId::Places, "cafe").unwrap(), vec![1, 2, 3]);
        assert!(cache.contains(ServiceId::Places, "cafe"));
    }

    #[test]
    fn test_empty_entry_still_counts_as_cached() {
        let cache: ServiceDataCache<u32> = ServiceDataCache::new();
        cache.put(ServiceId::Places, "park", Vec::new());

        // A category that fetched zero results must not be re-fetched.
        assert!(cache.contains(ServiceId::Places, "park"));
        assert_eq!(cache.get(ServiceId::Places, "park").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_invalidate_clears_only_one_service() {
        let cache: ServiceDataCache<u32> = ServiceDataCache::new();
        cache.put(ServiceId::Places, "cafe", vec![1]);
        cache.put(ServiceId::Places, "market", vec![2]);
        cache.put(ServiceId::Roads, "highway", vec![3]);

        cache.invalidate(ServiceId::Places);

        assert!(cache.get(ServiceId::Places, "cafe").is_none());
        assert!(cache.get(ServiceId::Places, "market").is_none());
        assert_eq!(cache.get(ServiceId::Roads, "highway").unwrap(), vec![3]);
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let cache: ServiceDataCache<u32> = ServiceDataCache::new();
        cache.put(ServiceId::Buildings, "all", vec![1]);
        cache.put(ServiceId::Buildings, "all", vec![9, 9]);
        assert_eq!(cache.get(ServiceId::Buildings, "all").unwrap(), vec![9, 9]);
        assert_eq!(cache.len(), 1);
    }
}
