//! Client-side read-model cache keyed by resource type.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    fetched_at: DateTime<Utc>,
}

/// Last fetched read model per resource (`"vehicles"`, `"leads"`, ...).
///
/// Realtime events invalidate the resource they touch so the next read
/// refetches.
#[derive(Debug, Default)]
pub struct ReadModelCache {
    entries: DashMap<String, Entry>,
    invalidations: DashMap<String, u64>,
}

impl ReadModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched read model.
    pub fn put(&self, resource: &str, value: Value) {
        self.entries.insert(
            resource.to_string(),
            Entry {
                value,
                fetched_at: Utc::now(),
            },
        );
    }

    /// The cached read model, if still valid.
    pub fn get(&self, resource: &str) -> Option<Value> {
        self.entries.get(resource).map(|e| e.value.clone())
    }

    /// When the cached model was fetched.
    pub fn fetched_at(&self, resource: &str) -> Option<DateTime<Utc>> {
        self.entries.get(resource).map(|e| e.fetched_at)
    }

    /// Drop the cached model. Returns whether one was cached.
    pub fn invalidate(&self, resource: &str) -> bool {
        *self
            .invalidations
            .entry(resource.to_string())
            .or_insert(0) += 1;
        let removed = self.entries.remove(resource).is_some();
        debug!(resource, removed, "Read model invalidated");
        removed
    }

    /// Drop every cached model.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// How often `resource` has been invalidated.
    pub fn invalidation_count(&self, resource: &str) -> u64 {
        self.invalidations.get(resource).map(|c| *c).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalidate() {
        let cache = ReadModelCache::new();
        cache.put("vehicles", json!([{"id": 1}]));
        assert!(cache.get("vehicles").is_some());

        assert!(cache.invalidate("vehicles"));
        assert!(cache.get("vehicles").is_none());
        assert!(!cache.invalidate("vehicles"));
        assert_eq!(cache.invalidation_count("vehicles"), 2);
        assert_eq!(cache.invalidation_count("leads"), 0);
    }
}
