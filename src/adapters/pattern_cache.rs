use std::sync::Arc;

use scc::HashMap;

use crate::{core::pattern::CompiledPattern, ports::pattern_cache::PatternCache};

/// Process-local compiled pattern cache backed by `scc::HashMap`.
///
/// Safe to share between builders on different threads. Entries are never
/// evicted; a router's template set is fixed once it is built.
#[derive(Default)]
pub struct SccPatternCache {
    entries: HashMap<String, Arc<CompiledPattern>>,
}

impl SccPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PatternCache for SccPatternCache {
    fn get(&self, template: &str) -> Option<Arc<CompiledPattern>> {
        self.entries.read_sync(template, |_, pattern| pattern.clone())
    }

    fn set(&self, template: &str, pattern: Arc<CompiledPattern>) {
        // A concurrent insert of the same template holds an identical pattern.
        let _ = self.entries.insert_sync(template.to_string(), pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_cache() {
        let cache = SccPatternCache::new();
        assert!(cache.get("user/{id}").is_none());

        let pattern = Arc::new(CompiledPattern::compile("user/{id}").unwrap());
        cache.set("user/{id}", pattern.clone());
        cache.set("user/{id}", pattern.clone());

        assert_eq!(cache.len(), 1);
        let cached = cache.get("user/{id}").unwrap();
        assert!(Arc::ptr_eq(&cached, &pattern));
    }
}
