//! Per-method route storage.
//!
//! Every known method owns a bucket holding an exact-match map keyed by the
//! normalized template and an ordered list of pattern routes. Buckets are
//! filled by the router builder and read-only afterwards.
use std::{
    collections::HashMap,
    sync::Arc,
};

use http::Method;

use crate::core::{pattern::CompiledPattern, route::Route};

/// A registered pattern route together with its compiled matcher.
#[derive(Debug, Clone)]
pub struct PatternRoute {
    pub(crate) pattern: Arc<CompiledPattern>,
    pub(crate) route: Arc<Route>,
}

impl PatternRoute {
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }
}

/// Routes registered for a single method.
#[derive(Debug, Clone, Default)]
pub struct MethodBucket {
    exact: HashMap<String, Arc<Route>>,
    patterns: Vec<PatternRoute>,
}

impl MethodBucket {
    pub fn exact(&self, path: &str) -> Option<&Arc<Route>> {
        self.exact.get(path)
    }

    /// Pattern routes in registration order.
    pub fn patterns(&self) -> &[PatternRoute] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert_exact(&mut self, route: Arc<Route>) {
        self.exact.insert(route.template().to_string(), route);
    }

    pub(crate) fn insert_pattern(&mut self, pattern: Arc<CompiledPattern>, route: Arc<Route>) {
        self.patterns.push(PatternRoute { pattern, route });
    }
}

/// Method → bucket partition of every registered route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    buckets: HashMap<Method, MethodBucket>,
}

impl RouteTable {
    /// Empty table with one bucket per method.
    pub fn with_methods<'a>(methods: impl IntoIterator<Item = &'a Method>) -> Self {
        Self {
            buckets: methods
                .into_iter()
                .map(|method| (method.clone(), MethodBucket::default()))
                .collect(),
        }
    }

    pub fn bucket(&self, method: &Method) -> Option<&MethodBucket> {
        self.buckets.get(method)
    }

    pub(crate) fn bucket_mut(&mut self, method: &Method) -> Option<&mut MethodBucket> {
        self.buckets.get_mut(method)
    }

    pub fn has_method(&self, method: &Method) -> bool {
        self.buckets.contains_key(method)
    }

    /// Same buckets, no routes.
    pub fn cleared(&self) -> Self {
        Self::with_methods(self.buckets.keys())
    }

    /// Total routes across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(MethodBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every route, exact ones of a bucket before its patterns. Bucket order
    /// is unspecified.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.buckets.values().flat_map(|bucket| {
            bucket
                .exact
                .values()
                .chain(bucket.patterns.iter().map(|p| &p.route))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::route::{HandlerTarget, MiddlewareLanes, Reference};

    fn route(method: Method, template: &str) -> Arc<Route> {
        Arc::new(Route::new(
            method,
            template.to_string(),
            HandlerTarget::new(Reference::key("H")),
            None,
            MiddlewareLanes::default(),
        ))
    }

    #[test]
    fn test_cleared_keeps_buckets() {
        let mut table = RouteTable::with_methods(&[Method::GET, Method::POST]);
        table
            .bucket_mut(&Method::GET)
            .unwrap()
            .insert_exact(route(Method::GET, "health"));
        assert_eq!(table.len(), 1);

        let cleared = table.cleared();
        assert!(cleared.is_empty());
        assert!(cleared.has_method(&Method::GET));
        assert!(cleared.has_method(&Method::POST));
        assert!(!cleared.has_method(&Method::PUT));
    }
}
