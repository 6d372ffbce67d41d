//! Path lookup inside a single method bucket.
//!
//! Exact routes are probed first with a map lookup and always win. Pattern
//! routes are then tried in registration order and the first one whose
//! matcher accepts the path (and whose captures all coerce) wins. There is
//! no specificity ranking.
use std::sync::Arc;

use crate::core::{params::Params, route::Route, table::MethodBucket};

/// Characters stripped from both ends of an incoming path.
const TRIMMED: &[char] = &['/', ' ', '\n', '\r', '\t', '\x0B', '\0'];

/// Trim slashes, spaces and control padding from both ends.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches(TRIMMED)
}

/// Trim slashes from both ends of a route template.
pub fn normalize_template(template: &str) -> &str {
    template.trim_matches('/')
}

/// Resolved route plus decoded parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    route: Arc<Route>,
    params: Params,
}

impl RouteMatch {
    pub fn new(route: Arc<Route>, params: Params) -> Self {
        Self { route, params }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_parts(self) -> (Arc<Route>, Params) {
        (self.route, self.params)
    }
}

pub struct PathFinder;

impl PathFinder {
    /// Find the route for an already normalized path. `None` is a plain
    /// miss so the caller can fall back to another bucket.
    pub fn find(bucket: &MethodBucket, path: &str) -> Option<RouteMatch> {
        if let Some(route) = bucket.exact(path) {
            return Some(RouteMatch::new(route.clone(), Params::default()));
        }

        bucket.patterns().iter().find_map(|candidate| {
            candidate
                .pattern()
                .captures(path)
                .map(|params| RouteMatch::new(candidate.route().clone(), params))
        })
    }
}
