//! Per-request middleware traversal.
//!
//! Six lanes are walked in a fixed order:
//!
//! 1. route priority
//! 2. group priority
//! 3. global priority
//! 4. global normal
//! 5. group normal
//! 6. route normal
//!
//! Priority lanes yield the most recently added middleware first, normal
//! lanes yield in registration order. Group lanes are skipped for routes
//! without a group. The chain is a cursor over shared route data, so
//! concurrent requests never disturb each other.
use crate::core::route::{MiddlewareLanes, MiddlewareRef, Route};

/// One of the six middleware lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    RoutePriority,
    GroupPriority,
    GlobalPriority,
    GlobalNormal,
    GroupNormal,
    RouteNormal,
}

impl Lane {
    pub const ORDER: [Lane; 6] = [
        Lane::RoutePriority,
        Lane::GroupPriority,
        Lane::GlobalPriority,
        Lane::GlobalNormal,
        Lane::GroupNormal,
        Lane::RouteNormal,
    ];

    pub fn is_priority(self) -> bool {
        matches!(
            self,
            Lane::RoutePriority | Lane::GroupPriority | Lane::GlobalPriority
        )
    }
}

/// Cursor yielding the middleware for one matched route.
#[derive(Debug, Clone)]
pub struct MiddlewareChain<'a> {
    route: &'a Route,
    global: &'a MiddlewareLanes,
    lane: usize,
    position: usize,
}

impl<'a> MiddlewareChain<'a> {
    pub fn new(route: &'a Route, global: &'a MiddlewareLanes) -> Self {
        Self {
            route,
            global,
            lane: 0,
            position: 0,
        }
    }

    /// Total middleware this chain will yield from the start.
    pub fn total(&self) -> usize {
        let group = self.route.group().map_or(0, |g| g.middleware().len());
        self.route.middleware().len() + group + self.global.len()
    }

    fn lanes_for(&self, lane: Lane) -> Option<&'a MiddlewareLanes> {
        match lane {
            Lane::RoutePriority | Lane::RouteNormal => Some(self.route.middleware()),
            Lane::GroupPriority | Lane::GroupNormal => self.route.group().map(|g| g.middleware()),
            Lane::GlobalPriority | Lane::GlobalNormal => Some(self.global),
        }
    }
}

impl<'a> Iterator for MiddlewareChain<'a> {
    type Item = (Lane, &'a MiddlewareRef);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&lane) = Lane::ORDER.get(self.lane) {
            let found = self.lanes_for(lane).and_then(|lanes| {
                if lane.is_priority() {
                    lanes.priority(self.position)
                } else {
                    lanes.normal(self.position)
                }
            });

            match found {
                Some(middleware) => {
                    self.position += 1;
                    return Some((lane, middleware));
                }
                None => {
                    self.lane += 1;
                    self.position = 0;
                }
            }
        }
        None
    }
}
