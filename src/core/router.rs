//! Route registration and resolution.
//!
//! [`RouterBuilder`] collects groups and routes, validating each one as it
//! is added: unknown methods or groups, duplicate registrations and bad
//! templates are rejected immediately. [`RouterBuilder::build`] freezes the
//! result into a [`Router`], which resolves `(method, path)` pairs against
//! the method bucket first and the wildcard bucket second.
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use arc_swap::ArcSwap;
use http::Method;
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::{
    config::models::{DEFAULT_METHODS, DEFAULT_WILDCARD_METHOD, RouterConfig, RouterMode},
    core::{
        error::{ConfigError, ConfigResult, RouteError},
        path_finder::{PathFinder, RouteMatch, normalize_path, normalize_template},
        pattern::{CompiledPattern, PatternCompiler},
        route::{Group, HandlerTarget, MiddlewareLanes, MiddlewareRef, Route},
        table::RouteTable,
    },
    metrics::record_route_lookup,
    ports::pattern_cache::PatternCache,
};

static DEFAULT_WILDCARD: Lazy<Method> = Lazy::new(|| {
    Method::from_bytes(DEFAULT_WILDCARD_METHOD.as_bytes()).expect("valid method token")
});

/// Parse a configured method name. Names are upper-cased first.
pub fn parse_method(name: &str) -> ConfigResult<Method> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::UnknownMethod(name.to_string()))
}

fn default_methods() -> Vec<Method> {
    DEFAULT_METHODS
        .iter()
        .filter(|name| **name != DEFAULT_WILDCARD_METHOD)
        .filter_map(|name| Method::from_bytes(name.as_bytes()).ok())
        .collect()
}

pub(crate) fn join_prefix(prefix: &str, path: &str) -> String {
    let joined = format!("{}/{}", normalize_template(prefix), normalize_template(path));
    normalize_template(&joined).to_string()
}

struct GroupDraft {
    name: String,
    prefix: String,
    middleware: MiddlewareLanes,
}

struct RouteDraft {
    method: Method,
    template: String,
    target: HandlerTarget,
    group: Option<usize>,
    pattern: Option<Arc<CompiledPattern>>,
    middleware: MiddlewareLanes,
}

/// Collects groups and routes before the table is frozen.
pub struct RouterBuilder {
    mode: RouterMode,
    wildcard: Method,
    // Explicitly configured methods; the wildcard is added at lookup time.
    methods: Vec<Method>,
    compiler: PatternCompiler,
    groups: Vec<GroupDraft>,
    group_index: HashMap<String, usize>,
    routes: Vec<RouteDraft>,
    registered: HashSet<(Method, String)>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            mode: RouterMode::default(),
            wildcard: DEFAULT_WILDCARD.clone(),
            methods: default_methods(),
            compiler: PatternCompiler::new(),
            groups: Vec::new(),
            group_index: HashMap::new(),
            routes: Vec::new(),
            registered: HashSet::new(),
        }
    }

    pub fn mode(mut self, mode: RouterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the known methods. The wildcard method is always known,
    /// whichever order this and [`RouterBuilder::wildcard_method`] are called in.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Vec::new();
        for method in methods {
            if !self.methods.contains(&method) {
                self.methods.push(method);
            }
        }
        self
    }

    /// Replace the wildcard method. The previous wildcard stays known only
    /// if it was listed through [`RouterBuilder::methods`].
    pub fn wildcard_method(mut self, method: Method) -> Self {
        self.wildcard = method;
        self
    }

    fn is_known(&self, method: &Method) -> bool {
        *method == self.wildcard || self.methods.contains(method)
    }

    fn known_methods(&self) -> Vec<Method> {
        let mut known = self.methods.clone();
        if !known.contains(&self.wildcard) {
            known.push(self.wildcard.clone());
        }
        known
    }

    /// Share compiled patterns through `cache`.
    pub fn pattern_cache(mut self, cache: Arc<dyn PatternCache>) -> Self {
        self.compiler = PatternCompiler::with_cache(cache);
        self
    }

    /// Declare a group. Routes may only join groups declared beforehand, and
    /// the prefix must be literal.
    pub fn add_group(&mut self, name: &str, prefix: &str) -> ConfigResult<GroupRegistration<'_>> {
        if self.group_index.contains_key(name) {
            return Err(ConfigError::DuplicateGroup(name.to_string()));
        }
        if prefix.contains(['{', '}']) {
            return Err(ConfigError::InvalidTemplate {
                template: prefix.to_string(),
                reason: "group prefixes cannot contain placeholders".to_string(),
            });
        }

        let index = self.groups.len();
        self.groups.push(GroupDraft {
            name: name.to_string(),
            prefix: normalize_template(prefix).to_string(),
            middleware: MiddlewareLanes::default(),
        });
        self.group_index.insert(name.to_string(), index);

        Ok(GroupRegistration {
            builder: self,
            index,
        })
    }

    /// Register an ungrouped route.
    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        target: impl Into<HandlerTarget>,
    ) -> ConfigResult<RouteRegistration<'_>> {
        self.add_route_in(method, path, target, &[])
    }

    /// Register a route once per listed group, under each group's prefix.
    ///
    /// Nothing is registered when any of the expansions fails.
    pub fn add_route_in(
        &mut self,
        method: Method,
        path: &str,
        target: impl Into<HandlerTarget>,
        groups: &[&str],
    ) -> ConfigResult<RouteRegistration<'_>> {
        if !self.is_known(&method) {
            return Err(ConfigError::UnknownMethod(method.to_string()));
        }
        let target = target.into();

        let mut planned: Vec<(Option<usize>, String)> = Vec::with_capacity(groups.len().max(1));
        if groups.is_empty() {
            planned.push((None, normalize_template(path).to_string()));
        }
        for name in groups {
            let index = *self
                .group_index
                .get(*name)
                .ok_or_else(|| ConfigError::UnknownGroup(name.to_string()))?;
            planned.push((Some(index), join_prefix(&self.groups[index].prefix, path)));
        }

        let mut seen = HashSet::new();
        let mut drafts = Vec::with_capacity(planned.len());
        for (group, template) in planned {
            let key = (method.clone(), template.clone());
            if self.registered.contains(&key) || !seen.insert(key) {
                return Err(ConfigError::DuplicateRoute {
                    method: method.to_string(),
                    template,
                });
            }

            let pattern = if template.contains(['{', '}']) {
                Some(self.compiler.compile(&template)?)
            } else {
                None
            };

            drafts.push(RouteDraft {
                method: method.clone(),
                template,
                target: target.clone(),
                group,
                pattern,
                middleware: MiddlewareLanes::default(),
            });
        }

        let first = self.routes.len();
        for draft in drafts {
            debug!(method = %draft.method, template = %draft.template, handler = %draft.target.label(), "Registered route");
            self.registered
                .insert((draft.method.clone(), draft.template.clone()));
            self.routes.push(draft);
        }

        Ok(RouteRegistration {
            builder: self,
            routes: first..first + groups.len().max(1),
        })
    }

    /// Number of routes registered so far, group expansions included.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Freeze into a router. Routes keep their registration order.
    pub fn build(self) -> Router {
        let methods = self.known_methods();
        let groups: Vec<Arc<Group>> = self
            .groups
            .into_iter()
            .map(|draft| Arc::new(Group::new(draft.name, draft.prefix, draft.middleware)))
            .collect();

        let mut table = RouteTable::with_methods(&methods);
        for draft in self.routes {
            let group = draft.group.and_then(|index| groups.get(index).cloned());
            let route = Arc::new(Route::new(
                draft.method.clone(),
                draft.template,
                draft.target,
                group,
                draft.middleware,
            ));

            if let Some(bucket) = table.bucket_mut(&draft.method) {
                match draft.pattern {
                    Some(pattern) => bucket.insert_pattern(pattern, route),
                    None => bucket.insert_exact(route),
                }
            }
        }

        info!(
            routes = table.len(),
            groups = groups.len(),
            mode = ?self.mode,
            wildcard = %self.wildcard,
            "Router built"
        );

        Router {
            table: ArcSwap::from_pointee(table),
            wildcard: self.wildcard,
            mode: self.mode,
        }
    }

    /// Register everything a [`RouterConfig`] describes. Global middleware
    /// from the config is returned alongside the builder.
    pub fn from_config(config: &RouterConfig) -> ConfigResult<(Self, MiddlewareLanes)> {
        let methods = config
            .methods
            .iter()
            .map(|name| parse_method(name))
            .collect::<ConfigResult<Vec<_>>>()?;
        let mut builder = RouterBuilder::new()
            .mode(config.mode)
            .wildcard_method(parse_method(&config.wildcard_method)?)
            .methods(methods);

        let mut global = MiddlewareLanes::default();
        for key in &config.middleware {
            global.push_normal(key.as_str().into());
        }
        for key in &config.priority_middleware {
            global.push_priority(key.as_str().into());
        }

        for group in &config.groups {
            let mut registration = builder.add_group(&group.name, &group.prefix)?;
            for key in &group.middleware {
                registration = registration.middleware(key.as_str().into());
            }
            for key in &group.priority_middleware {
                registration = registration.priority_middleware(key.as_str().into());
            }
        }

        for route in &config.routes {
            let method = parse_method(&route.method)?;
            let target = HandlerTarget::parse(&route.handler)?;
            let groups: Vec<&str> = route.groups.iter().map(String::as_str).collect();

            let mut registration = builder.add_route_in(method, &route.path, target, &groups)?;
            for key in &route.middleware {
                registration = registration.middleware(key.as_str().into());
            }
            for key in &route.priority_middleware {
                registration = registration.priority_middleware(key.as_str().into());
            }
        }

        Ok((builder, global))
    }
}

/// Handle for attaching middleware to the routes one registration created.
pub struct RouteRegistration<'a> {
    builder: &'a mut RouterBuilder,
    routes: std::ops::Range<usize>,
}

impl RouteRegistration<'_> {
    /// Append normal middleware to every created route.
    pub fn middleware(self, middleware: MiddlewareRef) -> Self {
        for route in &mut self.builder.routes[self.routes.clone()] {
            route.middleware.push_normal(middleware.clone());
        }
        self
    }

    /// Add priority middleware to every created route.
    pub fn priority_middleware(self, middleware: MiddlewareRef) -> Self {
        for route in &mut self.builder.routes[self.routes.clone()] {
            route.middleware.push_priority(middleware.clone());
        }
        self
    }

    /// Templates created by this registration, one per group.
    pub fn templates(&self) -> Vec<&str> {
        self.builder.routes[self.routes.clone()]
            .iter()
            .map(|route| route.template.as_str())
            .collect()
    }
}

/// Handle for attaching middleware to a freshly declared group.
pub struct GroupRegistration<'a> {
    builder: &'a mut RouterBuilder,
    index: usize,
}

impl GroupRegistration<'_> {
    pub fn middleware(self, middleware: MiddlewareRef) -> Self {
        self.builder.groups[self.index]
            .middleware
            .push_normal(middleware);
        self
    }

    pub fn priority_middleware(self, middleware: MiddlewareRef) -> Self {
        self.builder.groups[self.index]
            .middleware
            .push_priority(middleware);
        self
    }
}

/// Frozen route table plus resolution rules.
pub struct Router {
    table: ArcSwap<RouteTable>,
    wildcard: Method,
    mode: RouterMode,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    pub fn wildcard_method(&self) -> &Method {
        &self.wildcard
    }

    /// Snapshot of the current table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Resolve a request line to a route and its parameters.
    ///
    /// An unknown method fails with `MethodNotAllowed` before any path
    /// matching. Otherwise the method's own bucket is searched, then the
    /// wildcard bucket. In single-shot mode the first success empties the
    /// table; a request racing that swap is answered with `NotFound`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteError> {
        let table = self.table.load();

        let Some(bucket) = table.bucket(method) else {
            record_route_lookup("method_not_allowed");
            return Err(RouteError::MethodNotAllowed {
                method: method.to_string(),
            });
        };

        let path = normalize_path(path);
        let mut outcome = "matched";
        let mut found = PathFinder::find(bucket, path);
        if found.is_none() && *method != self.wildcard {
            outcome = "wildcard";
            found = table
                .bucket(&self.wildcard)
                .and_then(|bucket| PathFinder::find(bucket, path));
        }

        let not_found = || RouteError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let Some(found) = found else {
            record_route_lookup("not_found");
            return Err(not_found());
        };

        if self.mode == RouterMode::SingleShot {
            let previous = self
                .table
                .compare_and_swap(&table, Arc::new(table.cleared()));
            if !Arc::ptr_eq(&*previous, &*table) {
                record_route_lookup("not_found");
                return Err(not_found());
            }
            debug!("Single-shot router consumed, route table cleared");
        }

        record_route_lookup(outcome);
        debug!(
            method = %method,
            path,
            template = found.route().template(),
            outcome,
            "Resolved route"
        );
        Ok(found)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.load().len())
            .field("wildcard", &self.wildcard)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        params::{ParamValue, Params},
        route::Reference,
    };

    fn target(key: &str) -> HandlerTarget {
        HandlerTarget::parse(key).unwrap()
    }

    fn any() -> Method {
        Method::from_bytes(b"ANY").unwrap()
    }

    #[test]
    fn test_exact_and_pattern_resolution() {
        let mut builder = Router::builder();
        builder.add_route(Method::GET, "/users/me", target("Users::me")).unwrap();
        builder
            .add_route(Method::GET, "/users/{id:int}", target("Users::show"))
            .unwrap();
        let router = builder.build();

        let me = router.resolve(&Method::GET, "/users/me/").unwrap();
        assert_eq!(me.route().target().label(), "Users::me");

        let show = router.resolve(&Method::GET, "users/42").unwrap();
        assert_eq!(show.params().get("id"), Some(&ParamValue::Int(42)));
    }

    #[test]
    fn test_unknown_method_is_method_not_allowed() {
        let mut builder = Router::builder();
        builder.add_route(any(), "ping", target("Ping")).unwrap();
        let router = builder.build();

        let method = Method::from_bytes(b"BREW").unwrap();
        assert_eq!(
            router.resolve(&method, "ping").unwrap_err(),
            RouteError::MethodNotAllowed {
                method: "BREW".to_string()
            }
        );
    }

    #[test]
    fn test_wildcard_fallback() {
        let mut builder = Router::builder();
        builder.add_route(any(), "/status", target("Status")).unwrap();
        builder.add_route(Method::POST, "/status", target("Update")).unwrap();
        let router = builder.build();

        let get = router.resolve(&Method::GET, "status").unwrap();
        assert_eq!(get.route().target().label(), "Status");
        assert_eq!(get.route().method().as_str(), "ANY");

        let post = router.resolve(&Method::POST, "status").unwrap();
        assert_eq!(post.route().target().label(), "Update");

        assert!(matches!(
            router.resolve(&Method::GET, "missing"),
            Err(RouteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_registration_errors() {
        let mut builder = Router::builder();
        builder.add_group("api", "/api").unwrap();

        assert_eq!(
            builder.add_group("api", "/v2").err(),
            Some(ConfigError::DuplicateGroup("api".to_string()))
        );
        assert!(matches!(
            builder.add_group("tenant", "/t/{id:int}").err(),
            Some(ConfigError::InvalidTemplate { ref template, .. }) if template == "/t/{id:int}"
        ));
        assert_eq!(
            builder
                .add_route_in(Method::GET, "x", target("X"), &["tenant"])
                .err(),
            Some(ConfigError::UnknownGroup("tenant".to_string()))
        );
        assert_eq!(
            builder
                .add_route_in(Method::GET, "x", target("X"), &["nope"])
                .err(),
            Some(ConfigError::UnknownGroup("nope".to_string()))
        );
        assert!(matches!(
            builder.add_route(Method::GET, "a/{", target("X")).err(),
            Some(ConfigError::InvalidTemplate { .. })
        ));

        builder.add_route(Method::GET, "/dup", target("X")).unwrap();
        assert_eq!(
            builder.add_route(Method::GET, "dup/", target("Y")).err(),
            Some(ConfigError::DuplicateRoute {
                method: "GET".to_string(),
                template: "dup".to_string()
            })
        );

        let unknown = Method::from_bytes(b"BREW").unwrap();
        assert_eq!(
            builder.add_route(unknown, "x", target("X")).err(),
            Some(ConfigError::UnknownMethod("BREW".to_string()))
        );
        assert_eq!(builder.route_count(), 1);
    }

    #[test]
    fn test_group_fan_out() {
        let mut builder = Router::builder();
        builder.add_group("web", "/").unwrap();
        builder.add_group("api", "/api/v1/").unwrap();

        let registration = builder
            .add_route_in(Method::GET, "/items/{id}", target("Items"), &["web", "api"])
            .unwrap()
            .middleware(Reference::key("Audit"));
        assert_eq!(registration.templates(), vec!["items/{id}", "api/v1/items/{id}"]);

        let router = builder.build();
        let api = router.resolve(&Method::GET, "/api/v1/items/9").unwrap();
        assert_eq!(api.route().group().map(Group::name), Some("api"));
        assert_eq!(api.route().middleware().len(), 1);

        let web = router.resolve(&Method::GET, "items/9").unwrap();
        assert_eq!(web.route().group().map(Group::name), Some("web"));
        assert_eq!(web.params().get("id"), Some(&ParamValue::Str("9".to_string())));
    }

    #[test]
    fn test_failed_fan_out_registers_nothing() {
        let mut builder = Router::builder();
        builder.add_group("a", "/same").unwrap();
        builder.add_group("b", "/same").unwrap();

        assert!(matches!(
            builder
                .add_route_in(Method::GET, "x", target("X"), &["a", "b"])
                .err(),
            Some(ConfigError::DuplicateRoute { .. })
        ));
        assert_eq!(builder.route_count(), 0);
    }

    #[test]
    fn test_single_shot_clears_after_first_success() {
        let mut builder = Router::builder().mode(RouterMode::SingleShot);
        builder.add_route(Method::GET, "once", target("Once")).unwrap();
        let router = builder.build();

        assert!(router.resolve(&Method::GET, "missing").is_err());
        assert!(router.resolve(&Method::GET, "once").is_ok());
        assert!(router.table().is_empty());
        assert!(matches!(
            router.resolve(&Method::GET, "once"),
            Err(RouteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_positional_params_for_unnamed_placeholders() {
        let mut builder = Router::builder();
        builder
            .add_route(Method::GET, "/range/{:int}/{:int}", target("Range"))
            .unwrap();
        let router = builder.build();

        let found = router.resolve(&Method::GET, "range/1/5").unwrap();
        assert_eq!(
            found.params(),
            &Params::Positional(vec![ParamValue::Int(1), ParamValue::Int(5)])
        );
    }

    #[test]
    fn test_from_config() {
        let config = RouterConfig::builder()
            .middleware("Audit")
            .group(crate::config::models::GroupConfig::new("api", "/api"))
            .route(
                crate::config::models::RouteConfig::new("get", "/users/{id:int}", "Users::show")
                    .in_group("api"),
            )
            .build();

        let (builder, global) = RouterBuilder::from_config(&config).unwrap();
        assert_eq!(global.len(), 1);
        let router = builder.build();

        let found = router.resolve(&Method::GET, "api/users/3").unwrap();
        assert_eq!(found.route().target().operation(), Some("show"));
    }
}
