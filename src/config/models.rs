//! Configuration data structures for Switchyard.
//!
//! These types map directly to YAML (also JSON / TOML) route files. Defaults
//! keep minimal configs concise: a file with only a `routes` list is valid.
//! Middleware and handlers are referenced by service-locator key.
use serde::{Deserialize, Serialize};

/// Methods a router knows about when none are configured.
pub const DEFAULT_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH", "CLI", "ANY",
];

/// Method whose routes answer any known method as a fallback.
pub const DEFAULT_WILDCARD_METHOD: &str = "ANY";

fn default_methods() -> Vec<String> {
    DEFAULT_METHODS.iter().map(|m| m.to_string()).collect()
}

fn default_wildcard_method() -> String {
    DEFAULT_WILDCARD_METHOD.to_string()
}

fn default_prefix() -> String {
    "/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Lifetime of the route table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouterMode {
    /// Routes stay registered for the life of the router
    #[default]
    Persistent,
    /// The table is emptied after the first successful resolution
    SingleShot,
}

/// Top level router configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouterConfig {
    #[serde(default)]
    pub mode: RouterMode,
    /// Method used as the fallback bucket
    #[serde(default = "default_wildcard_method")]
    pub wildcard_method: String,
    /// Known methods; requests for anything else are rejected outright
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    /// Global normal middleware keys, outermost first
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Global priority middleware keys in registration order
    #[serde(default)]
    pub priority_middleware: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mode: RouterMode::default(),
            wildcard_method: default_wildcard_method(),
            methods: default_methods(),
            middleware: Vec::new(),
            priority_middleware: Vec::new(),
            groups: Vec::new(),
            routes: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RouterConfig {
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }
}

/// Named path prefix with shared middleware.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub priority_middleware: Vec<String>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            middleware: Vec::new(),
            priority_middleware: Vec::new(),
        }
    }
}

/// A single route binding.
///
/// `handler` is `"Service"` or `"Service::operation"`. A route listing
/// several groups is registered once per group under each group's prefix.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteConfig {
    pub method: String,
    pub path: String,
    pub handler: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub priority_middleware: Vec<String>,
}

impl RouteConfig {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            handler: handler.into(),
            groups: Vec::new(),
            middleware: Vec::new(),
            priority_middleware: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `switchyard=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Builder for RouterConfig
#[derive(Debug, Default)]
pub struct RouterConfigBuilder {
    mode: RouterMode,
    wildcard_method: Option<String>,
    methods: Option<Vec<String>>,
    middleware: Vec<String>,
    priority_middleware: Vec<String>,
    groups: Vec<GroupConfig>,
    routes: Vec<RouteConfig>,
    logging: Option<LoggingConfig>,
}

impl RouterConfigBuilder {
    pub fn mode(mut self, mode: RouterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn wildcard_method(mut self, method: impl Into<String>) -> Self {
        self.wildcard_method = Some(method.into());
        self
    }

    /// Replace the known method list
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn middleware(mut self, key: impl Into<String>) -> Self {
        self.middleware.push(key.into());
        self
    }

    pub fn priority_middleware(mut self, key: impl Into<String>) -> Self {
        self.priority_middleware.push(key.into());
        self
    }

    pub fn group(mut self, group: GroupConfig) -> Self {
        self.groups.push(group);
        self
    }

    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the final RouterConfig
    pub fn build(self) -> RouterConfig {
        RouterConfig {
            mode: self.mode,
            wildcard_method: self.wildcard_method.unwrap_or_else(default_wildcard_method),
            methods: self.methods.unwrap_or_else(default_methods),
            middleware: self.middleware,
            priority_middleware: self.priority_middleware,
            groups: self.groups,
            routes: self.routes,
            logging: self.logging.unwrap_or_default(),
        }
    }
}
