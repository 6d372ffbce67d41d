//! Route, group and reference types shared by the router and dispatcher.
use std::{fmt, str::FromStr, sync::Arc};

use http::Method;
use serde::Serialize;

use crate::{
    core::error::{ConfigError, ConfigResult, LookupError},
    ports::handler::{Handler, Middleware},
};

/// Either an already-constructed instance or a key for the service locator.
pub enum Reference<T: ?Sized> {
    Instance(Arc<T>),
    Key(String),
}

/// Reference to a handler
pub type HandlerRef = Reference<dyn Handler>;

/// Reference to a middleware
pub type MiddlewareRef = Reference<dyn Middleware>;

impl<T: ?Sized> Reference<T> {
    pub fn key(key: impl Into<String>) -> Self {
        Reference::Key(key.into())
    }

    /// Produce an instance, asking `lookup` for keyed references.
    pub fn resolve(
        &self,
        lookup: impl FnOnce(&str) -> Result<Arc<T>, LookupError>,
    ) -> Result<Arc<T>, LookupError> {
        match self {
            Reference::Instance(instance) => Ok(instance.clone()),
            Reference::Key(key) => lookup(key),
        }
    }

    /// Key for keyed references, a fixed marker for instances.
    pub fn label(&self) -> &str {
        match self {
            Reference::Instance(_) => "<instance>",
            Reference::Key(key) => key,
        }
    }
}

impl<T: ?Sized> Clone for Reference<T> {
    fn clone(&self) -> Self {
        match self {
            Reference::Instance(instance) => Reference::Instance(instance.clone()),
            Reference::Key(key) => Reference::Key(key.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Instance(_) => f.write_str("Instance(..)"),
            Reference::Key(key) => f.debug_tuple("Key").field(key).finish(),
        }
    }
}

impl<T: ?Sized> From<&str> for Reference<T> {
    fn from(key: &str) -> Self {
        Reference::Key(key.to_string())
    }
}

impl<T: ?Sized> From<String> for Reference<T> {
    fn from(key: String) -> Self {
        Reference::Key(key)
    }
}

/// Handler reference plus the operation it was registered for.
#[derive(Debug, Clone)]
pub struct HandlerTarget {
    reference: HandlerRef,
    operation: Option<String>,
}

impl HandlerTarget {
    pub fn new(reference: HandlerRef) -> Self {
        Self {
            reference,
            operation: None,
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Parse `"Service"` or `"Service::operation"`.
    pub fn parse(reference: &str) -> ConfigResult<Self> {
        let invalid = || ConfigError::InvalidHandlerReference(reference.to_string());
        let trimmed = reference.trim();

        match trimmed.split_once("::") {
            None if !trimmed.is_empty() => Ok(Self::new(Reference::key(trimmed))),
            Some((service, operation))
                if !service.is_empty() && !operation.is_empty() && !operation.contains("::") =>
            {
                Ok(Self::new(Reference::key(service)).with_operation(operation))
            }
            _ => Err(invalid()),
        }
    }

    pub fn reference(&self) -> &HandlerRef {
        &self.reference
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Human readable form, `service::operation` when an operation is bound.
    pub fn label(&self) -> String {
        match &self.operation {
            Some(operation) => format!("{}::{operation}", self.reference.label()),
            None => self.reference.label().to_string(),
        }
    }
}

impl From<HandlerRef> for HandlerTarget {
    fn from(reference: HandlerRef) -> Self {
        Self::new(reference)
    }
}

impl FromStr for HandlerTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normal and priority middleware of one scope (route, group or global).
///
/// Normal middleware is read first-added-first; priority middleware is read
/// most-recently-added-first.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareLanes {
    normal: Vec<MiddlewareRef>,
    priority: Vec<MiddlewareRef>,
}

impl MiddlewareLanes {
    pub fn push_normal(&mut self, middleware: MiddlewareRef) {
        self.normal.push(middleware);
    }

    pub fn push_priority(&mut self, middleware: MiddlewareRef) {
        self.priority.push(middleware);
    }

    /// `index`-th normal middleware in FIFO order
    pub fn normal(&self, index: usize) -> Option<&MiddlewareRef> {
        self.normal.get(index)
    }

    /// `index`-th priority middleware in LIFO order
    pub fn priority(&self, index: usize) -> Option<&MiddlewareRef> {
        let len = self.priority.len();
        index
            .checked_add(1)
            .and_then(|n| len.checked_sub(n))
            .and_then(|at| self.priority.get(at))
    }

    pub fn len(&self) -> usize {
        self.normal.len() + self.priority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named path prefix sharing middleware with its member routes.
#[derive(Debug)]
pub struct Group {
    name: String,
    prefix: String,
    middleware: MiddlewareLanes,
}

impl Group {
    pub(crate) fn new(name: String, prefix: String, middleware: MiddlewareLanes) -> Self {
        Self {
            name,
            prefix,
            middleware,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn middleware(&self) -> &MiddlewareLanes {
        &self.middleware
    }
}

/// One (method, template) → handler binding.
#[derive(Debug)]
pub struct Route {
    method: Method,
    template: String,
    target: HandlerTarget,
    group: Option<Arc<Group>>,
    middleware: MiddlewareLanes,
}

impl Route {
    pub(crate) fn new(
        method: Method,
        template: String,
        target: HandlerTarget,
        group: Option<Arc<Group>>,
        middleware: MiddlewareLanes,
    ) -> Self {
        Self {
            method,
            template,
            target,
            group,
            middleware,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Normalized template (no leading or trailing slash).
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn target(&self) -> &HandlerTarget {
        &self.target
    }

    pub fn group(&self) -> Option<&Group> {
        self.group.as_deref()
    }

    pub fn middleware(&self) -> &MiddlewareLanes {
        &self.middleware
    }

    /// Metadata snapshot inserted into request extensions.
    pub fn describe(&self) -> MatchedRoute {
        MatchedRoute {
            method: self.method.to_string(),
            template: self.template.clone(),
            handler: self.target.label(),
            group: self.group.as_ref().map(|group| group.name.clone()),
        }
    }
}

/// Route metadata visible to middleware and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRoute {
    /// Method bucket the route was registered in (may be the wildcard)
    pub method: String,
    pub template: String,
    pub handler: String,
    pub group: Option<String>,
}
