use std::sync::Arc;

use crate::{
    core::error::LookupError,
    ports::handler::{Handler, Middleware},
};

/// ServiceLocator defines the port for turning lookup keys into instances
///
/// Lookups may construct a fresh instance on every call and may fail; the
/// dispatcher propagates any [`LookupError`] unchanged and never caches the
/// returned instances.
pub trait ServiceLocator: Send + Sync + 'static {
    /// Resolve a handler registered under `key`
    fn handler(&self, key: &str) -> Result<Arc<dyn Handler>, LookupError>;

    /// Resolve a middleware registered under `key`
    fn middleware(&self, key: &str) -> Result<Arc<dyn Middleware>, LookupError>;
}
