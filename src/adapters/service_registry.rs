//! In-memory service locator.
//!
//! Handlers and middleware are registered under string keys, either as
//! ready instances or as factories. Factories run on every lookup, so they
//! suit cheap per-request construction; register an instance for shared
//! state.
use std::sync::Arc;

use scc::HashMap;

use crate::{
    core::error::LookupError,
    ports::{
        handler::{Handler, Middleware},
        service_locator::ServiceLocator,
    },
};

type Factory<T> = Arc<dyn Fn() -> eyre::Result<Arc<T>> + Send + Sync>;

enum Provider<T: ?Sized> {
    Instance(Arc<T>),
    Factory(Factory<T>),
}

impl<T: ?Sized> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Provider::Instance(instance) => Provider::Instance(instance.clone()),
            Provider::Factory(factory) => Provider::Factory(factory.clone()),
        }
    }
}

fn provide<T: ?Sized>(
    entries: &HashMap<String, Provider<T>>,
    key: &str,
) -> Result<Arc<T>, LookupError> {
    let provider = entries
        .read_sync(key, |_, provider| provider.clone())
        .ok_or_else(|| LookupError::NotFound(key.to_string()))?;

    match provider {
        Provider::Instance(instance) => Ok(instance),
        Provider::Factory(factory) => factory().map_err(|source| {
            tracing::warn!(key, error = %source, "Service factory failed");
            LookupError::Construction {
                key: key.to_string(),
                source,
            }
        }),
    }
}

fn register<T: ?Sized>(entries: &HashMap<String, Provider<T>>, key: &str, provider: Provider<T>) {
    // Later registrations replace earlier ones in place.
    entries.upsert_sync(key.to_string(), provider);
}

/// Key → handler / middleware registry implementing [`ServiceLocator`].
#[derive(Default)]
pub struct ServiceRegistry {
    handlers: HashMap<String, Provider<dyn Handler>>,
    middleware: HashMap<String, Provider<dyn Middleware>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&self, key: &str, handler: Arc<dyn Handler>) {
        register(&self.handlers, key, Provider::Instance(handler));
    }

    pub fn register_handler_factory<F>(&self, key: &str, factory: F)
    where
        F: Fn() -> eyre::Result<Arc<dyn Handler>> + Send + Sync + 'static,
    {
        register(&self.handlers, key, Provider::Factory(Arc::new(factory)));
    }

    pub fn register_middleware(&self, key: &str, middleware: Arc<dyn Middleware>) {
        register(&self.middleware, key, Provider::Instance(middleware));
    }

    pub fn register_middleware_factory<F>(&self, key: &str, factory: F)
    where
        F: Fn() -> eyre::Result<Arc<dyn Middleware>> + Send + Sync + 'static,
    {
        register(&self.middleware, key, Provider::Factory(Arc::new(factory)));
    }

    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.contains_sync(key)
    }

    pub fn has_middleware(&self, key: &str) -> bool {
        self.middleware.contains_sync(key)
    }
}

impl ServiceLocator for ServiceRegistry {
    fn handler(&self, key: &str) -> Result<Arc<dyn Handler>, LookupError> {
        provide(&self.handlers, key)
    }

    fn middleware(&self, key: &str) -> Result<Arc<dyn Middleware>, LookupError> {
        provide(&self.middleware, key)
    }
}
