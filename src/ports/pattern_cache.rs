use std::sync::Arc;

use crate::core::pattern::CompiledPattern;

/// PatternCache defines the port for sharing compiled templates
///
/// Implementations must tolerate concurrent readers and writers. Writes are
/// insert-if-absent in spirit, but overwriting with an equal pattern is fine.
pub trait PatternCache: Send + Sync + 'static {
    /// Fetch the compiled pattern for a template, if present
    fn get(&self, template: &str) -> Option<Arc<CompiledPattern>>;

    /// Store a compiled pattern under its template
    fn set(&self, template: &str, pattern: Arc<CompiledPattern>);
}
