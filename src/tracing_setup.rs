use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::models::LoggingConfig;

/// Initialize tracing with custom configuration
pub fn init_tracing_with_config(level: &str, json_format: bool, include_spans: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let installed = if json_format {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(include_spans)
                    .with_span_list(include_spans),
            )
            .try_init()
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
    };
    installed.wrap_err("Failed to install tracing subscriber")?;

    tracing::info!(level, json = json_format, spans = include_spans, "Switchyard logging initialized");
    Ok(())
}

/// Initialize tracing from the `logging` section of a router config.
pub fn init_from_config(logging: &LoggingConfig) -> Result<()> {
    init_tracing_with_config(&logging.level, logging.json, logging.json)
}

/// Create a dispatch-scoped span. `dispatch.stage` and `duration_ms` are
/// filled in as the request progresses.
pub fn create_dispatch_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "dispatch",
        http.method = method,
        http.path = path,
        request.id = request_id,
        route.template = tracing::field::Empty,
        dispatch.stage = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = init_tracing_with_config("switchyard=loudest", false, false).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_create_dispatch_span() {
        let span = create_dispatch_span("GET", "/api/test", "req-123");
        assert!(span.metadata().is_none_or(|m| m.name() == "dispatch"));
    }
}
