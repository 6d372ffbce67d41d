//! Lightweight metrics helpers for Switchyard.
//!
//! Thin wrappers over the `metrics` crate macros. No exporter is installed
//! here; the embedding application picks any compatible recorder and these
//! calls become no-ops without one.
//!
//! Provided metrics:
//! * `switchyard_dispatch_total` (counter, label `outcome`)
//! * `switchyard_dispatch_duration_seconds` (histogram, label `outcome`)
//! * `switchyard_route_lookups_total` (counter, label `result`)
//! * `switchyard_pattern_compilations_total` (counter, label `source`)
//! * `switchyard_active_dispatches` (gauge)
//!
//! [`DispatchTimer`] records duration and outcome on `Drop`, so early
//! returns are still measured.
use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::{Duration, Instant},
};

use metrics::{Unit, counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::Lazy;

pub const SWITCHYARD_DISPATCH_TOTAL: &str = "switchyard_dispatch_total";
pub const SWITCHYARD_DISPATCH_DURATION_SECONDS: &str = "switchyard_dispatch_duration_seconds";
pub const SWITCHYARD_ROUTE_LOOKUPS_TOTAL: &str = "switchyard_route_lookups_total";
pub const SWITCHYARD_PATTERN_COMPILATIONS_TOTAL: &str = "switchyard_pattern_compilations_total";
pub const SWITCHYARD_ACTIVE_DISPATCHES: &str = "switchyard_active_dispatches";

/// In-flight dispatch count, mirrored into the gauge.
static ACTIVE_DISPATCHES: Lazy<AtomicI64> = Lazy::new(|| {
    describe_counter!(
        SWITCHYARD_DISPATCH_TOTAL,
        Unit::Count,
        "Total number of requests dispatched, by outcome."
    );
    describe_histogram!(
        SWITCHYARD_DISPATCH_DURATION_SECONDS,
        Unit::Seconds,
        "Time from routing to response, by outcome."
    );
    describe_counter!(
        SWITCHYARD_ROUTE_LOOKUPS_TOTAL,
        Unit::Count,
        "Route resolutions by result (matched, wildcard, not_found, method_not_allowed)."
    );
    describe_counter!(
        SWITCHYARD_PATTERN_COMPILATIONS_TOTAL,
        Unit::Count,
        "Route pattern compilations by source (compiled or cache)."
    );
    describe_gauge!(
        SWITCHYARD_ACTIVE_DISPATCHES,
        "Number of requests currently inside the dispatcher."
    );

    AtomicI64::new(0)
});

/// Count one dispatch and record how long it took.
pub fn record_dispatch(outcome: &'static str, duration: Duration) {
    counter!(SWITCHYARD_DISPATCH_TOTAL, "outcome" => outcome).increment(1);
    histogram!(SWITCHYARD_DISPATCH_DURATION_SECONDS, "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Count one router resolution.
pub fn record_route_lookup(result: &'static str) {
    counter!(SWITCHYARD_ROUTE_LOOKUPS_TOTAL, "result" => result).increment(1);
}

/// Count one pattern compilation, either fresh or served from cache.
pub fn record_pattern_compilation(source: &'static str) {
    counter!(SWITCHYARD_PATTERN_COMPILATIONS_TOTAL, "source" => source).increment(1);
}

/// Current in-flight dispatch count.
pub fn active_dispatches() -> i64 {
    ACTIVE_DISPATCHES.load(Ordering::Relaxed)
}

fn adjust_active(delta: i64) {
    let current = ACTIVE_DISPATCHES.fetch_add(delta, Ordering::Relaxed) + delta;
    gauge!(SWITCHYARD_ACTIVE_DISPATCHES).set(current as f64);
}

/// RAII helper measuring one dispatch.
///
/// The outcome defaults to `"error"` and is overwritten by
/// [`DispatchTimer::finish`] once the dispatcher knows better.
pub struct DispatchTimer {
    start: Instant,
    outcome: &'static str,
}

impl DispatchTimer {
    pub fn new() -> Self {
        adjust_active(1);
        Self {
            start: Instant::now(),
            outcome: "error",
        }
    }

    pub fn finish(&mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Default for DispatchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        adjust_active(-1);
        record_dispatch(self.outcome, self.start.elapsed());
    }
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing Switchyard metrics");
    Lazy::force(&ACTIVE_DISPATCHES);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_timer_tracks_active_count() {
        let mut timer = DispatchTimer::new();
        assert!(active_dispatches() >= 1);
        timer.finish("ok");
        drop(timer);
    }

    #[test]
    fn test_recorders_without_exporter() {
        record_route_lookup("matched");
        record_pattern_compilation("cache");
        record_dispatch("ok", Duration::from_millis(3));
    }

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
    }
}
