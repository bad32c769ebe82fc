//! Optional metrics instrumentation for runnel.
//!
//! When the `observe` feature is enabled, key operations emit counters,
//! histograms, and gauges via the [`metrics`] crate. A downstream
//! application must install a metrics recorder (e.g. `metrics-exporter-prometheus`)
//! to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record a change notification published to the bus.
///
/// - `runnel.bus.notifications_total` – incremented on every publish
/// - `runnel.bus.notification_tables` – histogram of affected-table counts
#[inline]
pub fn record_notify(tables: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("runnel.bus.notifications_total").increment(1);
        metrics::histogram!("runnel.bus.notification_tables").record(tables as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = tables;
    }
}

/// Record fan-out of one notification to subscribers.
///
/// - `runnel.bus.deliveries_total` – counter with `result` label (`delivered` / `dropped`)
#[inline]
pub fn record_fanout(delivered: usize, dropped: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("runnel.bus.deliveries_total", "result" => "delivered")
            .increment(delivered as u64);
        metrics::counter!("runnel.bus.deliveries_total", "result" => "dropped")
            .increment(dropped as u64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (delivered, dropped);
    }
}

/// Set the current live subscription count gauge.
///
/// - `runnel.bus.subscriptions` – gauge
#[inline]
pub fn set_subscriptions(count: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("runnel.bus.subscriptions").set(count as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = count;
    }
}

/// Record one blocking execution pass of a prepared operation.
///
/// - `runnel.op.executions_total` – counter with `op` label
/// - `runnel.op.execute_duration_seconds` – histogram with `op` label
#[inline]
pub fn record_execute(duration: std::time::Duration, op: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("runnel.op.executions_total", "op" => op).increment(1);
        metrics::histogram!("runnel.op.execute_duration_seconds", "op" => op)
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, op);
    }
}
