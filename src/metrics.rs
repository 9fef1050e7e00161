//! Metric names and recording helpers.
//!
//! Counters go through the `metrics` facade; without an installed recorder
//! they are no-ops, so handlers record unconditionally.

use std::fmt;
use std::net::SocketAddr;

use tracing::{info, warn};

use crate::config::MetricsConfig;

/// Every metric the service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    CommandsTotal,
    QueriesTotal,
    EventsPublished,
    EventsFailed,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CommandsTotal => "tracker_commands_total",
            MetricName::QueriesTotal => "tracker_queries_total",
            MetricName::EventsPublished => "tracker_events_published_total",
            MetricName::EventsFailed => "tracker_events_failed_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [CommandsTotal, QueriesTotal, EventsPublished, EventsFailed].into_iter()
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricName::CommandsTotal => "Create, update and delete commands by entity kind",
            MetricName::QueriesTotal => "Get and list queries by entity kind",
            MetricName::EventsPublished => "Domain events delivered to the publisher",
            MetricName::EventsFailed => "Domain events the publisher failed to deliver",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs the Prometheus exporter on `0.0.0.0:<port>` when enabled.
/// Failure to install is logged and otherwise ignored.
pub fn init_metrics(config: &MetricsConfig) {
    if !config.enabled {
        return;
    }
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            for name in MetricName::all_metrics() {
                ::metrics::describe_counter!(name.as_str(), name.description());
            }
            info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

pub fn record_command(kind: &'static str, op: &'static str) {
    ::metrics::counter!(MetricName::CommandsTotal.as_str(), "kind" => kind, "op" => op).increment(1);
}

pub fn record_query(kind: &'static str) {
    ::metrics::counter!(MetricName::QueriesTotal.as_str(), "kind" => kind).increment(1);
}

pub fn record_event(delivered: bool) {
    let name = if delivered {
        MetricName::EventsPublished
    } else {
        MetricName::EventsFailed
    };
    ::metrics::counter!(name.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique_and_prefixed() {
        let names: HashSet<_> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), 4);
        assert!(names.iter().all(|n| n.starts_with("tracker_") && n.ends_with("_total")));
    }

    #[test]
    fn recording_without_recorder_is_harmless() {
        record_command("goal", "create");
        record_query("goal");
        record_event(false);
    }
}
