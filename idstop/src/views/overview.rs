//! Composite landing page: live alert stream, metric gauges, counters.
//! Push events drive it; HTTP is used for the first load and as a fallback.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::api::DashboardApi;
use crate::history::{push_front_capped, SampleWindow};
use crate::types::{Alert, BackendStatus, MetricSample, Statistics, TopologyGraph};
use crate::views::now_label;
use crate::views::topology::TopologySummary;
use crate::ws::{EventSource, PushEvent};

pub const ALERT_BUFFER: usize = 100;
pub const RECENT_ALERTS: usize = 10;
pub const INITIAL_ALERTS: usize = 20;
pub const TRAFFIC_WINDOW: usize = 20;

pub const ATTACK_FAMILIES: [&str; 6] = [
    "DoS",
    "Port Scan",
    "SQL Injection",
    "Brute Force",
    "MITM",
    "Other",
];

pub struct OverviewView<A, S> {
    api: A,
    events: S,
    alerts: VecDeque<Alert>,
    active_threats: u64,
    metrics: Option<MetricSample>,
    traffic: SampleWindow<f64>,
    stats: Statistics,
    topology: Option<TopologySummary>,
    status: Option<BackendStatus>,
}

impl<A: DashboardApi, S: EventSource> OverviewView<A, S> {
    pub fn new(api: A, events: S) -> Self {
        Self {
            api,
            events,
            alerts: VecDeque::with_capacity(ALERT_BUFFER),
            active_threats: 0,
            metrics: None,
            traffic: SampleWindow::new(TRAFFIC_WINDOW),
            stats: Statistics::default(),
            topology: None,
            status: None,
        }
    }

    pub async fn load_initial(&mut self) {
        match self.api.alerts(INITIAL_ALERTS, None).await {
            Ok(list) => self.alerts = list.into_iter().take(ALERT_BUFFER).collect(),
            Err(e) => warn!(error = %e, "failed to load alerts"),
        }
        self.poll().await;
        match self.api.statistics().await {
            Ok(s) => self.stats = s,
            Err(e) => warn!(error = %e, "failed to load statistics"),
        }
        match self.api.status().await {
            Ok(s) => self.status = Some(s),
            Err(e) => warn!(error = %e, "failed to load backend status"),
        }
    }

    pub async fn poll(&mut self) -> bool {
        match self.api.metrics().await {
            Ok(m) => {
                self.update_metrics(m);
                true
            }
            Err(e) => {
                warn!(error = %e, "metrics update failed");
                false
            }
        }
    }

    /// Applies queued push events in delivery order.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Some(ev) = self.events.try_next() {
            self.handle_event(ev);
            n += 1;
        }
        n
    }

    pub fn handle_event(&mut self, ev: PushEvent) {
        debug!(event = ev.name(), "overview event");
        match ev {
            PushEvent::NewAlert(a) => self.handle_new_alert(a),
            PushEvent::MetricsUpdate(m) => self.update_metrics(m),
            PushEvent::TopologyUpdate(g) => self.update_topology(&g),
        }
    }

    pub fn handle_new_alert(&mut self, alert: Alert) {
        push_front_capped(&mut self.alerts, alert, ALERT_BUFFER);
        self.active_threats += 1;
    }

    pub fn update_metrics(&mut self, m: MetricSample) {
        self.traffic.push(now_label(), m.cpu_percent);
        self.metrics = Some(m);
    }

    pub fn update_topology(&mut self, graph: &TopologyGraph) {
        self.topology = Some(TopologySummary::of(graph));
    }

    /// Newest first, at most [`RECENT_ALERTS`].
    pub fn recent_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().take(RECENT_ALERTS)
    }

    pub fn buffered_alerts(&self) -> usize {
        self.alerts.len()
    }

    pub fn active_threats(&self) -> u64 {
        self.active_threats
    }

    pub fn metrics(&self) -> Option<&MetricSample> {
        self.metrics.as_ref()
    }

    pub fn traffic(&self) -> &SampleWindow<f64> {
        &self.traffic
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn topology(&self) -> Option<TopologySummary> {
        self.topology
    }

    pub fn status(&self) -> Option<&BackendStatus> {
        self.status.as_ref()
    }

    /// Buffered alerts per attack family, in [`ATTACK_FAMILIES`] order.
    pub fn attack_distribution(&self) -> [u64; 6] {
        let mut counts = [0u64; 6];
        for a in &self.alerts {
            counts[attack_family(&a.kind)] += 1;
        }
        counts
    }
}

fn attack_family(kind: &str) -> usize {
    let k = kind.to_ascii_lowercase().replace(['-', ' '], "_");
    if k.contains("dos") || k.contains("flood") {
        0
    } else if k.contains("scan") {
        1
    } else if k.contains("sql") {
        2
    } else if k.contains("brute") {
        3
    } else if k.contains("mitm") || k.contains("arp") {
        4
    } else {
        5
    }
}
