//! Rolling metric charts fed by polling and by `metrics_update` pushes.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::api::DashboardApi;
use crate::history::SampleWindow;
use crate::types::{MetricSample, MetricsHistoryPoint, NetworkCounters};
use crate::views::now_label;
use crate::ws::{EventSource, PushEvent};

pub const WINDOW: usize = 30;
pub const HISTORY_HOURS: u32 = 1;

pub struct MetricsView<A, S> {
    api: A,
    events: S,
    latest: Option<MetricSample>,
    last_sampled_at: Option<NaiveDateTime>,
    last_counters: Option<NetworkCounters>,
    cpu: SampleWindow<f64>,
    memory: SampleWindow<f64>,
    latency: SampleWindow<f64>,
    // (sent, received) bytes since the previous sample
    bytes: SampleWindow<(u64, u64)>,
    history: Vec<MetricsHistoryPoint>,
}

impl<A: DashboardApi, S: EventSource> MetricsView<A, S> {
    pub fn new(api: A, events: S) -> Self {
        Self {
            api,
            events,
            latest: None,
            last_sampled_at: None,
            last_counters: None,
            cpu: SampleWindow::new(WINDOW),
            memory: SampleWindow::new(WINDOW),
            latency: SampleWindow::new(WINDOW),
            bytes: SampleWindow::new(WINDOW),
            history: Vec::new(),
        }
    }

    pub async fn load_initial(&mut self) {
        self.poll().await;
        match self.api.metrics_history(HISTORY_HOURS).await {
            Ok(h) => self.history = h,
            Err(e) => warn!(error = %e, "failed to load metrics history"),
        }
    }

    pub async fn poll(&mut self) -> bool {
        match self.api.metrics().await {
            Ok(sample) => self.apply_sample(sample),
            Err(e) => {
                warn!(error = %e, "metrics update failed");
                false
            }
        }
    }

    /// Drains pending push events; returns how many samples were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(ev) = self.events.try_next() {
            if let PushEvent::MetricsUpdate(sample) = ev {
                if self.apply_sample(sample) {
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Merges one sample into every chart window. Samples stamped earlier
    /// than the last applied stamp are dropped; unstamped samples always apply.
    pub fn apply_sample(&mut self, sample: MetricSample) -> bool {
        let stamp = sample.sampled_at();
        if let (Some(new), Some(prev)) = (stamp, self.last_sampled_at) {
            if new < prev {
                debug!(%new, %prev, "dropping out-of-order metrics sample");
                return false;
            }
        }
        if stamp.is_some() {
            self.last_sampled_at = stamp;
        }

        let label = stamp
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(now_label);
        let delta = match self.last_counters {
            Some(prev) => (
                sample.network.bytes_sent.saturating_sub(prev.bytes_sent),
                sample
                    .network
                    .bytes_received
                    .saturating_sub(prev.bytes_received),
            ),
            None => (0, 0),
        };
        self.last_counters = Some(sample.network);

        self.cpu.push(label.clone(), sample.cpu_percent);
        self.memory.push(label.clone(), sample.memory_percent);
        self.latency.push(label.clone(), sample.latency_ms);
        self.bytes.push(label, delta);
        self.latest = Some(sample);
        true
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.latest.as_ref()
    }

    pub fn cpu(&self) -> &SampleWindow<f64> {
        &self.cpu
    }

    pub fn memory(&self) -> &SampleWindow<f64> {
        &self.memory
    }

    pub fn latency(&self) -> &SampleWindow<f64> {
        &self.latency
    }

    pub fn bytes(&self) -> &SampleWindow<(u64, u64)> {
        &self.bytes
    }

    pub fn history(&self) -> &[MetricsHistoryPoint] {
        &self.history
    }

    pub fn history_peak_cpu(&self) -> Option<f64> {
        self.history.iter().map(|p| p.cpu_usage).reduce(f64::max)
    }

    pub fn history_threats(&self) -> u64 {
        self.history.iter().map(|p| p.threats_detected).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::views::fake::{sample, FakeApi};

    fn view() -> MetricsView<FakeApi, VecDeque<PushEvent>> {
        MetricsView::new(FakeApi::default(), VecDeque::new())
    }

    #[test]
    fn thirty_one_ticks_evict_the_first() {
        let mut v = view();
        for i in 0..31 {
            v.apply_sample(sample(i as f64, 0, 0));
        }
        assert_eq!(v.cpu().len(), 30);
        assert!(!v.cpu().values().any(|&c| c == 0.0));
        assert_eq!(v.cpu().latest(), Some(&30.0));
        assert_eq!(v.latency().latest(), Some(&90.0));
    }

    #[test]
    fn byte_series_is_per_sample_delta() {
        let mut v = view();
        v.apply_sample(sample(1.0, 1_000, 5_000));
        v.apply_sample(sample(1.0, 1_500, 5_100));
        let deltas: Vec<_> = v.bytes().values().copied().collect();
        assert_eq!(deltas, vec![(0, 0), (500, 100)]);
    }

    #[test]
    fn older_stamped_sample_is_dropped() {
        let mut v = view();
        let mut newer = sample(50.0, 0, 0);
        newer.timestamp = Some("2024-05-01T10:00:10".into());
        let mut older = sample(10.0, 0, 0);
        older.timestamp = Some("2024-05-01T10:00:05".into());
        assert!(v.apply_sample(newer));
        assert!(!v.apply_sample(older));
        assert_eq!(v.cpu().len(), 1);
        assert_eq!(v.latest().map(|m| m.cpu_percent), Some(50.0));
        // unstamped polls still land
        assert!(v.apply_sample(sample(20.0, 0, 0)));
    }

    #[tokio::test]
    async fn poll_and_push_both_feed_the_charts() {
        let api = FakeApi::default();
        api.metrics.borrow_mut().push(sample(12.0, 0, 0));
        let mut events = VecDeque::new();
        events.push_back(PushEvent::MetricsUpdate(sample(13.0, 0, 0)));
        events.push_back(PushEvent::TopologyUpdate(Default::default()));
        let mut v = MetricsView::new(api, events);
        v.load_initial().await;
        assert_eq!(v.pump(), 1);
        let cpu: Vec<_> = v.cpu().values().copied().collect();
        assert_eq!(cpu, vec![12.0, 13.0]);
    }

    #[tokio::test]
    async fn failed_poll_leaves_charts_untouched() {
        let mut v = view();
        v.apply_sample(sample(5.0, 0, 0));
        v.api.fail.set(true);
        assert!(!v.poll().await);
        assert_eq!(v.cpu().len(), 1);
    }

    #[test]
    fn history_summary() {
        let mut v = view();
        v.history = vec![
            MetricsHistoryPoint {
                timestamp: "a".into(),
                cpu_usage: 40.0,
                memory_usage: 1.0,
                active_flows: 3,
                threats_detected: 2,
            },
            MetricsHistoryPoint {
                timestamp: "b".into(),
                cpu_usage: 70.0,
                memory_usage: 1.0,
                active_flows: 3,
                threats_detected: 5,
            },
        ];
        assert_eq!(v.history_peak_cpu(), Some(70.0));
        assert_eq!(v.history_threats(), 7);
    }
}
