//! View models: one per dashboard page. They own their data, talk to the
//! backend through [`DashboardApi`](crate::api::DashboardApi) and never
//! touch the terminal; the `ui` module renders them.

pub mod alerts;
pub mod layout;
pub mod metrics;
pub mod overview;
pub mod topology;

use crate::error::Error;
use crate::types::CommandResponse;

pub use alerts::{AlertFilters, AlertsView};
pub use metrics::MetricsView;
pub use overview::OverviewView;
pub use topology::TopologyView;

/// Result of a user-issued command such as blocking an IP.
#[derive(Debug)]
pub enum CommandOutcome {
    Succeeded,
    Rejected(String),
    Failed(Error),
}

impl CommandOutcome {
    pub fn from_result(res: Result<CommandResponse, Error>) -> Self {
        match res {
            Ok(r) if r.success => CommandOutcome::Succeeded,
            Ok(r) => CommandOutcome::Rejected(r.error.unwrap_or_else(|| "refused".into())),
            Err(e) => CommandOutcome::Failed(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded)
    }
}

/// Chart label for samples that carry no timestamp of their own.
pub(crate) fn now_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend for view tests.

    use std::cell::{Cell, RefCell};

    use crate::api::DashboardApi;
    use crate::error::Error;
    use crate::types::*;

    #[derive(Default)]
    pub struct FakeApi {
        pub alerts: RefCell<Vec<Alert>>,
        pub metrics: RefCell<Vec<MetricSample>>,
        pub history: Vec<MetricsHistoryPoint>,
        pub stats: Statistics,
        pub topology: RefCell<Option<TopologyGraph>>,
        pub block_ok: bool,
        pub fail: Cell<bool>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeApi {
        fn check(&self, call: String) -> Result<(), Error> {
            self.calls.borrow_mut().push(call);
            if self.fail.get() {
                return Err(Error::Protocol("backend down".into()));
            }
            Ok(())
        }
    }

    impl DashboardApi for FakeApi {
        async fn alerts(&self, limit: usize, severity: Option<Severity>) -> Result<Vec<Alert>, Error> {
            self.check(format!("alerts limit={limit} severity={severity:?}"))?;
            Ok(self
                .alerts
                .borrow()
                .iter()
                .filter(|a| severity.map_or(true, |s| a.severity == s))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn metrics(&self) -> Result<MetricSample, Error> {
            self.check("metrics".into())?;
            let mut q = self.metrics.borrow_mut();
            if q.is_empty() {
                return Err(Error::Protocol("no sample queued".into()));
            }
            Ok(q.remove(0))
        }

        async fn metrics_history(&self, hours: u32) -> Result<Vec<MetricsHistoryPoint>, Error> {
            self.check(format!("history hours={hours}"))?;
            Ok(self.history.clone())
        }

        async fn statistics(&self) -> Result<Statistics, Error> {
            self.check("statistics".into())?;
            Ok(self.stats)
        }

        async fn topology(&self) -> Result<TopologyGraph, Error> {
            self.check("topology".into())?;
            Ok(self.topology.borrow().clone().unwrap_or_default())
        }

        async fn status(&self) -> Result<BackendStatus, Error> {
            self.check("status".into())?;
            Ok(BackendStatus {
                status: "running".into(),
                controller: "connected".into(),
            })
        }

        async fn block_ip(&self, ip: &str, duration_seconds: u64) -> Result<CommandResponse, Error> {
            self.check(format!("block {ip} {duration_seconds}"))?;
            Ok(CommandResponse {
                success: self.block_ok,
                error: (!self.block_ok).then(|| "Controller not available".into()),
            })
        }

        async fn unblock_ip(&self, ip: &str) -> Result<CommandResponse, Error> {
            self.check(format!("unblock {ip}"))?;
            Ok(CommandResponse {
                success: true,
                error: None,
            })
        }
    }

    pub fn alert(sev: u8, kind: &str, src: &str, dst: &str) -> Alert {
        Alert {
            id: None,
            timestamp: "2024-05-01T10:00:00".into(),
            severity: Severity::try_from(sev).expect("valid severity"),
            kind: kind.into(),
            source_ip: src.into(),
            destination_ip: dst.into(),
            source_port: Some(1234),
            destination_port: Some(80),
            protocol: "TCP".into(),
            signature: format!("{kind} detected"),
            description: None,
            blocked: false,
        }
    }

    pub fn sample(cpu: f64, sent: u64, recv: u64) -> MetricSample {
        MetricSample {
            cpu_percent: cpu,
            memory_percent: cpu / 2.0,
            disk_percent: None,
            latency_ms: cpu * 3.0,
            throughput_mbps: 1.5,
            network: NetworkCounters {
                bytes_sent: sent,
                bytes_received: recv,
            },
            timestamp: None,
        }
    }
}
