//! Alert log: server-side severity filter, client-side substring filters,
//! fixed-size pages, CSV export and block/unblock commands.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::error::Error;
use crate::types::{Alert, Severity};
use crate::views::CommandOutcome;

pub const PAGE_SIZE: usize = 20;
pub const FETCH_LIMIT: usize = 100;
pub const BLOCK_DURATION_SECS: u64 = 3600;
/// Page links shown in the pagination bar.
pub const MAX_PAGE_LINKS: usize = 5;

pub const CSV_HEADER: [&str; 9] = [
    "Timestamp",
    "Severity",
    "Type",
    "Source IP",
    "Dest IP",
    "Port",
    "Protocol",
    "Signature",
    "Blocked",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilters {
    /// Applied by the backend.
    pub severity: Option<Severity>,
    /// Case-sensitive substring of the alert type, applied locally.
    pub kind: Option<String>,
    /// Case-sensitive substring of either endpoint IP, applied locally.
    pub ip: Option<String>,
}

impl AlertFilters {
    pub fn matches(&self, a: &Alert) -> bool {
        let kind_ok = match self.kind.as_deref() {
            Some(k) if !k.is_empty() => a.kind.contains(k),
            _ => true,
        };
        let ip_ok = match self.ip.as_deref() {
            Some(ip) if !ip.is_empty() => a.involves_ip(ip),
            _ => true,
        };
        kind_ok && ip_ok
    }

    // All -> 1 -> 2 -> 3 -> 4 -> All
    pub fn cycle_severity(&mut self) {
        self.severity = match self.severity {
            None => Some(Severity::Critical),
            Some(Severity::Critical) => Some(Severity::High),
            Some(Severity::High) => Some(Severity::Medium),
            Some(Severity::Medium) => Some(Severity::Low),
            Some(Severity::Low) => None,
        };
    }
}

pub struct AlertsView<A> {
    api: A,
    filters: AlertFilters,
    alerts: Vec<Alert>,
    page: usize,
    selected: usize,
}

impl<A: DashboardApi> AlertsView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            filters: AlertFilters::default(),
            alerts: Vec::new(),
            page: 1,
            selected: 0,
        }
    }

    pub fn filters(&self) -> &AlertFilters {
        &self.filters
    }

    /// Replaces the filters and reloads. Returns false if the fetch failed,
    /// in which case the previous alert set stays on screen.
    pub async fn load(&mut self, filters: AlertFilters) -> bool {
        self.filters = filters;
        self.reload().await
    }

    pub async fn reload(&mut self) -> bool {
        match self.api.alerts(FETCH_LIMIT, self.filters.severity).await {
            Ok(fetched) => {
                let total = fetched.len();
                self.alerts = fetched
                    .into_iter()
                    .filter(|a| self.filters.matches(a))
                    .collect();
                self.page = 1;
                self.selected = 0;
                info!(fetched = total, shown = self.alerts.len(), "alerts loaded");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load alerts");
                false
            }
        }
    }

    /// The filtered, unpaginated set.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.alerts.len().div_ceil(PAGE_SIZE)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn page_rows(&self) -> &[Alert] {
        let start = ((self.page - 1) * PAGE_SIZE).min(self.alerts.len());
        let end = (start + PAGE_SIZE).min(self.alerts.len());
        &self.alerts[start..end]
    }

    pub fn page_links(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.total_pages().min(MAX_PAGE_LINKS)
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
        self.selected = 0;
    }

    pub fn next_page(&mut self) {
        if self.has_next() {
            self.go_to_page(self.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.has_prev() {
            self.go_to_page(self.page - 1);
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Alert> {
        self.page_rows().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let n = self.page_rows().len();
        if n > 0 {
            self.selected = (self.selected + 1).min(n - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn export_csv(&self) -> String {
        to_csv(&self.alerts)
    }

    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, Error> {
        let name = format!(
            "alerts_{}.csv",
            chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ")
        );
        let path = dir.join(name);
        fs::write(&path, self.export_csv())?;
        info!(path = %path.display(), rows = self.alerts.len(), "alerts exported");
        Ok(path)
    }

    pub async fn block_ip(&self, ip: &str) -> CommandOutcome {
        let outcome = CommandOutcome::from_result(self.api.block_ip(ip, BLOCK_DURATION_SECS).await);
        log_outcome("block_ip", ip, &outcome);
        outcome
    }

    pub async fn unblock_ip(&self, ip: &str) -> CommandOutcome {
        let outcome = CommandOutcome::from_result(self.api.unblock_ip(ip).await);
        log_outcome("unblock_ip", ip, &outcome);
        outcome
    }
}

fn log_outcome(cmd: &str, ip: &str, outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Succeeded => info!(cmd, ip, "command accepted"),
        CommandOutcome::Rejected(why) => warn!(cmd, ip, reason = %why, "command rejected"),
        CommandOutcome::Failed(e) => warn!(cmd, ip, error = %e, "command failed"),
    }
}

pub fn to_csv(alerts: &[Alert]) -> String {
    let mut lines = Vec::with_capacity(alerts.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for a in alerts {
        let severity = a.severity.to_string();
        let ports = a.port_pair();
        let row = [
            a.timestamp.as_str(),
            severity.as_str(),
            a.kind.as_str(),
            a.source_ip.as_str(),
            a.destination_ip.as_str(),
            ports.as_str(),
            a.protocol.as_str(),
            a.signature.as_str(),
            if a.blocked { "Yes" } else { "No" },
        ];
        let cells: Vec<Cow<'_, str>> = row.iter().map(|c| csv_field(c)).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn csv_field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fake::{alert, FakeApi};

    fn view_with(n: usize) -> AlertsView<FakeApi> {
        let api = FakeApi::default();
        *api.alerts.borrow_mut() = (0..n)
            .map(|i| alert(1 + (i % 4) as u8, "dos", &format!("10.0.0.{i}"), "192.168.1.1"))
            .collect();
        AlertsView::new(api)
    }

    #[tokio::test]
    async fn forty_five_alerts_make_three_pages() {
        let mut v = view_with(45);
        assert!(v.load(AlertFilters::default()).await);
        assert_eq!(v.total_pages(), 3);
        assert_eq!(v.page_links().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!v.has_prev());
        v.go_to_page(3);
        assert_eq!(v.page_rows().len(), 5);
        assert!(!v.has_next());
        v.next_page();
        assert_eq!(v.page(), 3);
        v.go_to_page(0);
        assert_eq!(v.page(), 1);
        v.go_to_page(99);
        assert_eq!(v.page(), 3);
    }

    #[tokio::test]
    async fn empty_result_has_no_navigation() {
        let mut v = view_with(0);
        v.load(AlertFilters::default()).await;
        assert_eq!(v.total_pages(), 0);
        assert!(!v.has_prev() && !v.has_next());
        assert!(v.page_rows().is_empty());
        assert!(v.selected().is_none());
    }

    #[tokio::test]
    async fn severity_and_ip_filters_compose() {
        let api = FakeApi::default();
        *api.alerts.borrow_mut() = vec![
            alert(1, "dos", "10.0.0.1", "172.16.0.1"),
            alert(1, "dos", "172.16.0.2", "10.0.3.3"),
            alert(1, "scan", "192.168.0.1", "192.168.0.2"),
            alert(2, "dos", "10.0.0.9", "172.16.0.1"),
        ];
        let mut v = AlertsView::new(api);
        let filters = AlertFilters {
            severity: Some(Severity::Critical),
            kind: None,
            ip: Some("10.0".into()),
        };
        v.load(filters).await;
        assert_eq!(v.alerts().len(), 2);
        assert!(v
            .alerts()
            .iter()
            .all(|a| a.severity == Severity::Critical && a.involves_ip("10.0")));
        assert_eq!(
            v.api.calls.borrow().last().map(String::as_str),
            Some("alerts limit=100 severity=Some(Critical)")
        );
    }

    #[tokio::test]
    async fn type_filter_is_case_sensitive() {
        let api = FakeApi::default();
        *api.alerts.borrow_mut() = vec![
            alert(3, "port_scan", "1.1.1.1", "2.2.2.2"),
            alert(3, "Port_Scan", "1.1.1.1", "2.2.2.2"),
        ];
        let mut v = AlertsView::new(api);
        v.load(AlertFilters {
            kind: Some("port".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(v.alerts().len(), 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_alerts() {
        let mut v = view_with(3);
        v.load(AlertFilters::default()).await;
        v.api.fail.set(true);
        assert!(!v.reload().await);
        assert_eq!(v.alerts().len(), 3);
    }

    #[test]
    fn csv_row_matches_expected_layout() {
        let mut a = alert(1, "dos", "1.1.1.1", "2.2.2.2");
        a.timestamp = "T1".into();
        a.source_port = Some(80);
        a.destination_port = Some(443);
        a.signature = "X".into();
        a.blocked = true;
        let csv = to_csv(&[a]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Timestamp,Severity,Type,Source IP,Dest IP,Port,Protocol,Signature,Blocked")
        );
        assert_eq!(lines.next(), Some("T1,1,dos,1.1.1.1,2.2.2.2,80:443,TCP,X,Yes"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_quotes_embedded_delimiters() {
        let mut a = alert(2, "sqli", "1.1.1.1", "2.2.2.2");
        a.signature = "UNION SELECT a,b \"x\"".into();
        let csv = to_csv(&[a]);
        assert!(csv.ends_with(",TCP,\"UNION SELECT a,b \"\"x\"\"\",No"));
    }

    #[tokio::test]
    async fn export_writes_filtered_set() {
        let mut v = view_with(25);
        v.load(AlertFilters::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let path = v.export_to_dir(dir.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        // header + every row, not just the first page
        assert_eq!(body.lines().count(), 26);
    }

    #[tokio::test]
    async fn block_uses_one_hour_and_reports_rejection() {
        let v = view_with(1);
        let out = v.block_ip("10.0.0.66").await;
        assert!(matches!(out, CommandOutcome::Rejected(_)));
        assert_eq!(
            v.api.calls.borrow().last().map(String::as_str),
            Some("block 10.0.0.66 3600")
        );
    }

    #[tokio::test]
    async fn selection_stays_within_page() {
        let mut v = view_with(22);
        v.load(AlertFilters::default()).await;
        v.go_to_page(2);
        v.select_next();
        v.select_next();
        v.select_next();
        assert_eq!(v.selected_index(), 1);
        assert_eq!(v.selected().map(|a| a.source_ip.as_str()), Some("10.0.0.21"));
    }
}
