//! Types that mirror the backend's JSON schema.
//! Decoding doubles as validation: out-of-range severities and unknown node
//! kinds are rejected here rather than rendered.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Severity::Critical),
            2 => Ok(Severity::High),
            3 => Ok(Severity::Medium),
            4 => Ok(Severity::Low),
            other => Err(format!("severity must be 1..=4, got {other}")),
        }
    }
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s.level()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: Option<u64>,
    pub timestamp: String,
    pub severity: Severity,
    // Live pushes carry only timestamp, severity, endpoints and signature.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(alias = "source")]
    pub source_ip: String,
    #[serde(alias = "destination")]
    pub destination_ip: String,
    #[serde(default)]
    pub source_port: Option<u16>,
    #[serde(default)]
    pub destination_port: Option<u16>,
    #[serde(default)]
    pub protocol: String,
    pub signature: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blocked: bool,
}

impl Alert {
    /// `src:dst`, with `-` standing in for a missing port.
    pub fn port_pair(&self) -> String {
        fn p(v: Option<u16>) -> String {
            v.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
        }
        format!("{}:{}", p(self.source_port), p(self.destination_port))
    }

    pub fn involves_ip(&self, needle: &str) -> bool {
        self.source_ip.contains(needle) || self.destination_ip.contains(needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounters {
    #[serde(default)]
    pub bytes_sent: u64,
    #[serde(default, alias = "bytes_recv")]
    pub bytes_received: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub throughput_mbps: f64,
    #[serde(default)]
    pub network: NetworkCounters,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl MetricSample {
    pub fn sampled_at(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricsHistoryPoint {
    pub timestamp: String,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub memory_usage: f64,
    #[serde(default)]
    pub active_flows: u64,
    #[serde(default)]
    pub threats_detected: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub switches: u64,
    #[serde(default)]
    pub hosts: u64,
    #[serde(default)]
    pub links: u64,
    #[serde(default)]
    pub total_flows: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub controller: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Switch,
    Host,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Switch => "switch",
            NodeKind::Host => "host",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Suspicious,
    // switches report "active"/"connected"; anything but suspicious is normal
    #[default]
    #[serde(other)]
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    pub fn title(&self) -> String {
        format!("{}: {}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "traffic")]
    pub weight: f64,
    #[serde(default)]
    pub suspicious: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockIpRequest<'a> {
    pub ip: &'a str,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnblockIpRequest<'a> {
    pub ip: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accepts RFC 3339 and the naive `isoformat()` shape the backend emits.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
