//! HTTP query/command client for the detection backend.
//!
//! Views depend on the [`DashboardApi`] trait rather than on [`HttpApi`]
//! directly, so they can be driven by an in-memory fake in tests.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::types::{
    Alert, BackendStatus, BlockIpRequest, CommandResponse, MetricSample, MetricsHistoryPoint,
    Severity, Statistics, TopologyGraph, UnblockIpRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[allow(async_fn_in_trait)]
pub trait DashboardApi {
    async fn alerts(&self, limit: usize, severity: Option<Severity>) -> Result<Vec<Alert>, Error>;
    async fn metrics(&self) -> Result<MetricSample, Error>;
    async fn metrics_history(&self, hours: u32) -> Result<Vec<MetricsHistoryPoint>, Error>;
    async fn statistics(&self) -> Result<Statistics, Error>;
    async fn topology(&self) -> Result<TopologyGraph, Error>;
    async fn status(&self) -> Result<BackendStatus, Error>;
    async fn block_ip(&self, ip: &str, duration_seconds: u64) -> Result<CommandResponse, Error>;
    async fn unblock_ip(&self, ip: &str) -> Result<CommandResponse, Error>;
}

/// reqwest-backed [`DashboardApi`]. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(http, parse_base(base_url)?))
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET");
        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await?;
        trace!(bytes = body.len(), endpoint = path, "response body");
        serde_json::from_slice(&body).map_err(|e| Error::decode(path, e))
    }

    // Commands report refusals as `{"error": "..."}` with a 4xx/5xx status.
    async fn post_command<B: Serialize>(&self, path: &str, body: &B) -> Result<CommandResponse, Error> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        match serde_json::from_slice::<CommandResponse>(&bytes) {
            Ok(parsed) if status.is_success() => Ok(parsed),
            Ok(parsed) if parsed.error.is_some() => Ok(CommandResponse {
                success: false,
                error: parsed.error,
            }),
            Ok(_) => Err(status_error(path, status)),
            Err(e) if status.is_success() => Err(Error::decode(path, e)),
            Err(_) => Err(status_error(path, status)),
        }
    }
}

fn status_error(path: &str, status: StatusCode) -> Error {
    Error::Status {
        endpoint: path.to_string(),
        status: status.as_u16(),
    }
}

/// Normalizes a user-supplied base URL so relative joins keep any path prefix.
pub fn parse_base(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let p = format!("{}/", url.path());
        url.set_path(&p);
    }
    Ok(url)
}

impl DashboardApi for HttpApi {
    async fn alerts(&self, limit: usize, severity: Option<Severity>) -> Result<Vec<Alert>, Error> {
        let mut q = vec![("limit", limit.to_string())];
        if let Some(s) = severity {
            q.push(("severity", s.level().to_string()));
        }
        self.get_json("api/alerts", &q).await
    }

    async fn metrics(&self) -> Result<MetricSample, Error> {
        self.get_json("api/metrics", &[]).await
    }

    async fn metrics_history(&self, hours: u32) -> Result<Vec<MetricsHistoryPoint>, Error> {
        self.get_json("api/metrics/history", &[("hours", hours.to_string())])
            .await
    }

    async fn statistics(&self) -> Result<Statistics, Error> {
        self.get_json("api/statistics", &[]).await
    }

    async fn topology(&self) -> Result<TopologyGraph, Error> {
        self.get_json("api/topology", &[]).await
    }

    async fn status(&self) -> Result<BackendStatus, Error> {
        self.get_json("api/status", &[]).await
    }

    async fn block_ip(&self, ip: &str, duration_seconds: u64) -> Result<CommandResponse, Error> {
        self.post_command(
            "api/block_ip",
            &BlockIpRequest {
                ip,
                duration_seconds,
            },
        )
        .await
    }

    async fn unblock_ip(&self, ip: &str) -> Result<CommandResponse, Error> {
        self.post_command("api/unblock_ip", &UnblockIpRequest { ip })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_keeps_path_prefix() {
        let u = parse_base("http://10.0.0.2:5000/nidps").unwrap();
        assert_eq!(u.as_str(), "http://10.0.0.2:5000/nidps/");
        assert_eq!(
            u.join("api/alerts").unwrap().as_str(),
            "http://10.0.0.2:5000/nidps/api/alerts"
        );
    }

    #[test]
    fn bare_host_gets_root_path() {
        let u = parse_base("http://127.0.0.1:5000").unwrap();
        assert_eq!(u.join("api/metrics").unwrap().path(), "/api/metrics");
    }
}
