//! Best-effort page-visit telemetry
//!
//! Failures never reach the caller: the beacon either lands or is dropped
//! with a debug log line.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Path of the tracking endpoint under the metrics base URL
pub const TRACK_PATH: &str = "/api/track";
pub const PAGE_VISITS_METRIC: &str = "web_page_visits_total";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MetricType,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
    /// Milliseconds since the epoch
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBatch {
    pub site: String,
    pub metrics: Vec<Metric>,
    pub timestamp: u64,
}

impl MetricBatch {
    /// A single `web_page_visits_total` increment for `page` on `site`
    pub fn page_visit(site: &str, page: &str, now_ms: u64) -> Self {
        let labels = BTreeMap::from([
            ("site".to_string(), site.to_string()),
            ("page".to_string(), page.to_string()),
        ]);
        Self {
            site: site.to_string(),
            metrics: vec![Metric {
                name: PAGE_VISITS_METRIC.to_string(),
                kind: MetricType::Counter,
                value: 1.0,
                labels,
                timestamp: now_ms,
            }],
            timestamp: now_ms,
        }
    }
}

/// Fire-and-forget client for the metrics API
#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl MetricsClient {
    /// Client posting to `<base_url>/api/track`; `None` disables tracking
    pub fn new(base_url: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build metrics HTTP client ({}), using defaults", e);
                reqwest::Client::new()
            });
        let endpoint = base_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| format!("{}{}", url.trim_end_matches('/'), TRACK_PATH));

        Self { http, endpoint }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Post one page visit; every error is swallowed
    pub async fn track_page_visit(&self, site: &str, page: &str) {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return;
        };

        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let batch = MetricBatch::page_visit(site, page, now_ms);

        match self.http.post(endpoint).json(&batch).send().await {
            Ok(response) => debug!("Page visit tracked: {} {}", page, response.status()),
            Err(e) => debug!("Page visit tracking failed: {}", e),
        }
    }
}
