use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, warn};

use crate::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counted {
    Nothing,
    Articles,
    Keywords,
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    name: &'static str,
    path: &'static str,
    counted: Counted,
}

const ENDPOINTS: [Endpoint; 4] = [
    Endpoint {
        name: "API root",
        path: "",
        counted: Counted::Nothing,
    },
    Endpoint {
        name: "Articles",
        path: "articles/",
        counted: Counted::Articles,
    },
    Endpoint {
        name: "Keywords",
        path: "keywords/",
        counted: Counted::Keywords,
    },
    Endpoint {
        name: "Single article",
        path: "articles/1/",
        counted: Counted::Nothing,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Healthy {
        status: u16,
        elapsed: Duration,
        /// Item count reported by listing endpoints, when the body could be read.
        items: Option<u64>,
    },
    BadStatus {
        status: u16,
        elapsed: Duration,
    },
    Unreachable {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub name: &'static str,
    pub url: String,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Healthy { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSummary {
    pub reports: Vec<ProbeReport>,
}

impl HealthSummary {
    pub fn healthy_count(&self) -> usize {
        self.reports.iter().filter(|report| report.is_healthy()).count()
    }

    /// Percentage of endpoints that answered 2xx.
    pub fn success_rate(&self) -> f64 {
        if self.reports.is_empty() {
            return 0.0;
        }
        self.healthy_count() as f64 * 100.0 / self.reports.len() as f64
    }

    pub fn average_latency(&self) -> Option<Duration> {
        let latencies: Vec<Duration> = self
            .reports
            .iter()
            .filter_map(|report| match report.outcome {
                ProbeOutcome::Healthy { elapsed, .. } => Some(elapsed),
                _ => None,
            })
            .collect();
        let count = u32::try_from(latencies.len()).ok().filter(|count| *count > 0)?;
        Some(latencies.iter().sum::<Duration>() / count)
    }

    pub fn is_healthy(&self) -> bool {
        !self.reports.is_empty() && self.healthy_count() == self.reports.len()
    }
}

fn count_items(counted: Counted, body: &Value) -> Option<u64> {
    match counted {
        Counted::Nothing => None,
        Counted::Articles => body
            .get("count")
            .and_then(Value::as_u64)
            .or_else(|| body.as_array().map(|items| items.len() as u64)),
        Counted::Keywords => body.as_array().map(|items| items.len() as u64),
    }
}

impl ApiClient {
    async fn probe(&self, endpoint: Endpoint) -> ProbeReport {
        let url = match self.endpoint(endpoint.path) {
            Ok(url) => url,
            Err(e) => {
                return ProbeReport {
                    name: endpoint.name,
                    url: endpoint.path.to_string(),
                    outcome: ProbeOutcome::Unreachable { error: e.to_string() },
                }
            }
        };

        let started = Instant::now();
        let outcome = match self.client().get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                let elapsed = started.elapsed();
                if status.is_success() {
                    let items = match response.json::<Value>().await {
                        Ok(body) => count_items(endpoint.counted, &body),
                        Err(_) => None,
                    };
                    ProbeOutcome::Healthy {
                        status: status.as_u16(),
                        elapsed,
                        items,
                    }
                } else {
                    ProbeOutcome::BadStatus {
                        status: status.as_u16(),
                        elapsed,
                    }
                }
            }
            Err(e) => ProbeOutcome::Unreachable { error: e.to_string() },
        };

        match &outcome {
            ProbeOutcome::Healthy { status, elapsed, .. } => {
                info!(endpoint = endpoint.name, status, ?elapsed, "endpoint healthy")
            }
            ProbeOutcome::BadStatus { status, .. } => {
                warn!(endpoint = endpoint.name, status, "endpoint returned error status")
            }
            ProbeOutcome::Unreachable { error } => {
                warn!(endpoint = endpoint.name, %error, "endpoint unreachable")
            }
        }

        ProbeReport {
            name: endpoint.name,
            url: url.to_string(),
            outcome,
        }
    }

    /// Probes the root, listing, keyword and detail endpoints in turn, waiting
    /// `delay` between requests.
    pub async fn check_health(&self, delay: Duration) -> HealthSummary {
        let mut summary = HealthSummary::default();
        for (index, endpoint) in ENDPOINTS.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            summary.reports.push(self.probe(*endpoint).await);
        }
        summary
    }
}
