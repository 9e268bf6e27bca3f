//! Thread-safe request statistics with latency histograms.

use crate::domain::model::{HttpMethod, RequestRecord};
use crate::utils::error::{Result, SwarmError};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const AGGREGATED: &str = "Aggregated";

type EndpointKey = (HttpMethod, String);
type FailureKey = (HttpMethod, String, String);

#[derive(Debug, Clone)]
struct EndpointStats {
    requests: u64,
    failures: u64,
    content_bytes: u64,
    status_codes: BTreeMap<u16, u64>,
    latencies: Histogram<u64>,
}

impl EndpointStats {
    fn new(template: &Histogram<u64>) -> Self {
        Self {
            requests: 0,
            failures: 0,
            content_bytes: 0,
            status_codes: BTreeMap::new(),
            latencies: template.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct StatsTable {
    endpoints: BTreeMap<EndpointKey, EndpointStats>,
    failures: BTreeMap<FailureKey, u64>,
}

#[derive(Debug, Default)]
struct UserGauge {
    spawned: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Clone)]
pub struct StatsCollector {
    table: Arc<RwLock<StatsTable>>,
    users: Arc<UserGauge>,
    template: Histogram<u64>,
    start_time: Instant,
}

impl StatsCollector {
    pub fn new() -> Result<Self> {
        // 3 significant digits, auto-resizing
        let template = Histogram::<u64>::new(3).map_err(|e| SwarmError::ReportError {
            message: format!("cannot create latency histogram: {}", e),
        })?;

        Ok(Self {
            table: Arc::new(RwLock::new(StatsTable::default())),
            users: Arc::new(UserGauge::default()),
            template,
            start_time: Instant::now(),
        })
    }

    pub fn record(&self, record: &RequestRecord) {
        let latency_ms = record.latency.as_millis() as u64;
        let mut guard = self.table.write();
        let table = &mut *guard;

        let entry = table
            .endpoints
            .entry((record.method, record.name.clone()))
            .or_insert_with(|| EndpointStats::new(&self.template));
        entry.requests += 1;
        entry.content_bytes += record.content_length;
        entry.latencies.saturating_record(latency_ms);
        if let Some(status) = record.status {
            *entry.status_codes.entry(status).or_default() += 1;
        }

        if let Some(error) = &record.error {
            entry.failures += 1;
            *table
                .failures
                .entry((record.method, record.name.clone(), error.clone()))
                .or_default() += 1;
        }
    }

    pub fn user_started(&self) {
        self.users.spawned.fetch_add(1, Ordering::SeqCst);
        let active = self.users.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.users.peak.fetch_max(active, Ordering::SeqCst);
    }

    pub fn user_stopped(&self) {
        let _ = self
            .users
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn active_users(&self) -> usize {
        self.users.active.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn total_requests(&self) -> u64 {
        self.table.read().endpoints.values().map(|e| e.requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.table.read().endpoints.values().map(|e| e.failures).sum()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.elapsed();
        let table = self.table.read();

        let mut aggregated = EndpointStats::new(&self.template);
        let mut endpoints = Vec::with_capacity(table.endpoints.len());

        for ((method, name), stats) in &table.endpoints {
            endpoints.push(EndpointRow::from_stats(
                Some(*method),
                name,
                stats,
                elapsed,
            ));

            aggregated.requests += stats.requests;
            aggregated.failures += stats.failures;
            aggregated.content_bytes += stats.content_bytes;
            for (status, count) in &stats.status_codes {
                *aggregated.status_codes.entry(*status).or_default() += count;
            }
            if let Err(e) = aggregated.latencies.add(&stats.latencies) {
                tracing::warn!("Could not merge latencies for {}: {}", name, e);
            }
        }

        let failures = table
            .failures
            .iter()
            .map(|((method, name, error), occurrences)| FailureRow {
                method: *method,
                name: name.clone(),
                error: error.clone(),
                occurrences: *occurrences,
            })
            .collect();

        StatsSnapshot {
            elapsed_secs: elapsed.as_secs_f64(),
            endpoints,
            aggregated: EndpointRow::from_stats(None, AGGREGATED, &aggregated, elapsed),
            failures,
            users: UserCounts {
                spawned: self.users.spawned.load(Ordering::SeqCst),
                active: self.users.active.load(Ordering::SeqCst),
                peak: self.users.peak.load(Ordering::SeqCst),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointRow {
    #[serde(rename = "Type")]
    pub method: Option<HttpMethod>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Request Count")]
    pub requests: u64,
    #[serde(rename = "Failure Count")]
    pub failures: u64,
    #[serde(rename = "Median Response Time")]
    pub median_ms: u64,
    #[serde(rename = "Average Response Time")]
    pub mean_ms: f64,
    #[serde(rename = "Min Response Time")]
    pub min_ms: u64,
    #[serde(rename = "Max Response Time")]
    pub max_ms: u64,
    #[serde(rename = "95%")]
    pub p95_ms: u64,
    #[serde(rename = "99%")]
    pub p99_ms: u64,
    #[serde(rename = "Average Content Size")]
    pub avg_content_length: f64,
    #[serde(rename = "Requests/s")]
    pub requests_per_sec: f64,
    #[serde(rename = "Failures/s")]
    pub failures_per_sec: f64,
    /// Responses per HTTP status; JSON only, CSV rows are flat.
    pub status_codes: BTreeMap<u16, u64>,
}

impl EndpointRow {
    fn from_stats(
        method: Option<HttpMethod>,
        name: &str,
        stats: &EndpointStats,
        elapsed: Duration,
    ) -> Self {
        let seconds = elapsed.as_secs_f64();
        let per_sec = |count: u64| if seconds > 0.0 { count as f64 / seconds } else { 0.0 };
        let hist = &stats.latencies;
        let empty = hist.is_empty();

        Self {
            method,
            name: name.to_string(),
            requests: stats.requests,
            failures: stats.failures,
            median_ms: if empty { 0 } else { hist.value_at_quantile(0.50) },
            mean_ms: if empty { 0.0 } else { hist.mean() },
            min_ms: if empty { 0 } else { hist.min() },
            max_ms: if empty { 0 } else { hist.max() },
            p95_ms: if empty { 0 } else { hist.value_at_quantile(0.95) },
            p99_ms: if empty { 0 } else { hist.value_at_quantile(0.99) },
            avg_content_length: if stats.requests > 0 {
                stats.content_bytes as f64 / stats.requests as f64
            } else {
                0.0
            },
            requests_per_sec: per_sec(stats.requests),
            failures_per_sec: per_sec(stats.failures),
            status_codes: stats.status_codes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    #[serde(rename = "Method")]
    pub method: HttpMethod,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Occurrences")]
    pub occurrences: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct UserCounts {
    pub spawned: usize,
    pub active: usize,
    pub peak: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub elapsed_secs: f64,
    pub endpoints: Vec<EndpointRow>,
    pub aggregated: EndpointRow,
    pub failures: Vec<FailureRow>,
    pub users: UserCounts,
}

impl StatsSnapshot {
    pub fn endpoint(&self, name: &str) -> Option<&EndpointRow> {
        self.endpoints.iter().find(|row| row.name == name)
    }

    pub fn has_failures(&self) -> bool {
        self.aggregated.failures > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: u16, latency_ms: u64) -> RequestRecord {
        RequestRecord {
            name: name.to_string(),
            method: HttpMethod::Get,
            path: format!("/{}", name),
            status: Some(status),
            latency: Duration::from_millis(latency_ms),
            content_length: 100,
            error: if (200..300).contains(&status) {
                None
            } else {
                Some(format!("HTTP {}", status))
            },
        }
    }

    #[test]
    fn test_counts_and_percentiles() {
        let stats = StatsCollector::new().unwrap();
        for latency in 1..=100 {
            stats.record(&record("load_companies", 200, latency));
        }
        stats.record(&record("get_all_posts", 500, 40));
        stats.record(&record("get_all_posts", 500, 60));

        let snapshot = stats.snapshot();
        let companies = snapshot.endpoint("load_companies").unwrap();
        assert_eq!(companies.requests, 100);
        assert_eq!(companies.failures, 0);
        assert_eq!(companies.min_ms, 1);
        assert_eq!(companies.max_ms, 100);
        assert_eq!(companies.median_ms, 50);
        assert_eq!(companies.avg_content_length, 100.0);

        let posts = snapshot.endpoint("get_all_posts").unwrap();
        assert_eq!(posts.failures, 2);
        assert_eq!(posts.status_codes.get(&500), Some(&2));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["endpoints"][0]["status_codes"]["500"], 2);
        assert_eq!(json["aggregated"]["status_codes"]["200"], 100);

        assert_eq!(snapshot.aggregated.requests, 102);
        assert_eq!(snapshot.aggregated.failures, 2);
        assert_eq!(snapshot.aggregated.name, AGGREGATED);
        assert!(snapshot.has_failures());
    }

    #[test]
    fn test_failures_grouped_by_error() {
        let stats = StatsCollector::new().unwrap();
        stats.record(&record("get_user_info", 403, 5));
        stats.record(&record("get_user_info", 403, 5));
        stats.record(&record("get_user_info", 500, 5));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.failures.len(), 2);
        let forbidden = snapshot
            .failures
            .iter()
            .find(|row| row.error == "HTTP 403")
            .unwrap();
        assert_eq!(forbidden.occurrences, 2);
    }

    #[test]
    fn test_user_gauge_tracks_peak() {
        let stats = StatsCollector::new().unwrap();
        stats.user_started();
        stats.user_started();
        stats.user_started();
        stats.user_stopped();
        stats.user_stopped();
        stats.user_stopped();
        stats.user_stopped();

        let users = stats.snapshot().users;
        assert_eq!(users.spawned, 3);
        assert_eq!(users.active, 0);
        assert_eq!(users.peak, 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StatsCollector::new().unwrap().snapshot();
        assert!(snapshot.endpoints.is_empty());
        assert_eq!(snapshot.aggregated.requests, 0);
        assert_eq!(snapshot.aggregated.median_ms, 0);
        assert!(!snapshot.has_failures());
    }
}
