use crate::domain::ports::Storage;
use crate::stats::collector::{EndpointRow, StatsSnapshot};
use crate::utils::error::{Result, SwarmError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final summary table, printed once the swarm has stopped.
pub fn print_summary(snapshot: &StatsSnapshot) {
    println!();
    println!(
        "{:<6} {:<28} {:>9} {:>14} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Type", "Name", "# reqs", "# fails", "Avg", "Min", "Max", "Med", "95%", "req/s"
    );
    println!("{}", "-".repeat(112));

    for row in &snapshot.endpoints {
        print_row(row);
    }

    println!("{}", "-".repeat(112));
    print_row(&snapshot.aggregated);

    if !snapshot.failures.is_empty() {
        println!();
        println!("Error report");
        println!("{:>12}  {:<6} {:<28} {}", "# occurrences", "Type", "Name", "Error");
        println!("{}", "-".repeat(112));
        for failure in &snapshot.failures {
            println!(
                "{:>12}  {:<6} {:<28} {}",
                failure.occurrences,
                failure.method.as_str(),
                failure.name,
                failure.error
            );
        }
    }

    println!();
    println!(
        "Users: {} spawned, peak {} concurrent | Duration: {:.2}s",
        snapshot.users.spawned, snapshot.users.peak, snapshot.elapsed_secs
    );
}

fn print_row(row: &EndpointRow) {
    let failure_pct = if row.requests > 0 {
        row.failures as f64 / row.requests as f64 * 100.0
    } else {
        0.0
    };

    println!(
        "{:<6} {:<28} {:>9} {:>6}({:>5.2}%) {:>8.0} {:>8} {:>8} {:>8} {:>8} {:>8.2}",
        row.method.map(|m| m.as_str()).unwrap_or(""),
        row.name,
        row.requests,
        row.failures,
        failure_pct,
        row.mean_ms,
        row.min_ms,
        row.max_ms,
        row.median_ms,
        row.p95_ms,
        row.requests_per_sec
    );
}

/// One line of `{prefix}_stats.csv`, in Locust column order.
#[derive(Serialize)]
struct StatsCsvRow<'a> {
    #[serde(rename = "Type")]
    method: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Request Count")]
    requests: u64,
    #[serde(rename = "Failure Count")]
    failures: u64,
    #[serde(rename = "Median Response Time")]
    median_ms: u64,
    #[serde(rename = "Average Response Time")]
    mean_ms: f64,
    #[serde(rename = "Min Response Time")]
    min_ms: u64,
    #[serde(rename = "Max Response Time")]
    max_ms: u64,
    #[serde(rename = "95%")]
    p95_ms: u64,
    #[serde(rename = "99%")]
    p99_ms: u64,
    #[serde(rename = "Average Content Size")]
    avg_content_length: f64,
    #[serde(rename = "Requests/s")]
    requests_per_sec: f64,
    #[serde(rename = "Failures/s")]
    failures_per_sec: f64,
}

impl<'a> From<&'a EndpointRow> for StatsCsvRow<'a> {
    fn from(row: &'a EndpointRow) -> Self {
        Self {
            method: row.method.map(|m| m.as_str()).unwrap_or(""),
            name: &row.name,
            requests: row.requests,
            failures: row.failures,
            median_ms: row.median_ms,
            mean_ms: row.mean_ms,
            min_ms: row.min_ms,
            max_ms: row.max_ms,
            p95_ms: row.p95_ms,
            p99_ms: row.p99_ms,
            avg_content_length: row.avg_content_length,
            requests_per_sec: row.requests_per_sec,
            failures_per_sec: row.failures_per_sec,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    host: &'a str,
    #[serde(flatten)]
    snapshot: &'a StatsSnapshot,
}

/// Writes report files through a [`Storage`] backend.
pub struct ReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Writes `{prefix}_stats.csv` and `{prefix}_failures.csv`, returning both locations.
    pub async fn write_csv(&self, prefix: &str, snapshot: &StatsSnapshot) -> Result<Vec<String>> {
        let mut stats = csv::Writer::from_writer(Vec::new());
        for row in snapshot.endpoints.iter().chain(std::iter::once(&snapshot.aggregated)) {
            stats.serialize(StatsCsvRow::from(row))?;
        }
        let stats_bytes = stats.into_inner().map_err(|e| SwarmError::ReportError {
            message: format!("failed to flush stats CSV: {}", e),
        })?;

        let mut failures = csv::Writer::from_writer(Vec::new());
        if snapshot.failures.is_empty() {
            failures.write_record(["Method", "Name", "Error", "Occurrences"])?;
        }
        for row in &snapshot.failures {
            failures.serialize(row)?;
        }
        let failure_bytes = failures.into_inner().map_err(|e| SwarmError::ReportError {
            message: format!("failed to flush failures CSV: {}", e),
        })?;

        let stats_path = self
            .storage
            .write_file(&format!("{}_stats.csv", prefix), &stats_bytes)
            .await?;
        let failures_path = self
            .storage
            .write_file(&format!("{}_failures.csv", prefix), &failure_bytes)
            .await?;

        tracing::info!("📁 CSV reports written to {} and {}", stats_path, failures_path);
        Ok(vec![stats_path, failures_path])
    }

    pub async fn write_json(&self, path: &str, host: &str, snapshot: &StatsSnapshot) -> Result<String> {
        let report = JsonReport {
            generated_at: Utc::now(),
            host,
            snapshot,
        };
        let bytes = serde_json::to_vec_pretty(&report)?;
        let location = self.storage.write_file(path, &bytes).await?;

        tracing::info!("📁 JSON report written to {}", location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{HttpMethod, RequestRecord};
    use crate::stats::collector::StatsCollector;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStorage {
        fn text(&self, path: &str) -> String {
            String::from_utf8(self.files.lock()[path].clone()).unwrap()
        }
    }

    impl Storage for MemoryStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            self.files.lock().insert(path.to_string(), data.to_vec());
            Ok(format!("memory://{}", path))
        }
    }

    fn snapshot() -> StatsSnapshot {
        let stats = StatsCollector::new().unwrap();
        for (status, error) in [(200, None), (200, None), (403, Some("HTTP 403 Forbidden"))] {
            stats.record(&RequestRecord {
                name: "get_user_balance".to_string(),
                method: HttpMethod::Get,
                path: "/auth/balance".to_string(),
                status: Some(status),
                latency: Duration::from_millis(12),
                content_length: 20,
                error: error.map(str::to_string),
            });
        }
        stats.snapshot()
    }

    #[tokio::test]
    async fn test_csv_rows_and_failures() {
        let storage = MemoryStorage::default();
        let writer = ReportWriter::new(storage.clone());

        let files = writer.write_csv("balance", &snapshot()).await.unwrap();
        assert_eq!(
            files,
            vec!["memory://balance_stats.csv", "memory://balance_failures.csv"]
        );

        let stats = storage.text("balance_stats.csv");
        let lines: Vec<&str> = stats.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Type,Name,Request Count,Failure Count,Median Response Time"));
        assert!(lines[1].starts_with("GET,get_user_balance,3,1,"));
        assert!(lines[2].starts_with(",Aggregated,3,1,"));
        assert!(lines[0].ends_with("Requests/s,Failures/s"));
        assert!(!stats.contains("status"));

        let failures = storage.text("balance_failures.csv");
        assert_eq!(
            failures.lines().collect::<Vec<_>>(),
            vec!["Method,Name,Error,Occurrences", "GET,get_user_balance,HTTP 403 Forbidden,1"]
        );
    }

    #[tokio::test]
    async fn test_json_report_flattens_snapshot() {
        let storage = MemoryStorage::default();
        let writer = ReportWriter::new(storage.clone());

        writer
            .write_json("out.json", "http://localhost:3001", &snapshot())
            .await
            .unwrap();

        let report: serde_json::Value = serde_json::from_str(&storage.text("out.json")).unwrap();
        assert_eq!(report["host"], "http://localhost:3001");
        assert_eq!(report["aggregated"]["Failure Count"], 1);
        assert_eq!(report["endpoints"][0]["Name"], "get_user_balance");
        assert_eq!(report["failures"][0]["Occurrences"], 1);
        assert_eq!(report["endpoints"][0]["status_codes"]["200"], 2);
        assert_eq!(report["endpoints"][0]["status_codes"]["403"], 1);
    }
}
