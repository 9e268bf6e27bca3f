use crate::domain::model::{HttpMethod, Operation, Outcome, RequestRecord, Session};
use crate::domain::ports::Executor;
use crate::utils::error::Result;
use crate::utils::validation::validate_host;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};

/// Executes catalog operations with one pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    host: String,
}

impl HttpExecutor {
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        validate_host("host", host)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trade-swarm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.host, path)
        } else {
            format!("{}/{}", self.host, path)
        }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, operation: &Operation, session: &Session) -> Outcome {
        let url = self.url_for(&operation.path);
        let mut request = match operation.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        if let Some(body) = operation.render_body(session.user_id) {
            request = request.json(&body);
        }
        if let Some(token) = session.bearer_token() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        tracing::debug!(
            "User {} -> {} {}",
            session.user_id,
            operation.method,
            operation.path
        );

        let started = Instant::now();
        let mut record = RequestRecord {
            name: operation.name.clone(),
            method: operation.method,
            path: operation.path.clone(),
            status: None,
            latency: Duration::ZERO,
            content_length: 0,
            error: None,
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                record.latency = started.elapsed();
                record.error = Some(describe_transport_error(&e));
                return Outcome { record, body: None };
            }
        };

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);

        // 計時包含讀取完整回應內容
        let bytes = response.bytes().await;
        record.latency = started.elapsed();
        record.status = Some(status.as_u16());

        let body = match bytes {
            Ok(bytes) => {
                record.content_length = bytes.len() as u64;
                if is_json {
                    serde_json::from_slice(&bytes).ok()
                } else {
                    None
                }
            }
            Err(e) => {
                record.error = Some(describe_transport_error(&e));
                None
            }
        };

        if record.error.is_none() && !status.is_success() {
            record.error = Some(match status.canonical_reason() {
                Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
                None => format!("HTTP {}", status.as_u16()),
            });
        }

        Outcome { record, body }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Timeout".to_string()
    } else if error.is_connect() {
        format!("ConnectionError: {}", error)
    } else {
        format!("RequestError: {}", error)
    }
}
