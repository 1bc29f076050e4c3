//! HTTP client for the collector endpoint.
//!
//! Each queued record is wrapped in a `{"timestamp", "data"}` envelope and
//! POSTed to the configured URL. One [`CollectorClient::deliver`] call owns
//! the bounded retry budget for one record; the caller only learns whether
//! the record was acknowledged.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use telemetry_queue_core::Record;
use tracing::{info, warn};

use crate::error::{DeliveryError, DeliveryResult};

/// Configuration for delivery attempts and the in-client retry loop.
#[derive(Debug, Clone)]
pub struct CollectorClientConfig {
    /// Collector endpoint URL.
    pub endpoint_url: String,
    /// Statically configured headers added to every request (auth tokens etc.).
    pub headers: HashMap<String, String>,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Attempts made for one record before `deliver` gives up.
    pub max_attempts: u32,
    /// Fixed delay between attempts for the same record.
    pub retry_delay: Duration,
}

impl Default for CollectorClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:8080/ingest".to_string(),
            headers: HashMap::new(),
            request_timeout: Duration::from_secs(5),
            max_attempts: 5,
            retry_delay: Duration::from_secs(3),
        }
    }
}

/// Wire envelope for one reading.
#[derive(Serialize)]
struct Envelope<'a> {
    timestamp: &'a str,
    data: &'a serde_json::Value,
}

/// HTTP delivery client for the collector.
#[derive(Clone)]
pub struct CollectorClient {
    http_client: reqwest::Client,
    config: CollectorClientConfig,
}

impl CollectorClient {
    /// Create a new collector client.
    pub fn new(config: CollectorClientConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    /// The configured endpoint URL.
    pub fn endpoint_url(&self) -> &str {
        &self.config.endpoint_url
    }

    /// Performs one delivery attempt for one record.
    ///
    /// Success is HTTP 200 exactly; every other outcome is an error with
    /// its category preserved for the logs.
    pub async fn send_once(&self, record: &Record) -> DeliveryResult<()> {
        let data: serde_json::Value = serde_json::from_str(&record.data)?;
        let envelope = Envelope {
            timestamp: &record.enqueued_at,
            data: &data,
        };

        let mut request = self
            .http_client
            .post(&self.config.endpoint_url)
            .timeout(self.config.request_timeout)
            .json(&envelope);
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                DeliveryError::Timeout
            } else {
                DeliveryError::Connection(err)
            }
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Delivers one record, retrying up to the configured attempt budget
    /// with a fixed inter-attempt delay.
    ///
    /// Returns true only when the collector acknowledged the record. The
    /// fixed bounded loop absorbs transient blips; anything longer is
    /// reported back as false so the dispatcher keeps the record at the
    /// head of the queue.
    pub async fn deliver(&self, record: &Record) -> bool {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.send_once(record).await {
                Ok(()) => {
                    info!(record_id = %record.id, "record delivered to collector");
                    return true;
                }
                Err(err) => {
                    warn!(
                        record_id = %record.id,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        category = err.category(),
                        error = %err,
                        "delivery attempt failed"
                    );
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        warn!(
            record_id = %record.id,
            attempts = max_attempts,
            "delivery attempt budget exhausted, record stays queued"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_queue_core::RecordId;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn test_record(data: &str) -> Record {
        Record {
            id: RecordId(1),
            data: data.to_string(),
            enqueued_at: "2026-08-06T10:00:00.000000Z".to_string(),
        }
    }

    fn test_config(endpoint_url: String) -> CollectorClientConfig {
        CollectorClientConfig {
            endpoint_url,
            headers: HashMap::new(),
            request_timeout: Duration::from_secs(2),
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
        }
    }

    /// Minimal HTTP responder: accepts connections, records each request
    /// (head + body) and answers with the given status.
    async fn spawn_collector(status: u16) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let sender = sender.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        let Ok(n) = socket.read(&mut chunk).await else {
                            return;
                        };
                        if n == 0 {
                            return;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        if let Some(head_end) = find_header_end(&buf) {
                            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                            let content_length = content_length(&head);
                            if buf.len() >= head_end + content_length {
                                let request = String::from_utf8_lossy(
                                    &buf[..head_end + content_length],
                                )
                                .to_string();
                                let _ = sender.send(request);
                                let reason = if status == 200 { "OK" } else { "Error" };
                                let response = format!(
                                    "HTTP/1.1 {} {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                                    status, reason
                                );
                                let _ = socket.write_all(response.as_bytes()).await;
                                let _ = socket.shutdown().await;
                                return;
                            }
                        }
                    }
                });
            }
        });

        (format!("http://{}/ingest", addr), receiver)
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|pos| pos + 4)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0)
    }

    fn request_body(request: &str) -> &str {
        request
            .split_once("\r\n\r\n")
            .map(|(_, body)| body)
            .unwrap_or("")
    }

    #[tokio::test]
    async fn send_once_succeeds_on_200() {
        let (url, mut requests) = spawn_collector(200).await;
        let client = CollectorClient::new(test_config(url));

        let record = test_record(r#"{"R001":"23.50"}"#);
        client.send_once(&record).await.unwrap();

        let request = requests.recv().await.unwrap();
        assert!(request.starts_with("POST /ingest HTTP/1.1"));
    }

    #[tokio::test]
    async fn send_once_reports_non_success_status() {
        let (url, _requests) = spawn_collector(500).await;
        let client = CollectorClient::new(test_config(url));

        let err = client
            .send_once(&test_record(r#"{"R001":"1"}"#))
            .await
            .unwrap_err();
        match err {
            DeliveryError::Status { status, .. } => assert_eq!(status, 500),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_once_reports_connection_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = CollectorClient::new(test_config(format!("http://{}/ingest", addr)));
        let err = client
            .send_once(&test_record(r#"{"R001":"1"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "connection");
    }

    #[tokio::test]
    async fn send_once_rejects_unparseable_stored_payload() {
        let (url, _requests) = spawn_collector(200).await;
        let client = CollectorClient::new(test_config(url));

        let err = client
            .send_once(&test_record("not json"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "payload");
    }

    #[tokio::test]
    async fn envelope_wraps_timestamp_and_data() {
        let (url, mut requests) = spawn_collector(200).await;
        let client = CollectorClient::new(test_config(url));

        let record = test_record(r#"{"R001":"23.50","зона":"№2"}"#);
        assert!(client.deliver(&record).await);

        let request = requests.recv().await.unwrap();
        let body: serde_json::Value = serde_json::from_str(request_body(&request)).unwrap();
        assert_eq!(body["timestamp"], "2026-08-06T10:00:00.000000Z");
        assert_eq!(body["data"]["R001"], "23.50");
        assert_eq!(body["data"]["зона"], "№2");
    }

    #[tokio::test]
    async fn configured_headers_are_sent() {
        let (url, mut requests) = spawn_collector(200).await;
        let mut config = test_config(url);
        config
            .headers
            .insert("Authorization".to_string(), "Bearer token-123".to_string());
        let client = CollectorClient::new(config);

        client
            .send_once(&test_record(r#"{"R001":"1"}"#))
            .await
            .unwrap();

        let request = requests.recv().await.unwrap();
        let head = request.to_lowercase();
        assert!(head.contains("authorization: bearer token-123"));
        assert!(head.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn deliver_exhausts_attempts_and_returns_false() {
        let (url, mut requests) = spawn_collector(503).await;
        let client = CollectorClient::new(test_config(url));

        assert!(!client.deliver(&test_record(r#"{"R001":"1"}"#)).await);

        // Both budgeted attempts reached the collector
        assert!(requests.try_recv().is_ok());
        assert!(requests.try_recv().is_ok());
        assert!(requests.try_recv().is_err());
    }
}
