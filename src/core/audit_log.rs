//! Append-only JSONL audit log.
//!
//! One [`AuditRecord`] is written per proxied request, as soon as the
//! upstream status is known. Records are serialized to a single line and
//! written under a mutex so concurrent requests never interleave partial
//! lines. When no destination is configured the log discards everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

// ============================================================================
// Record Types
// ============================================================================

/// Upstream outcome captured in an audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResponse {
    /// HTTP status code returned by the upstream
    pub status: u16,
}

/// Audit record for a single proxied request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Time the upstream response headers arrived
    pub timestamp: DateTime<Utc>,
    /// Request ID assigned by the proxy
    pub request_id: String,
    /// Request path
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Query parameters; repeated names collect their values in an array
    pub query_params: Map<String, Value>,
    /// Forwarded body with the identity field already hashed
    pub body: Value,
    /// Upstream outcome
    pub res: AuditResponse,
}

impl AuditRecord {
    /// Create a new audit record stamped with the current time
    pub fn new(
        request_id: String,
        url: String,
        method: String,
        query: &[(String, String)],
        body: Value,
        status: u16,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id,
            url,
            method,
            query_params: query_params_object(query),
            body,
            res: AuditResponse { status },
        }
    }
}

/// Fold ordered query pairs into a JSON object.
///
/// A name that appears once maps to its string value; a repeated name maps to
/// an array of its values in request order.
pub fn query_params_object(query: &[(String, String)]) -> Map<String, Value> {
    let mut params = Map::new();
    for (name, value) in query {
        let value = Value::String(value.clone());
        match params.get_mut(name) {
            None => {
                params.insert(name.clone(), value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    params
}

// ============================================================================
// Logger Implementation
// ============================================================================

enum AuditSink {
    Discard,
    File { path: PathBuf, file: Mutex<File> },
}

/// Audit log shared by all requests
pub struct AuditLog {
    sink: AuditSink,
}

impl AuditLog {
    /// An audit log that drops every record
    pub fn discard() -> Self {
        Self {
            sink: AuditSink::Discard,
        }
    }

    /// Open (or create) `path` for appending
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::info!("Audit logging enabled, writing to: {}", path.display());

        Ok(Self {
            sink: AuditSink::File {
                path,
                file: Mutex::new(file),
            },
        })
    }

    /// Build the audit log for an optional configured destination
    pub async fn from_path(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::open(path).await,
            None => {
                tracing::info!("Audit logging disabled, records are discarded");
                Ok(Self::discard())
            }
        }
    }

    /// Whether records are actually persisted
    pub fn is_enabled(&self) -> bool {
        matches!(self.sink, AuditSink::File { .. })
    }

    /// Append one record as a single line.
    ///
    /// Failures are logged and swallowed: an unwritable audit log must not
    /// fail the request being served.
    pub async fn append(&self, record: &AuditRecord) {
        let AuditSink::File { path, file } = &self.sink else {
            return;
        };

        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to serialize audit record: {}", e);
                return;
            }
        };
        line.push(b'\n');

        let mut file = file.lock().await;
        if let Err(e) = file.write_all(&line).await {
            tracing::error!(path = %path.display(), "Failed to write audit record: {}", e);
            return;
        }
        if let Err(e) = file.flush().await {
            tracing::error!(path = %path.display(), "Failed to flush audit log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_params_object() {
        let params = query_params_object(&pairs(&[("a", "1"), ("b", "2"), ("a", "3"), ("a", "4")]));
        assert_eq!(Value::Object(params), json!({"a": ["1", "3", "4"], "b": "2"}));
    }

    #[test]
    fn test_record_serialization_shape() {
        let record = AuditRecord::new(
            "req-1".to_string(),
            "/v1/chat/completions".to_string(),
            "POST".to_string(),
            &pairs(&[("stream", "true")]),
            json!({"user": "abc"}),
            200,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["url"], "/v1/chat/completions");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["query_params"], json!({"stream": "true"}));
        assert_eq!(value["body"], json!({"user": "abc"}));
        assert_eq!(value["res"], json!({"status": 200}));
        assert_eq!(value["request_id"], "req-1");
    }

    #[tokio::test]
    async fn test_discard_log() {
        let log = AuditLog::from_path(None).await.unwrap();
        assert!(!log.is_enabled());
        let record = AuditRecord::new(
            String::new(),
            "/".to_string(),
            "GET".to_string(),
            &[],
            Value::Null,
            200,
        );
        log.append(&record).await;
    }

    #[tokio::test]
    async fn test_append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let log = Arc::new(AuditLog::open(&path).await.unwrap());
        assert!(log.is_enabled());

        let mut handles = Vec::new();
        for i in 0..20u16 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let record = AuditRecord::new(
                    format!("req-{}", i),
                    "/v1/models".to_string(),
                    "GET".to_string(),
                    &[],
                    json!({"padding": "x".repeat(4096)}),
                    200 + i,
                );
                log.append(&record).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let records: Vec<AuditRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 20);
        let mut statuses: Vec<u16> = records.iter().map(|r| r.res.status).collect();
        statuses.sort_unstable();
        assert_eq!(statuses, (200..220).collect::<Vec<u16>>());
    }

    #[tokio::test]
    async fn test_open_appends_to_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{\"existing\":true}\n").unwrap();

        let log = AuditLog::open(file.path()).await.unwrap();
        let record = AuditRecord::new(
            "req".to_string(),
            "/".to_string(),
            "GET".to_string(),
            &[],
            Value::Null,
            204,
        );
        log.append(&record).await;

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "{\"existing\":true}");
    }
}
