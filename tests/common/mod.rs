//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::{body::Body, http::Request, Router};
use openai_bridge::{
    api::UpstreamClient,
    core::{
        config::{ServerConfig, UpstreamConfig},
        AuditLog, TiktokenRegistry, Tokenizer, TokenizerRegistry,
    },
    build_router, AppConfig, AppState,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const SECRET: &str = "proxy-secret";
pub const UPSTREAM_KEY: &str = "sk-upstream";
pub const SALT: &str = "test-salt";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub audit_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// Audit records written so far, one JSON value per line.
    pub fn audit_records(&self) -> Vec<Value> {
        let contents = std::fs::read_to_string(&self.audit_path).unwrap_or_default();
        contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("audit line is valid JSON"))
            .collect()
    }

    pub fn audit_raw(&self) -> String {
        std::fs::read_to_string(&self.audit_path).unwrap_or_default()
    }
}

pub fn test_config(api_base: &str, timeout_secs: u64, audit_path: PathBuf) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        upstream: UpstreamConfig {
            api_base: api_base.to_string(),
            api_key: UPSTREAM_KEY.to_string(),
            request_timeout_secs: timeout_secs,
            verify_ssl: false,
        },
        authorization_key: SECRET.to_string(),
        uid_hash_salt: SALT.to_string(),
        audit_log_path: Some(audit_path),
        max_body_bytes: 1024 * 1024,
    }
}

pub async fn create_test_app_with(
    api_base: &str,
    timeout_secs: u64,
    tokenizers: Arc<dyn TokenizerRegistry>,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let config = test_config(api_base, timeout_secs, audit_path.clone());

    let upstream = UpstreamClient::new(&config.upstream).unwrap();
    let audit_log = AuditLog::open(&audit_path).await.unwrap();
    let state = Arc::new(AppState::new(config, upstream, audit_log, tokenizers));

    TestApp {
        router: build_router(state.clone()),
        state,
        audit_path,
        _dir: dir,
    }
}

pub async fn create_test_app(api_base: &str) -> TestApp {
    create_test_app_with(api_base, 5, Arc::new(TiktokenRegistry::new())).await
}

/// Request builder with the proxy's bearer credential already set.
pub fn authed() -> axum::http::request::Builder {
    Request::builder().header("authorization", format!("Bearer {}", SECRET))
}

pub async fn body_bytes(body: Body) -> bytes::Bytes {
    axum::body::to_bytes(body, usize::MAX).await.unwrap()
}

pub async fn body_string(body: Body) -> String {
    String::from_utf8(body_bytes(body).await.to_vec()).unwrap()
}

/// Counts whitespace-separated words; knows a single model.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

pub struct StubRegistry {
    pub model: &'static str,
}

impl TokenizerRegistry for StubRegistry {
    fn tokenizer_for_model(&self, model: &str) -> Option<Arc<dyn Tokenizer>> {
        (model == self.model).then(|| Arc::new(WordTokenizer) as Arc<dyn Tokenizer>)
    }
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
