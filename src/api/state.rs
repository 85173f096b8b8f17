use crate::api::upstream::UpstreamClient;
use crate::core::{AppConfig, AuditLog, ReleaseStats, TiktokenRegistry, TokenizerRegistry};
use std::sync::Arc;

/// Shared application state.
///
/// Created once at startup; requests only read from it. The audit log and
/// release counters synchronize internally.
pub struct AppState {
    pub config: AppConfig,
    pub upstream: UpstreamClient,
    pub audit_log: AuditLog,
    pub tokenizers: Arc<dyn TokenizerRegistry>,
    pub release_stats: Arc<ReleaseStats>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        upstream: UpstreamClient,
        audit_log: AuditLog,
        tokenizers: Arc<dyn TokenizerRegistry>,
    ) -> Self {
        Self {
            config,
            upstream,
            audit_log,
            tokenizers,
            release_stats: Arc::new(ReleaseStats::new()),
        }
    }

    /// Build the state for `config` with the production tokenizer registry.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        let audit_log = AuditLog::from_path(config.audit_log_path.as_deref()).await?;
        Ok(Self::new(
            config,
            upstream,
            audit_log,
            Arc::new(TiktokenRegistry::new()),
        ))
    }
}
