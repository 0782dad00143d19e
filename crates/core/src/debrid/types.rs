//! Types for debrid resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal outcome of resolving one candidate to a playable stream.
///
/// Only [`Ready`](ResolutionOutcome::Ready) is cacheable; every other
/// outcome must be re-derived on the next request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Direct playable URL.
    Ready { url: String },
    /// The provider is still fetching the content; retry later.
    Pending { message: String },
    /// The torrent's payload does not contain the show it claims to.
    Mislabeled { expected: String, actual: String },
    /// Resolution failed outright.
    Error { message: String },
}

impl ResolutionOutcome {
    pub fn ready(url: impl Into<String>) -> Self {
        ResolutionOutcome::Ready { url: url.into() }
    }

    pub fn pending(message: impl Into<String>) -> Self {
        ResolutionOutcome::Pending {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ResolutionOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ResolutionOutcome::Ready { .. })
    }
}

/// Provider-side state of a submitted transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferStatus {
    /// Accepted but not started.
    Queued,
    /// Fetching, with progress in 0.0..=100.0.
    Downloading(f32),
    /// Content is on the provider's storage, files are listable.
    Downloaded,
    /// The provider gave up on this transfer.
    Failed(String),
}

/// One file inside a completed transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFile {
    /// Provider-scoped file id or restricted link.
    pub id: String,
    /// Path inside the torrent, usually just the file name.
    pub path: String,
    pub bytes: u64,
}

/// Errors from a debrid provider.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Debrid authentication failed: {0}")]
    Auth(String),

    #[error("Debrid API error: {0}")]
    Api(String),

    #[error("Debrid connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    #[error("Malformed debrid response: {0}")]
    Malformed(String),
}

/// A debrid provider: accepts magnets, fetches content to its own storage,
/// and unlocks per-file direct download URLs.
#[async_trait]
pub trait DebridProvider: Send + Sync {
    /// Provider name for logging/metrics/cache keys.
    fn name(&self) -> &str;

    /// Submit a magnet, returning the provider's transfer id. Submitting a
    /// magnet the provider already holds is expected to be idempotent and
    /// may come back instantly [`Downloaded`](TransferStatus::Downloaded).
    async fn submit_magnet(&self, magnet: &str) -> Result<String, DebridError>;

    async fn poll_status(&self, transfer_id: &str) -> Result<TransferStatus, DebridError>;

    async fn list_files(&self, transfer_id: &str) -> Result<Vec<ProviderFile>, DebridError>;

    /// Exchange a restricted file reference for a direct playable URL.
    async fn unlock_file(&self, file: &ProviderFile) -> Result<String, DebridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(ResolutionOutcome::ready("http://x/y.mkv")).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["url"], "http://x/y.mkv");

        let json = serde_json::to_value(ResolutionOutcome::Mislabeled {
            expected: "Show A".to_string(),
            actual: "Show B".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "mislabeled");
        assert_eq!(json["expected"], "Show A");
    }

    #[test]
    fn test_only_ready_is_ready() {
        assert!(ResolutionOutcome::ready("u").is_ready());
        assert!(!ResolutionOutcome::pending("wait").is_ready());
        assert!(!ResolutionOutcome::error("boom").is_ready());
    }
}
