use serde::{Deserialize, Serialize};

use crate::matcher::{DEFAULT_MATCH_THRESHOLD, STRICT_MATCH_THRESHOLD};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Torrent indexers to fan requests out to.
    #[serde(default)]
    pub indexers: Vec<IndexerEndpointConfig>,
    /// Debrid provider (required for resolution, not for acquisition).
    #[serde(default)]
    pub debrid: Option<DebridProviderConfig>,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// One indexer endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerEndpointConfig {
    /// Name used in logs, metrics and cache keys.
    pub name: String,
    /// Base URL (e.g., "https://feed.example.com")
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Whether this indexer supports lookup by stable external id.
    #[serde(default)]
    pub id_lookup: bool,
}

/// Debrid provider endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridProviderConfig {
    /// Name used in logs, metrics and cache keys.
    pub name: String,
    /// API base URL (e.g., "https://api.real-debrid.com/rest/1.0")
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Show-identity matching thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Minimum identity score for text-search candidates.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: u8,
    /// Threshold applied when id-based lookup was possible but found nothing.
    #[serde(default = "default_strict_threshold")]
    pub strict_threshold: u8,
    /// How many alternate names to requery with before giving up.
    #[serde(default = "default_max_alternate_retries")]
    pub max_alternate_retries: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            strict_threshold: default_strict_threshold(),
            max_alternate_retries: default_max_alternate_retries(),
        }
    }
}

/// Debrid poll loop and ready-URL cache tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Total time to wait for a transfer before answering pending.
    #[serde(default = "default_poll_budget")]
    pub poll_budget_secs: u64,
    #[serde(default = "default_ready_ttl")]
    pub ready_cache_ttl_secs: u64,
    #[serde(default = "default_ready_entries")]
    pub ready_cache_entries: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            poll_budget_secs: default_poll_budget(),
            ready_cache_ttl_secs: default_ready_ttl(),
            ready_cache_entries: default_ready_entries(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_match_threshold() -> u8 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_strict_threshold() -> u8 {
    STRICT_MATCH_THRESHOLD
}

fn default_max_alternate_retries() -> usize {
    3
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_budget() -> u64 {
    45
}

fn default_ready_ttl() -> u64 {
    3600
}

fn default_ready_entries() -> usize {
    1000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub indexers: Vec<SanitizedIndexerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debrid: Option<SanitizedDebridConfig>,
    pub matching: MatchingConfig,
    pub resolver: ResolverSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub name: String,
    pub url: String,
    pub api_key_set: bool,
    pub id_lookup: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub name: String,
    pub url: String,
    pub api_key_set: bool,
}

impl Config {
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            indexers: self
                .indexers
                .iter()
                .map(|i| SanitizedIndexerConfig {
                    name: i.name.clone(),
                    url: i.url.clone(),
                    api_key_set: i.api_key.is_some(),
                    id_lookup: i.id_lookup,
                })
                .collect(),
            debrid: self.debrid.as_ref().map(|d| SanitizedDebridConfig {
                name: d.name.clone(),
                url: d.url.clone(),
                api_key_set: !d.api_key.is_empty(),
            }),
            matching: self.matching.clone(),
            resolver: self.resolver.clone(),
        }
    }
}
