//! JSON-feed indexer adapter.
//!
//! Speaks the torrent-feed JSON dialect most aggregator APIs expose: a flat
//! array of entries with title, info hash, magnet and seeder count. Indexers
//! that index releases by a stable external id additionally support
//! [`lookup_by_id`](super::Indexer::lookup_by_id) through a query parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::IndexerEndpointConfig;

use super::types::{Indexer, IndexerError, RawRelease};

/// Indexer over an HTTP JSON feed API.
pub struct JsonFeedIndexer {
    client: Client,
    config: IndexerEndpointConfig,
}

impl JsonFeedIndexer {
    pub fn new(config: IndexerEndpointConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn build_search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/api?q={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query)
        );
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&apikey={}", urlencoding::encode(key)));
        }
        url
    }

    fn build_id_url(&self, external_id: &str, episode: u32) -> String {
        let mut url = format!(
            "{}/api?aid={}&ep={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(external_id),
            episode
        );
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&apikey={}", urlencoding::encode(key)));
        }
        url
    }

    async fn fetch(&self, url: &str) -> Result<Vec<RawRelease>, IndexerError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                IndexerError::Timeout
            } else if e.is_connect() {
                IndexerError::ConnectionFailed(e.to_string())
            } else {
                IndexerError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let entries: Vec<FeedEntry> = response
            .json()
            .await
            .map_err(|e| IndexerError::Malformed(e.to_string()))?;

        debug!(
            indexer = %self.config.name,
            entries = entries.len(),
            "Feed fetch complete"
        );

        Ok(entries
            .into_iter()
            .filter_map(|e| {
                let magnet = e.magnet_uri?;
                Some(RawRelease {
                    title: e.title,
                    info_hash: e.info_hash.unwrap_or_default().to_lowercase(),
                    magnet,
                    seeders: e.seeders.unwrap_or(0).max(0) as u32,
                    size_label: e.total_size.map(format_size).unwrap_or_default(),
                    published_at: e.timestamp.and_then(parse_feed_timestamp),
                })
            })
            .collect())
    }
}

#[async_trait]
impl Indexer for JsonFeedIndexer {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn search(&self, query: &str) -> Result<Vec<RawRelease>, IndexerError> {
        let url = self.build_search_url(query);
        debug!(indexer = %self.config.name, query = %query, "Searching feed");
        self.fetch(&url).await
    }

    fn supports_id_lookup(&self) -> bool {
        self.config.id_lookup
    }

    async fn lookup_by_id(
        &self,
        external_id: &str,
        episode: u32,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        if !self.config.id_lookup {
            return Err(IndexerError::IdLookupUnsupported);
        }
        let url = self.build_id_url(external_id, episode);
        debug!(
            indexer = %self.config.name,
            external_id = %external_id,
            episode = episode,
            "Id-based feed lookup"
        );
        self.fetch(&url).await
    }
}

fn format_size(bytes: i64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes.max(0) as f64;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else {
        format!("{:.1} MiB", bytes / MIB)
    }
}

/// Feeds report either unix seconds or an RFC 3339 string.
fn parse_feed_timestamp(ts: FeedTimestamp) -> Option<DateTime<Utc>> {
    match ts {
        FeedTimestamp::Unix(secs) => DateTime::from_timestamp(secs, 0),
        FeedTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedTimestamp {
    Unix(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: String,
    info_hash: Option<String>,
    magnet_uri: Option<String>,
    seeders: Option<i32>,
    total_size: Option<i64>,
    timestamp: Option<FeedTimestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn make_config() -> IndexerEndpointConfig {
        IndexerEndpointConfig {
            name: "feed".to_string(),
            url: "http://localhost:8080/".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 30,
            id_lookup: true,
        }
    }

    #[test]
    fn test_build_search_url() {
        let indexer = JsonFeedIndexer::new(make_config());
        let url = indexer.build_search_url("my show 05");
        assert!(url.starts_with("http://localhost:8080/api?q=my%20show%2005"));
        assert!(url.contains("apikey=test-key"));
    }

    #[test]
    fn test_build_id_url() {
        let indexer = JsonFeedIndexer::new(make_config());
        let url = indexer.build_id_url("12345", 5);
        assert!(url.contains("aid=12345"));
        assert!(url.contains("ep=5"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1_610_612_736), "1.5 GiB");
        assert_eq!(format_size(367_001_600), "350.0 MiB");
    }

    #[test]
    fn test_parse_feed_timestamp_unix() {
        let dt = parse_feed_timestamp(FeedTimestamp::Unix(1_718_445_000)).unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_parse_feed_timestamp_rfc3339() {
        let dt =
            parse_feed_timestamp(FeedTimestamp::Text("2024-06-15T10:30:00Z".to_string())).unwrap();
        assert_eq!(dt.month(), 6);
    }

    #[tokio::test]
    async fn test_entries_without_magnet_are_dropped() {
        let raw = r#"[
            {"title": "Show - 05", "info_hash": "AA", "magnet_uri": "magnet:?xt=a", "seeders": 3},
            {"title": "Show - 06", "info_hash": "BB", "magnet_uri": null, "seeders": 9}
        ]"#;
        let entries: Vec<FeedEntry> = serde_json::from_str(raw).unwrap();
        let kept: Vec<_> = entries.into_iter().filter(|e| e.magnet_uri.is_some()).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Show - 05");
    }
}
