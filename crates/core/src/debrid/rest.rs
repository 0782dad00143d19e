//! REST debrid provider adapter.
//!
//! Speaks the Real-Debrid-style HTTP API: magnet submission, transfer info
//! polling, and per-link unrestriction. Authentication is a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::DebridProviderConfig;

use super::types::{DebridError, DebridProvider, ProviderFile, TransferStatus};

pub struct RestDebridClient {
    client: Client,
    config: DebridProviderConfig,
}

impl RestDebridClient {
    pub fn new(config: DebridProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn map_send_error(e: reqwest::Error) -> DebridError {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else {
            DebridError::Api(e.to_string())
        }
    }

    async fn check_status(
        response: reqwest::Response,
        transfer_id: Option<&str>,
    ) -> Result<reqwest::Response, DebridError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DebridError::Auth(format!("HTTP {}", status)));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = transfer_id {
                return Err(DebridError::TransferNotFound(id.to_string()));
            }
        }
        let body = response.text().await.unwrap_or_default();
        Err(DebridError::Api(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )))
    }

    async fn transfer_info(&self, transfer_id: &str) -> Result<TransferInfo, DebridError> {
        let response = self
            .client
            .get(self.url(&format!("torrents/info/{}", transfer_id)))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response, Some(transfer_id)).await?;
        response
            .json()
            .await
            .map_err(|e| DebridError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DebridProvider for RestDebridClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn submit_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let response = self
            .client
            .post(self.url("torrents/addMagnet"))
            .bearer_auth(&self.config.api_key)
            .form(&[("magnet", magnet)])
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response, None).await?;
        let added: AddMagnetResponse = response
            .json()
            .await
            .map_err(|e| DebridError::Malformed(e.to_string()))?;

        // The API requires a file selection before it starts fetching.
        let response = self
            .client
            .post(self.url(&format!("torrents/selectFiles/{}", added.id)))
            .bearer_auth(&self.config.api_key)
            .form(&[("files", "all")])
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response, Some(&added.id)).await?;

        debug!(provider = %self.config.name, transfer_id = %added.id, "Magnet submitted");
        Ok(added.id)
    }

    async fn poll_status(&self, transfer_id: &str) -> Result<TransferStatus, DebridError> {
        let info = self.transfer_info(transfer_id).await?;
        Ok(map_transfer_status(&info.status, info.progress))
    }

    async fn list_files(&self, transfer_id: &str) -> Result<Vec<ProviderFile>, DebridError> {
        let info = self.transfer_info(transfer_id).await?;

        // Links line up with the selected files in order.
        let selected = info.files.into_iter().filter(|f| f.selected != 0);
        Ok(selected
            .zip(info.links)
            .map(|(file, link)| ProviderFile {
                id: link,
                path: file.path.trim_start_matches('/').to_string(),
                bytes: file.bytes.max(0) as u64,
            })
            .collect())
    }

    async fn unlock_file(&self, file: &ProviderFile) -> Result<String, DebridError> {
        let response = self
            .client
            .post(self.url("unrestrict/link"))
            .bearer_auth(&self.config.api_key)
            .form(&[("link", file.id.as_str())])
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response, None).await?;
        let unlocked: UnrestrictResponse = response
            .json()
            .await
            .map_err(|e| DebridError::Malformed(e.to_string()))?;
        Ok(unlocked.download)
    }
}

fn map_transfer_status(status: &str, progress: Option<f32>) -> TransferStatus {
    match status {
        "downloaded" => TransferStatus::Downloaded,
        "downloading" | "compressing" | "uploading" => {
            TransferStatus::Downloading(progress.unwrap_or(0.0))
        }
        "queued" | "magnet_conversion" | "waiting_files_selection" => TransferStatus::Queued,
        other => TransferStatus::Failed(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TransferInfo {
    status: String,
    progress: Option<f32>,
    #[serde(default)]
    files: Vec<TransferFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TransferFile {
    path: String,
    bytes: i64,
    #[serde(default)]
    selected: i32,
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}
