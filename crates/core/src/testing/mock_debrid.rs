//! Mock debrid provider for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::debrid::{DebridError, DebridProvider, ProviderFile, TransferStatus};

/// Mock implementation of the [`DebridProvider`] trait.
///
/// Poll statuses are played back in sequence, repeating the last one once
/// the sequence is exhausted. Submissions are counted for cache assertions.
pub struct MockDebridProvider {
    statuses: Vec<TransferStatus>,
    files: Vec<ProviderFile>,
    unlock_url: String,
    fail_submit: bool,
    poll_index: Mutex<usize>,
    submits: Mutex<u32>,
}

impl MockDebridProvider {
    /// Transfer is downloaded on the first poll; unlock yields `url`.
    pub fn ready(url: &str) -> Self {
        Self::with_status_sequence(vec![TransferStatus::Downloaded]).with_unlock_url(url)
    }

    /// Transfer reports the same download progress forever.
    pub fn always_downloading(progress: f32) -> Self {
        Self::with_status_sequence(vec![TransferStatus::Downloading(progress)])
    }

    pub fn with_status_sequence(statuses: Vec<TransferStatus>) -> Self {
        Self {
            statuses,
            files: Vec::new(),
            unlock_url: "https://mock/direct".to_string(),
            fail_submit: false,
            poll_index: Mutex::new(0),
            submits: Mutex::new(0),
        }
    }

    pub fn with_files(mut self, files: Vec<ProviderFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_unlock_url(mut self, url: &str) -> Self {
        self.unlock_url = url.to_string();
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn submit_count(&self) -> u32 {
        *self.submits.lock().expect("mock lock poisoned")
    }
}

#[async_trait]
impl DebridProvider for MockDebridProvider {
    fn name(&self) -> &str {
        "mock-debrid"
    }

    async fn submit_magnet(&self, _magnet: &str) -> Result<String, DebridError> {
        if self.fail_submit {
            return Err(DebridError::Api("mock submit failure".to_string()));
        }
        let mut submits = self.submits.lock().expect("mock lock poisoned");
        *submits += 1;
        // New submission restarts the status playback.
        *self.poll_index.lock().expect("mock lock poisoned") = 0;
        Ok(format!("transfer-{submits}"))
    }

    async fn poll_status(&self, _transfer_id: &str) -> Result<TransferStatus, DebridError> {
        let mut index = self.poll_index.lock().expect("mock lock poisoned");
        let status = self
            .statuses
            .get(*index)
            .or_else(|| self.statuses.last())
            .cloned()
            .unwrap_or(TransferStatus::Downloaded);
        *index += 1;
        Ok(status)
    }

    async fn list_files(&self, _transfer_id: &str) -> Result<Vec<ProviderFile>, DebridError> {
        Ok(self.files.clone())
    }

    async fn unlock_file(&self, _file: &ProviderFile) -> Result<String, DebridError> {
        Ok(self.unlock_url.clone())
    }
}
