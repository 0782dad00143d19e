//! Mock indexer for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::acquisition::{Indexer, IndexerError, RawRelease};

/// Mock implementation of the [`Indexer`] trait.
///
/// Builder-style configuration: default results for any query, per-query
/// overrides, id-lookup results, or outright failure. Every query is
/// recorded for assertions.
pub struct MockIndexer {
    name: String,
    default_results: Vec<RawRelease>,
    query_results: HashMap<String, Vec<RawRelease>>,
    id_results: Vec<RawRelease>,
    supports_id: bool,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockIndexer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default_results: Vec::new(),
            query_results: HashMap::new(),
            id_results: Vec::new(),
            supports_id: false,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Results returned for any query without a per-query override.
    pub fn with_search_results(mut self, results: Vec<RawRelease>) -> Self {
        self.default_results = results;
        self
    }

    /// Results returned only for this exact query string.
    pub fn with_query_results(mut self, query: &str, results: Vec<RawRelease>) -> Self {
        self.query_results.insert(query.to_string(), results);
        self
    }

    pub fn with_id_lookup_results(mut self, results: Vec<RawRelease>) -> Self {
        self.id_results = results;
        self
    }

    pub fn supporting_id_lookup(mut self) -> Self {
        self.supports_id = true;
        self
    }

    /// Every search fails with a connection error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// All queries this mock has seen, in order.
    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<RawRelease>, IndexerError> {
        self.queries
            .lock()
            .expect("mock lock poisoned")
            .push(query.to_string());
        if self.fail {
            return Err(IndexerError::ConnectionFailed("mock failure".to_string()));
        }
        Ok(self
            .query_results
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.default_results.clone()))
    }

    fn supports_id_lookup(&self) -> bool {
        self.supports_id
    }

    async fn lookup_by_id(
        &self,
        external_id: &str,
        _episode: u32,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        if !self.supports_id {
            return Err(IndexerError::IdLookupUnsupported);
        }
        self.queries
            .lock()
            .expect("mock lock poisoned")
            .push(format!("id:{external_id}"));
        if self.fail {
            return Err(IndexerError::ConnectionFailed("mock failure".to_string()));
        }
        Ok(self.id_results.clone())
    }
}
