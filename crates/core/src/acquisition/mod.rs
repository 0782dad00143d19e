//! Torrent candidate acquisition.
//!
//! Indexer adapters produce raw releases; the engine normalizes them into
//! [`TorrentCandidate`]s, deduplicates by info hash, and keeps only the ones
//! that pass show-identity matching and episode validation.

mod dedup;
mod engine;
mod http;
mod types;

pub use dedup::{dedup_candidates, sort_candidates};
pub use engine::AcquisitionEngine;
pub use http::JsonFeedIndexer;
pub use types::{
    is_raw_release, release_group_from_title, Indexer, IndexerError, Quality, RawRelease,
    ShowRequest, SourceType, TorrentCandidate,
};
