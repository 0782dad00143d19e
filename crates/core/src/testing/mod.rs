//! Test doubles for the acquisition and resolution pipelines.

mod mock_debrid;
mod mock_indexer;

pub use mock_debrid::MockDebridProvider;
pub use mock_indexer::MockIndexer;
