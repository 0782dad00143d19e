//! Debrid resolution: trading a torrent candidate for a direct stream URL.

mod resolver;
mod rest;
mod types;

pub use resolver::DebridResolver;
pub use rest::RestDebridClient;
pub use types::{
    DebridError, DebridProvider, ProviderFile, ResolutionOutcome, TransferStatus,
};
