pub mod acquisition;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod debrid;
pub mod matcher;
pub mod metrics;
pub mod testing;
pub mod validator;

pub use acquisition::{
    AcquisitionEngine, Indexer, IndexerError, JsonFeedIndexer, Quality, RawRelease, ShowRequest,
    SourceType, TorrentCandidate,
};
pub use classifier::{classify, extract_bare_name, Classifier, ContentType, EpisodeInfo};
pub use config::{load_config, load_config_from_str, Config, ConfigError, SanitizedConfig};
pub use debrid::{
    DebridError, DebridProvider, DebridResolver, ResolutionOutcome, RestDebridClient,
};
pub use matcher::{score_title, validate_title, MatchReason, ShowMatchResult};
pub use validator::{validate_episode, ContentTypeHint, EpisodeValidation, ValidationReason};
