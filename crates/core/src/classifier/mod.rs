//! Release-title classification.
//!
//! Turns one free-text release title into structured [`EpisodeInfo`]:
//! content type, season, episode, batch range. Fan-subtitling and tracker
//! naming conventions are legion and mutually incompatible, so the parser is
//! an ordered rule list with conservative numeric guards - a false positive
//! here means the wrong content gets served.

mod classify;
mod patterns;
mod types;

pub use classify::{classify, extract_bare_name, Classifier, DEFAULT_EXCLUDED_NUMBERS};
pub use types::{ContentType, EpisodeInfo};
