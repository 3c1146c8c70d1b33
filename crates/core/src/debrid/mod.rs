//! Storage-account availability.
//!
//! Each configured account answers one question per request: which of
//! these candidate sources can it serve right now, and which file inside
//! each one is the requested title or episode.

mod factory;
mod matcher;
mod premiumize;
mod resolver;
mod torbox;
mod types;

pub use factory::HttpStoreFactory;
pub use matcher::{EpisodeTarget, FileMatch, FileMatcher, FileMatcherConfig};
pub use premiumize::PremiumizeClient;
pub use resolver::{AccountResolver, ResolverSettings};
pub use torbox::TorboxClient;
pub use types::*;
