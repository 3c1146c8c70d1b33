pub mod cache;
pub mod config;
pub mod credential;
pub mod debrid;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod search_api;
pub mod stream;
pub mod testing;

pub use cache::SearchCaches;
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use credential::Credential;
pub use debrid::{HttpStoreFactory, ServiceId};
pub use metadata::TmdbClient;
pub use orchestrator::{OrchestratorConfig, OrchestratorError, SearchOrchestrator, UserConfig};
pub use search_api::{ParsedId, SearchApiClient, SourceKind};
pub use stream::{StreamAssembler, StreamDescriptor};
