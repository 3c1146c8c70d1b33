//! Search orchestrator.
//!
//! One request moves through `fetch candidates -> [enrich metadata] ->
//! resolve availability (all accounts at once) -> merge -> assemble`.
//! Candidate lists and title metadata are cached; availability never is.

mod config;
mod handler;
mod types;

pub use config::OrchestratorConfig;
pub use handler::SearchOrchestrator;
pub use types::{AvailabilityStrategy, OrchestratorError, UserConfig, UserConfigError};
