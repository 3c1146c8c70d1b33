//! Turns resolved files into addon-protocol stream descriptors.

use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::debrid::{AccountFailure, ResolvedFile};
use crate::search_api::{CandidateSource, ParsedId, SourceKind};

use super::token::{ParsedIdInfo, PlaybackInfo, ResolutionToken, StoreAuth, TokenError};

/// Link error streams point at, so clients render them as inert entries.
pub const ERROR_EXTERNAL_URL: &str = "stremio:///";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// One entry of a stream list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub name: String,
    pub description: String,
    /// Resolution URL carrying the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_hints: Option<BehaviorHints>,
}

impl StreamDescriptor {
    pub fn is_error(&self) -> bool {
        self.external_url.as_deref() == Some(ERROR_EXTERNAL_URL)
    }
}

/// Builds descriptors. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct StreamAssembler {
    base_url: String,
    addon_name: String,
}

impl StreamAssembler {
    pub fn new(base_url: impl Into<String>, addon_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            addon_name: addon_name.into(),
        }
    }

    pub fn addon_name(&self) -> &str {
        &self.addon_name
    }

    /// Descriptor for one file of one source on one account.
    ///
    /// `credential` is the user's credential for `file.account.service`; it
    /// only ever appears inside the encoded token.
    pub fn assemble(
        &self,
        source: &CandidateSource,
        file: &ResolvedFile,
        credential: Option<&Credential>,
        id: &ParsedId,
        absolute_episode: Option<u32>,
    ) -> Result<StreamDescriptor, TokenError> {
        let playback = match source.kind {
            SourceKind::Torrent => PlaybackInfo::torrent(
                ParsedIdInfo {
                    id: id.id.clone(),
                    id_type: id.id_type,
                    season: id.season.map(|s| s.to_string()),
                    episode: id.episode.map(|e| e.to_string()),
                    absolute_episode: absolute_episode.map(|a| a.to_string()),
                },
                source.content_id.clone(),
                file.file_index,
                source.title.clone(),
            ),
            SourceKind::Usenet => {
                PlaybackInfo::usenet(source.nzb_url.clone(), source.title.clone())
            }
        };

        let filename = if file.filename.is_empty() {
            source.title.clone()
        } else {
            file.filename.clone()
        };

        let token = ResolutionToken {
            store_auth: StoreAuth {
                store_name: file.account.service,
                store_credential: credential.cloned(),
            },
            playback,
            filename,
        };

        let marker = if file.account.cached { "⚡" } else { "⏳" };

        Ok(StreamDescriptor {
            name: format!(
                "[{} {}] {}",
                file.account.service.short_name(),
                marker,
                self.addon_name
            ),
            description: describe(source, &file.filename),
            url: Some(token.to_url(&self.base_url)?),
            external_url: None,
            kind: Some(source.kind),
            info_hash: match source.kind {
                SourceKind::Torrent => Some(source.content_id.clone()),
                SourceKind::Usenet => None,
            },
            behavior_hints: Some(BehaviorHints {
                video_size: Some(file.size_bytes),
                filename: Some(file.filename.clone()),
            }),
        })
    }

    /// Inert entry carrying a failure message.
    pub fn error_stream(&self, failure: &AccountFailure) -> StreamDescriptor {
        StreamDescriptor {
            name: format!("[❌] {} {}", self.addon_name, failure.title)
                .trim_end()
                .to_string(),
            description: failure.description.clone(),
            url: None,
            external_url: Some(ERROR_EXTERNAL_URL.to_string()),
            kind: None,
            info_hash: None,
            behavior_hints: None,
        }
    }
}

/// `<title>\n<filename>\n<🔍 indexer> <👤 seeders> <🕒 age>`
fn describe(source: &CandidateSource, filename: &str) -> String {
    let indexer = source
        .indexer
        .as_deref()
        .map(|i| format!("🔍 {}", i))
        .unwrap_or_default();
    let seeders = source
        .seeders
        .filter(|s| *s > 0)
        .map(|s| format!("👤 {}", s))
        .unwrap_or_default();
    let age = source
        .age
        .as_deref()
        .filter(|a| *a != "0d")
        .map(|a| format!("🕒 {}", a))
        .unwrap_or_default();
    format!(
        "{}\n{}\n{} {} {}",
        source.title, filename, indexer, seeders, age
    )
}
