//! Resolution tokens.
//!
//! A token is a URL path under [`RESOLVE_PATH`] with three segments:
//! the store auth block, the playback block (each standard base64 of
//! compact JSON), and a display filename. Every segment is percent-encoded
//! with the URI-component rules, so existing resolve endpoints keep
//! accepting URLs produced here. Field order is part of the format.

use std::string::FromUtf8Error;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::Credential;
use crate::debrid::ServiceId;
use crate::search_api::IdType;

pub const RESOLVE_PATH: &str = "/api/v1/debrid/resolve/";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Not a resolution URL: {0}")]
    Malformed(String),

    #[error("Invalid percent encoding: {0}")]
    Encoding(#[from] FromUtf8Error),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid token JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which account to resolve through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAuth {
    pub store_name: ServiceId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_credential"
    )]
    pub store_credential: Option<Credential>,
}

fn expose_credential<S: serde::Serializer>(
    value: &Option<Credential>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(c) => serializer.serialize_str(c.expose()),
        None => serializer.serialize_none(),
    }
}

/// Requested title as echoed back to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIdInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub id_type: IdType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_episode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorrentTag {
    #[serde(rename = "torrent")]
    Torrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsenetTag {
    #[serde(rename = "usenet")]
    Usenet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentPlayback {
    pub parsed_id: ParsedIdInfo,
    #[serde(rename = "type")]
    pub tag: TorrentTag,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsenetPlayback {
    #[serde(rename = "type")]
    pub tag: UsenetTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nzb: Option<String>,
    pub title: String,
}

/// What to play, by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaybackInfo {
    Torrent(TorrentPlayback),
    Usenet(UsenetPlayback),
}

impl PlaybackInfo {
    pub fn torrent(
        parsed_id: ParsedIdInfo,
        hash: String,
        index: Option<u32>,
        title: String,
    ) -> Self {
        PlaybackInfo::Torrent(TorrentPlayback {
            parsed_id,
            tag: TorrentTag::Torrent,
            hash,
            index,
            title,
        })
    }

    pub fn usenet(nzb: Option<String>, title: String) -> Self {
        PlaybackInfo::Usenet(UsenetPlayback {
            tag: UsenetTag::Usenet,
            nzb,
            title,
        })
    }
}

/// Everything a resolve endpoint needs, with no server-side state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionToken {
    pub store_auth: StoreAuth,
    pub playback: PlaybackInfo,
    pub filename: String,
}

impl ResolutionToken {
    /// Render as `{base_url}/api/v1/debrid/resolve/{auth}/{playback}/{filename}`.
    ///
    /// Same token, same bytes.
    pub fn to_url(&self, base_url: &str) -> Result<String, TokenError> {
        let auth = encode_block(&self.store_auth)?;
        let playback = encode_block(&self.playback)?;
        Ok(format!(
            "{}{}{}/{}/{}",
            base_url.trim_end_matches('/'),
            RESOLVE_PATH,
            auth,
            playback,
            encode_component(&self.filename)
        ))
    }

    /// Parse a URL produced by [`ResolutionToken::to_url`].
    pub fn from_url(url: &str) -> Result<Self, TokenError> {
        let (_, path) = url
            .split_once(RESOLVE_PATH)
            .ok_or_else(|| TokenError::Malformed(url.to_string()))?;

        let segments: Vec<&str> = path.split('/').collect();
        let [auth, playback, filename] = segments.as_slice() else {
            return Err(TokenError::Malformed(url.to_string()));
        };

        Ok(Self {
            store_auth: decode_block(auth)?,
            playback: decode_block(playback)?,
            filename: urlencoding::decode(filename)?.into_owned(),
        })
    }
}

fn encode_block<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(encode_component(&STANDARD.encode(json)))
}

fn decode_block<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let b64 = urlencoding::decode(segment)?;
    let json = STANDARD.decode(b64.as_bytes())?;
    Ok(serde_json::from_slice(&json)?)
}

/// Percent-encode like `encodeURIComponent`: `!'()*` stay literal.
fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent_token() -> ResolutionToken {
        ResolutionToken {
            store_auth: StoreAuth {
                store_name: ServiceId::Torbox,
                store_credential: Some(Credential::new("tb-secret")),
            },
            playback: PlaybackInfo::torrent(
                ParsedIdInfo {
                    id: "tt0903747".to_string(),
                    id_type: IdType::Imdb,
                    season: Some("1".to_string()),
                    episode: Some("2".to_string()),
                    absolute_episode: None,
                },
                "abc123".to_string(),
                Some(1),
                "Breaking Bad S01 1080p".to_string(),
            ),
            filename: "Breaking.Bad.S01E02 (1080p).mkv".to_string(),
        }
    }

    #[test]
    fn test_block_json_shape() {
        let token = torrent_token();
        assert_eq!(
            serde_json::to_string(&token.store_auth).unwrap(),
            r#"{"storeName":"torbox","storeCredential":"tb-secret"}"#
        );
        assert_eq!(
            serde_json::to_string(&token.playback).unwrap(),
            concat!(
                r#"{"parsedId":{"id":"tt0903747","type":"imdb_id","season":"1","episode":"2"},"#,
                r#""type":"torrent","hash":"abc123","index":1,"title":"Breaking Bad S01 1080p"}"#
            )
        );

        let usenet = PlaybackInfo::usenet(Some("https://nzb/1".to_string()), "Movie".to_string());
        assert_eq!(
            serde_json::to_string(&usenet).unwrap(),
            r#"{"type":"usenet","nzb":"https://nzb/1","title":"Movie"}"#
        );
    }

    #[test]
    fn test_url_layout_and_decode() {
        let token = torrent_token();
        let url = token.to_url("https://addon.example/").unwrap();

        assert!(url.starts_with("https://addon.example/api/v1/debrid/resolve/"));
        assert!(url.ends_with("/Breaking.Bad.S01E02%20(1080p).mkv"));

        let decoded = ResolutionToken::from_url(&url).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = torrent_token().to_url("http://localhost:8080").unwrap();
        let b = torrent_token().to_url("http://localhost:8080").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_base64_padding_is_percent_encoded() {
        let auth = StoreAuth {
            store_name: ServiceId::Premiumize,
            store_credential: None,
        };
        let segment = encode_block(&auth).unwrap();
        let expected = STANDARD.encode(br#"{"storeName":"premiumize"}"#);
        assert_eq!(segment, expected.replace('=', "%3D"));
    }

    #[test]
    fn test_untagged_playback_decodes_by_shape() {
        let usenet: PlaybackInfo =
            serde_json::from_str(r#"{"type":"usenet","nzb":"n","title":"t"}"#).unwrap();
        assert!(matches!(usenet, PlaybackInfo::Usenet(_)));

        let torrent: PlaybackInfo = serde_json::from_str(
            r#"{"parsedId":{"id":"1","type":"kitsu_id"},"type":"torrent","hash":"h","title":"t"}"#,
        )
        .unwrap();
        assert!(matches!(torrent, PlaybackInfo::Torrent(ref t) if t.index.is_none()));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let token = torrent_token();
        assert!(!format!("{:?}", token).contains("tb-secret"));
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(matches!(
            ResolutionToken::from_url("https://addon.example/other"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            ResolutionToken::from_url("https://addon.example/api/v1/debrid/resolve/a/b"),
            Err(TokenError::Malformed(_))
        ));
        let url = "https://addon.example/api/v1/debrid/resolve/%%%/b/c";
        assert!(ResolutionToken::from_url(url).is_err());
    }
}
