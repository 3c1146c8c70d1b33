//! Parsing of addon-protocol title identifiers.
//!
//! Accepted forms:
//! - `tt0111161`, `tt0903747:1:2` (IMDb)
//! - `tmdb:603`, `tvdb:81189:1:2`
//! - `kitsu:7442:5`, `mal:16498:1:5`, `anilist:..`, `anidb:..`

use thiserror::Error;

use super::types::{IdType, ParsedId};

#[derive(Debug, Error, PartialEq)]
pub enum IdParseError {
    #[error("Empty id")]
    Empty,

    #[error("Unsupported id prefix: {0}")]
    UnsupportedPrefix(String),

    #[error("Invalid episode coordinates in {0}")]
    InvalidCoordinates(String),
}

impl ParsedId {
    /// Parse an addon-protocol id such as `tt0903747:1:2`.
    pub fn parse(raw: &str) -> Result<Self, IdParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdParseError::Empty);
        }

        let parts: Vec<&str> = raw.split(':').collect();

        let (id_type, id, rest) = if parts[0].starts_with("tt") {
            (IdType::Imdb, parts[0], &parts[1..])
        } else {
            let id_type = match parts[0] {
                "tmdb" => IdType::Tmdb,
                "tvdb" => IdType::Tvdb,
                "kitsu" => IdType::Kitsu,
                "mal" => IdType::Mal,
                "anilist" => IdType::Anilist,
                "anidb" => IdType::Anidb,
                "imdb" => IdType::Imdb,
                other => return Err(IdParseError::UnsupportedPrefix(other.to_string())),
            };
            match parts.get(1) {
                Some(id) if !id.is_empty() => (id_type, *id, &parts[2..]),
                _ => return Err(IdParseError::Empty),
            }
        };

        let numbers = rest
            .iter()
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| IdParseError::InvalidCoordinates(raw.to_string()))?;

        let parsed = ParsedId::new(id_type, id);
        match numbers.as_slice() {
            [] => Ok(parsed),
            [episode] if IdType::ANIME.contains(&id_type) => {
                Ok(parsed.with_episode(None, *episode))
            }
            [season, episode] => Ok(parsed.with_episode(Some(*season), *episode)),
            _ => Err(IdParseError::InvalidCoordinates(raw.to_string())),
        }
    }
}
