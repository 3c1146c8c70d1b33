//! Picks the file(s) inside a cached item that satisfy a request.
//!
//! Episode markers are read from filenames and scored:
//! - `S01E02`, `s1.e2` (1.0)
//! - `1x02`, `Season 1 ... Episode 2` (0.9)
//! - `S01E26` against an absolute index of 26 (0.8)
//! - bare episode numbers (`E05`, `Ep 5`, ` - 05 `) (0.6)
//! - a season pack title without episode markers (0.5)
//!
//! Anything below the configured minimum is dropped, never guessed.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{ResolveContext, StoreFile};

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^a-z0-9])s(\d{1,2})[ ._-]?e(\d{1,4})").unwrap());
static CROSS_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^a-z0-9])(\d{1,2})x(\d{1,3})(?:[^a-z0-9]|$)").unwrap());
static WORDY_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"season[ ._-]?(\d{1,2})[^0-9].*?episode[ ._-]?(\d{1,4})").unwrap()
});
static BARE_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-z0-9])(?:e|ep|episode)[ ._-]?(\d{1,4})(?:[^0-9]|$)").unwrap()
});
static DASH_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" - (\d{1,4})(?:[ ._\[(v]|$)").unwrap());
static SEASON_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^a-z0-9])(?:s|season[ ._-]?)(\d{1,2})(?:[^0-9e]|$)").unwrap()
});

/// Configuration for the file matcher.
#[derive(Debug, Clone)]
pub struct FileMatcherConfig {
    /// Minimum confidence to accept a file.
    pub min_confidence: f32,
    /// Video file extensions to consider.
    pub video_extensions: Vec<String>,
    /// Extensions that are never playable, even as the only file.
    pub non_video_extensions: Vec<String>,
    /// Filename words marking extras.
    pub excluded_keywords: Vec<String>,
}

impl Default for FileMatcherConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            video_extensions: vec![
                "mkv", "mp4", "avi", "mov", "wmv", "m4v", "webm", "ts", "m2ts", "mpg", "mpeg",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            non_video_extensions: vec![
                "nfo", "txt", "srt", "sub", "idx", "ass", "jpg", "jpeg", "png", "exe", "zip",
                "rar", "iso", "url",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_keywords: vec!["sample", "trailer"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Requested coordinates, flattened from a [`ResolveContext`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeTarget {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub absolute: Option<u32>,
}

impl EpisodeTarget {
    pub fn from_context(ctx: &ResolveContext) -> Self {
        Self {
            season: ctx.parsed_id.season,
            episode: ctx.parsed_id.episode,
            absolute: ctx.absolute_episode,
        }
    }
}

/// A selected file with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMatch<'a> {
    pub file: &'a StoreFile,
    pub confidence: f32,
}

/// Heuristic filename matcher.
#[derive(Debug, Clone, Default)]
pub struct FileMatcher {
    config: FileMatcherConfig,
}

impl FileMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FileMatcherConfig) -> Self {
        Self { config }
    }

    pub fn with_min_confidence(min_confidence: f32) -> Self {
        Self::with_config(FileMatcherConfig {
            min_confidence,
            ..FileMatcherConfig::default()
        })
    }

    /// Files of one cached item that satisfy `target`.
    ///
    /// Without an episode every playable file is returned, largest first.
    /// With one, the single best match is returned, or nothing.
    pub fn select<'a>(&self, files: &'a [StoreFile], target: &EpisodeTarget) -> Vec<FileMatch<'a>> {
        let single = files.len() == 1;
        let mut playable: Vec<&StoreFile> = files
            .iter()
            .filter(|f| self.is_playable(&f.name, single))
            .collect();

        let Some(episode) = target.episode else {
            playable.sort_by(|a, b| b.size.cmp(&a.size));
            return playable
                .into_iter()
                .map(|file| FileMatch {
                    file,
                    confidence: 1.0,
                })
                .collect();
        };

        let mut best: Option<FileMatch<'a>> = None;
        for file in playable {
            let name = extract_filename(&file.name).to_lowercase();
            let mut confidence = episode_confidence(&name, target.season, episode, target.absolute);

            // A lone file without markers was already narrowed by the index.
            if confidence == 0.0 && single && !has_episode_marker(&name) {
                confidence = 0.5;
            }

            if confidence < self.config.min_confidence || confidence == 0.0 {
                continue;
            }
            let better = match &best {
                None => true,
                Some(current) => {
                    confidence > current.confidence
                        || (confidence == current.confidence && file.size > current.file.size)
                }
            };
            if better {
                best = Some(FileMatch { file, confidence });
            }
        }

        best.into_iter().collect()
    }

    /// Score an item's own title, for sources the account has not cached.
    ///
    /// When known titles are supplied, the item must mention one of them.
    pub fn title_confidence(
        &self,
        title: &str,
        target: &EpisodeTarget,
        known_titles: &[String],
    ) -> f32 {
        let normalized = normalize(title);
        if !known_titles.is_empty()
            && !known_titles
                .iter()
                .map(|t| normalize(t))
                .any(|t| !t.is_empty() && normalized.contains(&t))
        {
            return 0.0;
        }

        let Some(episode) = target.episode else {
            return 1.0;
        };

        let lower = title.to_lowercase();
        let confidence = episode_confidence(&lower, target.season, episode, target.absolute);
        if confidence > 0.0 {
            return confidence;
        }

        let season = target.season.unwrap_or(1);
        let is_season_pack = !has_episode_marker(&lower)
            && SEASON_ONLY
                .captures_iter(&lower)
                .any(|c| parse_capture(&c, 1) == Some(season));
        if is_season_pack {
            0.5
        } else {
            0.0
        }
    }

    /// Whether an uncached item's title is good enough to list.
    pub fn title_matches(
        &self,
        title: &str,
        target: &EpisodeTarget,
        known_titles: &[String],
    ) -> bool {
        let confidence = self.title_confidence(title, target, known_titles);
        confidence > 0.0 && confidence >= self.config.min_confidence
    }

    fn is_playable(&self, path: &str, single: bool) -> bool {
        let filename = extract_filename(path).to_lowercase();
        if self
            .config
            .excluded_keywords
            .iter()
            .any(|k| contains_word(&filename, k))
        {
            return false;
        }

        let ext = get_extension(&filename);
        if self.config.video_extensions.iter().any(|e| e == ext) {
            return true;
        }
        single && !self.config.non_video_extensions.iter().any(|e| e == ext)
    }
}

/// Best score of any marker in `name` (already lowercased).
fn episode_confidence(name: &str, season: Option<u32>, episode: u32, absolute: Option<u32>) -> f32 {
    let mut best: f32 = 0.0;

    if let Some(season) = season {
        if pairs(&SEASON_EPISODE, name).any(|p| p == (season, episode)) {
            return 1.0;
        }
        if pairs(&CROSS_EPISODE, name).any(|p| p == (season, episode))
            || pairs(&WORDY_EPISODE, name).any(|p| p == (season, episode))
        {
            best = best.max(0.9);
        }
    }

    if let Some(absolute) = absolute {
        if pairs(&SEASON_EPISODE, name).any(|(_, e)| e == absolute) {
            best = best.max(0.8);
        } else if bare_episodes(name).any(|e| e == absolute) {
            best = best.max(0.6);
        }
    }

    if best == 0.0 && !has_season_marker(name) && bare_episodes(name).any(|e| e == episode) {
        best = 0.6;
    }

    best
}

fn pairs<'a>(re: &'a Regex, name: &'a str) -> impl Iterator<Item = (u32, u32)> + 'a {
    re.captures_iter(name)
        .filter_map(|c| Some((parse_capture(&c, 1)?, parse_capture(&c, 2)?)))
}

fn bare_episodes(name: &str) -> impl Iterator<Item = u32> + '_ {
    BARE_EPISODE
        .captures_iter(name)
        .chain(DASH_EPISODE.captures_iter(name))
        .filter_map(|c| parse_capture(&c, 1))
}

fn parse_capture(captures: &regex_lite::Captures<'_>, group: usize) -> Option<u32> {
    captures.get(group)?.as_str().parse().ok()
}

fn has_season_marker(name: &str) -> bool {
    SEASON_EPISODE.is_match(name) || CROSS_EPISODE.is_match(name) || WORDY_EPISODE.is_match(name)
}

fn has_episode_marker(name: &str) -> bool {
    has_season_marker(name) || BARE_EPISODE.is_match(name) || DASH_EPISODE.is_match(name)
}

/// Whole-word check on an already lowercased name.
fn contains_word(name: &str, word: &str) -> bool {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|part| part == word)
}

/// Lowercase, punctuation collapsed to single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn get_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

fn extract_filename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
