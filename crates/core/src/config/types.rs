use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search_api: SearchApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// External search index configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchApiConfig {
    /// Search API root (e.g., "https://search-api.torbox.app")
    #[serde(default = "default_search_api_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u32,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_api_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_api_url() -> String {
    "https://search-api.torbox.app".to_string()
}

fn default_search_timeout() -> u32 {
    15
}

/// TTLs for the shared candidate and metadata caches
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Candidate-source list TTL in seconds (default: 1 hour)
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,
    /// Title metadata TTL in seconds (default: 1 week)
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_secs: u64,
    /// Interval between background purges of expired entries (default: 5 minutes)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: default_search_ttl(),
            metadata_ttl_secs: default_metadata_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl CacheConfig {
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_search_ttl() -> u64 {
    60 * 60
}

fn default_metadata_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_sweep_interval() -> u64 {
    5 * 60
}

/// TMDB season lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// Base URL (default: https://api.themoviedb.org/3)
    #[serde(default = "default_tmdb_url")]
    pub base_url: String,
    /// Read access token used when a request does not carry its own.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_tmdb_timeout")]
    pub timeout_secs: u32,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tmdb_url(),
            access_token: None,
            timeout_secs: default_tmdb_timeout(),
        }
    }
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_timeout() -> u32 {
    10
}

/// Per-account availability resolution
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Upper bound for one account's lookup; exceeding it fails that account only.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
    /// Files scoring below this are never reported as matches.
    #[serde(default = "default_min_confidence")]
    pub min_match_confidence: f32,
    /// Report title-matched sources that are not cached on the account.
    #[serde(default)]
    pub include_uncached: bool,
    /// Hashes per availability request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: default_lookup_timeout(),
            min_match_confidence: default_min_confidence(),
            include_uncached: false,
            batch_size: default_batch_size(),
        }
    }
}

impl ResolverConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn default_lookup_timeout() -> u64 {
    10
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_batch_size() -> usize {
    100
}

/// Native API endpoints of the supported storage services
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoresConfig {
    #[serde(default)]
    pub torbox: TorboxStoreConfig,
    #[serde(default)]
    pub premiumize: PremiumizeStoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorboxStoreConfig {
    #[serde(default = "default_torbox_url")]
    pub base_url: String,
}

impl Default for TorboxStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_torbox_url(),
        }
    }
}

fn default_torbox_url() -> String {
    "https://api.torbox.app".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PremiumizeStoreConfig {
    #[serde(default = "default_premiumize_url")]
    pub base_url: String,
}

impl Default for PremiumizeStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_premiumize_url(),
        }
    }
}

fn default_premiumize_url() -> String {
    "https://www.premiumize.me".to_string()
}

/// Stream descriptor rendering
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Public origin prefixed to resolution URLs
    #[serde(default = "default_stream_base_url")]
    pub base_url: String,
    /// Label shown in every stream name
    #[serde(default = "default_addon_name")]
    pub addon_name: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_stream_base_url(),
            addon_name: default_addon_name(),
        }
    }
}

fn default_stream_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_addon_name() -> String {
    "StreamScout".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub search_api: SearchApiConfig,
    pub cache: CacheConfig,
    pub tmdb: SanitizedTmdbConfig,
    pub resolver: ResolverConfig,
    pub stores: StoresConfig,
    pub stream: StreamConfig,
}

/// Sanitized TMDB config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub base_url: String,
    pub access_token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            search_api: config.search_api.clone(),
            cache: config.cache.clone(),
            tmdb: SanitizedTmdbConfig {
                base_url: config.tmdb.base_url.clone(),
                access_token_configured: config
                    .tmdb
                    .access_token
                    .as_ref()
                    .is_some_and(|t| !t.is_empty()),
                timeout_secs: config.tmdb.timeout_secs,
            },
            resolver: config.resolver.clone(),
            stores: config.stores.clone(),
            stream: config.stream.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.search_api.base_url, "https://search-api.torbox.app");
        assert_eq!(config.cache.search_ttl_secs, 3600);
        assert_eq!(config.resolver.batch_size, 100);
        assert!(!config.resolver.include_uncached);
        assert!(config.tmdb.access_token.is_none());
        assert_eq!(config.stream.addon_name, "StreamScout");
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[cache]
search_ttl_secs = 120
metadata_ttl_secs = 600

[resolver]
lookup_timeout_secs = 3
min_match_confidence = 0.8
include_uncached = true

[stores.torbox]
base_url = "http://localhost:7000"

[stream]
base_url = "https://addon.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.search_ttl(), Duration::from_secs(120));
        assert_eq!(config.cache.metadata_ttl(), Duration::from_secs(600));
        assert_eq!(config.resolver.lookup_timeout(), Duration::from_secs(3));
        assert!(config.resolver.include_uncached);
        assert_eq!(config.stores.torbox.base_url, "http://localhost:7000");
        assert_eq!(config.stores.premiumize.base_url, "https://www.premiumize.me");
        assert_eq!(config.stream.base_url, "https://addon.example.com");
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let mut config = Config::default();
        config.tmdb.access_token = Some("tmdb-secret".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.tmdb.access_token_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("tmdb-secret"));
    }

    #[test]
    fn test_sanitized_config_without_token() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert!(!sanitized.tmdb.access_token_configured);
        assert_eq!(sanitized.server.port, 8080);
    }
}
