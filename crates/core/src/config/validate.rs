use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache TTLs, timeouts and batch size are non-zero
/// - Match confidence lies within [0, 1]
/// - Every upstream base URL is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.search_api.timeout_secs == 0 {
        return Err(invalid("search_api.timeout_secs cannot be 0"));
    }

    if config.cache.search_ttl_secs == 0 || config.cache.metadata_ttl_secs == 0 {
        return Err(invalid("cache TTLs must be greater than 0"));
    }

    if config.cache.sweep_interval_secs == 0 {
        return Err(invalid("cache.sweep_interval_secs cannot be 0"));
    }

    if config.resolver.lookup_timeout_secs == 0 {
        return Err(invalid("resolver.lookup_timeout_secs cannot be 0"));
    }

    if config.resolver.batch_size == 0 {
        return Err(invalid("resolver.batch_size cannot be 0"));
    }

    if !(0.0..=1.0).contains(&config.resolver.min_match_confidence) {
        return Err(invalid("resolver.min_match_confidence must be within [0, 1]"));
    }

    for (key, url) in [
        ("search_api.base_url", &config.search_api.base_url),
        ("tmdb.base_url", &config.tmdb.base_url),
        ("stores.torbox.base_url", &config.stores.torbox.base_url),
        ("stores.premiumize.base_url", &config.stores.premiumize.base_url),
        ("stream.base_url", &config.stream.base_url),
    ] {
        if url.trim().is_empty() {
            return Err(invalid(&format!("{} cannot be empty", key)));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
