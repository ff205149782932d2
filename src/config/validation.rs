use crate::config::types::{
    Config, CrawlerConfig, DiscoveryConfig, OutputConfig, RemoteConfig, SearchConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest page the graph API will hand back in one request
const MAX_PAGE_SIZE: u32 = 5000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_remote_config(&config.remote)?;
    if let Some(search) = &config.search {
        validate_search_config(search)?;
    }
    validate_discovery_config(&config.discovery)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.min_wait_ms == 0 {
        return Err(ConfigError::Validation(
            "min_wait_ms must be > 0 so a stale reset time cannot spin".to_string(),
        ));
    }

    Ok(())
}

fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    validate_http_url("remote.base_url", &config.base_url)?;
    validate_env_name("remote.token_env", &config.token_env)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "remote.user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    validate_http_url("search.base_url", &config.base_url)?;
    validate_env_name("search.key_env", &config.key_env)?;

    if config.engine_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search.engine_id cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config
        .location_keywords
        .iter()
        .all(|keyword| keyword.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "discovery.location_keywords must contain at least one non-empty keyword".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("checkpoint_path", &config.checkpoint_path),
        ("event_log_path", &config.event_log_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "output.{} cannot be empty",
                name
            )));
        }
    }

    if config.database_path == config.checkpoint_path {
        return Err(ConfigError::Validation(
            "output.checkpoint_path must differ from output.database_path".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a URL parses and uses http or https
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

/// Environment variable names: non-empty, uppercase alphanumerics and underscores
fn validate_env_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "{} must be an environment variable name like GEOFLOCK_TOKEN, got '{}'",
            field, name
        )));
    }

    Ok(())
}
