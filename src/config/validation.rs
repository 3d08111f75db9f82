use crate::config::types::{Config, CrawlConfig, IndexConfig, SearchConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_index_config(&config.index)?;
    validate_crawl_config(&config.crawl)?;
    validate_search_config(&config.search)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "index directory cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("directory-windows", &config.directory_windows),
        ("directory-unix", &config.directory_unix),
    ] {
        if matches!(value, Some(dir) if dir.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot be empty when set",
                name
            )));
        }
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.time_limit_secs == Some(0) {
        return Err(ConfigError::Validation(
            "time_limit_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("max_results", config.max_results),
        ("page_size", config.page_size),
        ("fragment_size", config.fragment_size),
        ("max_fragments", config.max_fragments),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.page_size > config.max_results {
        return Err(ConfigError::Validation(format!(
            "page_size ({}) cannot exceed max_results ({})",
            config.page_size, config.max_results
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
