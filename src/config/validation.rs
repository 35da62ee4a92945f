use crate::codec::ImageFormat;
use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_site_config(&config.site)?;
    Ok(())
}

/// Validates pool widths, retry policy and timeouts
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    check_range("max-workers", config.max_workers, 1, 64)?;
    check_range("page-workers", config.page_workers, 1, 64)?;
    check_range("page-batch-size", config.page_batch_size, 1, usize::MAX)?;
    check_range("max-pages", config.max_pages as usize, 1, 100_000)?;
    check_range("max-retries", config.max_retries as usize, 1, 10)?;
    check_range("request-timeout-secs", config.request_timeout_secs as usize, 1, 600)?;
    check_range("connect-timeout-secs", config.connect_timeout_secs as usize, 1, 600)?;

    if config.backoff_schedule_ms.is_empty() {
        return Err(ConfigError::Validation(
            "backoff-schedule-ms needs at least one delay".to_string(),
        ));
    }

    Ok(())
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if value < min || value > max {
        let bound = if max == usize::MAX {
            format!(">= {}", min)
        } else {
            format!("between {} and {}", min, max)
        };
        return Err(ConfigError::Validation(format!(
            "{} must be {}, got {}",
            field, bound, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_root.is_empty() {
        return Err(ConfigError::Validation(
            "output_root cannot be empty".to_string(),
        ));
    }

    if ImageFormat::from_name(&config.image_format).is_none() {
        return Err(ConfigError::Validation(format!(
            "image_format must be one of webp, png, jpeg; got '{}'",
            config.image_format
        )));
    }

    if config.fallback_series.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fallback_series cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates URL patterns and CSS selectors
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.category_patterns.is_empty() && config.product_patterns.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category or product pattern is required".to_string(),
        ));
    }

    for pattern in config
        .category_patterns
        .iter()
        .chain(config.product_patterns.iter())
    {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    validate_selector("product-link-selector", &config.product_link_selector)?;
    validate_selector("pagination-selector", &config.pagination_selector)?;
    validate_selector("name-selector", &config.name_selector)?;

    let optional = [
        ("code-selector", &config.code_selector),
        ("price-selector", &config.price_selector),
        ("spec-selector", &config.spec_selector),
        ("image-selector", &config.image_selector),
        ("series-selector", &config.series_selector),
    ];
    for (field, selector) in optional {
        if let Some(selector) = selector {
            validate_selector(field, selector)?;
        }
    }

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() || Selector::parse(selector).is_err() {
        return Err(ConfigError::InvalidSelector {
            field: field.to_string(),
            selector: selector.to_string(),
        });
    }
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
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "contact_email '{}' is not a valid email address",
            email
        )));
    }

    Ok(())
}
