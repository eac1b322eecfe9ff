use crate::app_config::{AppConfig, Environment};
use crate::regions::{load_regions, RegionCatalog};
use crate::types::RegionCode;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or the region catalog cannot be loaded.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or the region catalog cannot be loaded.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("ASEARCH_ENV", "development"))?;

    let api_base_url = or_default("ASEARCH_API_BASE_URL", "http://127.0.0.1:8000");
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "ASEARCH_API_BASE_URL",
            format!("'{api_base_url}' must start with http:// or https://"),
        ));
    }

    let log_level = or_default("ASEARCH_LOG_LEVEL", "info");

    let default_region = or_default("ASEARCH_DEFAULT_REGION", "CA");
    if default_region.trim().is_empty() {
        return Err(invalid(
            "ASEARCH_DEFAULT_REGION",
            "region code must be non-empty".to_string(),
        ));
    }
    let default_region = RegionCode::new(default_region.trim());

    let regions = match lookup("ASEARCH_REGIONS_PATH") {
        Ok(path) => load_regions(&PathBuf::from(path), &default_region)?,
        Err(_) => {
            let builtin = RegionCatalog::builtin();
            builtin.validate(&default_region)?;
            builtin
        }
    };
    // Use the catalog's spelling of the code so "ca" and "CA" persist identically.
    let default_region = regions.resolve(&default_region).value;

    let preferences_path = PathBuf::from(or_default(
        "ASEARCH_PREFERENCES_PATH",
        "./.asearch/preferences.json",
    ));

    let request_timeout_secs = parse_u64("ASEARCH_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "ASEARCH_REQUEST_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }
    let user_agent = or_default("ASEARCH_USER_AGENT", "asearch/0.1 (search-frontend)");
    let max_retries = parse_u32("ASEARCH_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("ASEARCH_RETRY_BACKOFF_BASE_MS", "500")?;
    let page_size = parse_usize("ASEARCH_PAGE_SIZE", "20")?;

    Ok(AppConfig {
        env,
        api_base_url,
        log_level,
        default_region,
        regions,
        preferences_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        page_size,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ASEARCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
