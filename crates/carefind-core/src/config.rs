use std::path::PathBuf;

use crate::app_config::EngineConfig;
use crate::ConfigError;

/// Load engine configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_engine_config_from_env()
}

/// Load engine configuration from environment variables already in the process.
///
/// Unlike [`load_engine_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_engine_config_from_env() -> Result<EngineConfig, ConfigError> {
    build_engine_config(|key| std::env::var(key))
}

/// Build engine configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables take the
/// [`EngineConfig::default`] value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unparsable or out-of-range
/// values and [`ConfigError::Validation`] when the endpoint list is empty.
pub fn build_engine_config<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = EngineConfig::default();

    let or_default = |var: &str, default: String| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        let raw = or_default(var, default.to_string());
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_positive_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        let raw = or_default(var, default.to_string());
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive number, got {value}"),
            });
        }
        Ok(value)
    };

    let default_radius_meters =
        parse_positive_f64("CAREFIND_DEFAULT_RADIUS_METERS", defaults.default_radius_meters)?;
    let location_ttl_ms = parse_u64("CAREFIND_LOCATION_TTL_MS", defaults.location_ttl_ms)?;
    let result_cache_ttl_ms =
        parse_u64("CAREFIND_RESULT_CACHE_TTL_MS", defaults.result_cache_ttl_ms)?;
    let endpoints = parse_endpoints(&or_default(
        "CAREFIND_ENDPOINTS",
        defaults.endpoints.join(","),
    ))?;
    let per_endpoint_retry_count = parse_u32(
        "CAREFIND_PER_ENDPOINT_RETRY_COUNT",
        defaults.per_endpoint_retry_count,
    )?;
    let per_attempt_timeout_ms =
        parse_u64("CAREFIND_PER_ATTEMPT_TIMEOUT_MS", defaults.per_attempt_timeout_ms)?;
    let per_endpoint_budget_ms =
        parse_u64("CAREFIND_PER_ENDPOINT_BUDGET_MS", defaults.per_endpoint_budget_ms)?;
    let retry_backoff_base_ms =
        parse_u64("CAREFIND_RETRY_BACKOFF_BASE_MS", defaults.retry_backoff_base_ms)?;
    let global_search_timeout_ms = parse_u64(
        "CAREFIND_GLOBAL_SEARCH_TIMEOUT_MS",
        defaults.global_search_timeout_ms,
    )?;
    let location_accuracy_meters = parse_positive_f64(
        "CAREFIND_LOCATION_ACCURACY_METERS",
        defaults.location_accuracy_meters,
    )?;
    let location_max_attempts =
        parse_u32("CAREFIND_LOCATION_MAX_ATTEMPTS", defaults.location_max_attempts)?;
    let location_max_wait_ms =
        parse_u64("CAREFIND_LOCATION_MAX_WAIT_MS", defaults.location_max_wait_ms)?;
    let search_debounce_ms = parse_u64("CAREFIND_SEARCH_DEBOUNCE_MS", defaults.search_debounce_ms)?;
    let user_agent = or_default("CAREFIND_USER_AGENT", defaults.user_agent);
    let log_level = or_default("CAREFIND_LOG_LEVEL", defaults.log_level);
    let specializations_path = lookup("CAREFIND_SPECIALIZATIONS_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    if per_attempt_timeout_ms == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CAREFIND_PER_ATTEMPT_TIMEOUT_MS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if location_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CAREFIND_LOCATION_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(EngineConfig {
        default_radius_meters,
        location_ttl_ms,
        result_cache_ttl_ms,
        endpoints,
        per_endpoint_retry_count,
        per_attempt_timeout_ms,
        per_endpoint_budget_ms,
        retry_backoff_base_ms,
        global_search_timeout_ms,
        location_accuracy_meters,
        location_max_attempts,
        location_max_wait_ms,
        search_debounce_ms,
        user_agent,
        log_level,
        specializations_path,
    })
}

/// Split a comma-separated endpoint list, preserving order and dropping
/// blanks and trailing slashes.
fn parse_endpoints(raw: &str) -> Result<Vec<String>, ConfigError> {
    let endpoints: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if endpoints.is_empty() {
        return Err(ConfigError::Validation(
            "CAREFIND_ENDPOINTS must list at least one endpoint".to_string(),
        ));
    }
    if let Some(bad) = endpoints
        .iter()
        .find(|e| !(e.starts_with("http://") || e.starts_with("https://")))
    {
        return Err(ConfigError::InvalidEnvVar {
            var: "CAREFIND_ENDPOINTS".to_string(),
            reason: format!("endpoint '{bad}' must start with http:// or https://"),
        });
    }
    Ok(endpoints)
}
