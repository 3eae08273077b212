use std::path::PathBuf;
use std::time::Duration;

/// Public Overpass API mirrors, primary first.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://overpass-api.de/api",
    "https://overpass.kumi.systems/api",
    "https://maps.mail.ru/osm/tools/overpass/api",
];

/// Runtime configuration for the discovery engine.
///
/// Supplied once at construction; nothing reads the environment afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub default_radius_meters: f64,
    pub location_ttl_ms: u64,
    pub result_cache_ttl_ms: u64,
    /// Ordered failover list of backend base URLs, primary first.
    pub endpoints: Vec<String>,
    pub per_endpoint_retry_count: u32,
    pub per_attempt_timeout_ms: u64,
    /// Wall-clock budget for one endpoint including its retries.
    pub per_endpoint_budget_ms: u64,
    pub retry_backoff_base_ms: u64,
    pub global_search_timeout_ms: u64,
    pub location_accuracy_meters: f64,
    pub location_max_attempts: u32,
    pub location_max_wait_ms: u64,
    pub search_debounce_ms: u64,
    pub user_agent: String,
    pub log_level: String,
    /// Optional YAML file replacing the built-in specialization catalog.
    pub specializations_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: 5_000.0,
            location_ttl_ms: 5 * 60 * 1_000,
            result_cache_ttl_ms: 2 * 60 * 1_000,
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            per_endpoint_retry_count: 2,
            per_attempt_timeout_ms: 8_000,
            per_endpoint_budget_ms: 12_000,
            retry_backoff_base_ms: 500,
            global_search_timeout_ms: 30_000,
            location_accuracy_meters: 100.0,
            location_max_attempts: 3,
            location_max_wait_ms: 15_000,
            search_debounce_ms: 400,
            user_agent: "carefind/0.1 (facility-discovery)".to_string(),
            log_level: "info".to_string(),
            specializations_path: None,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn location_ttl(&self) -> Duration {
        Duration::from_millis(self.location_ttl_ms)
    }

    #[must_use]
    pub fn result_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.result_cache_ttl_ms)
    }

    #[must_use]
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    #[must_use]
    pub fn per_endpoint_budget(&self) -> Duration {
        Duration::from_millis(self.per_endpoint_budget_ms)
    }

    #[must_use]
    pub fn retry_backoff_base(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_base_ms)
    }

    #[must_use]
    pub fn global_search_timeout(&self) -> Duration {
        Duration::from_millis(self.global_search_timeout_ms)
    }

    #[must_use]
    pub fn location_max_wait(&self) -> Duration {
        Duration::from_millis(self.location_max_wait_ms)
    }

    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Whole milliseconds in `duration` for log fields, saturating at `u64::MAX`.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
