use thiserror::Error;

/// Errors raised while constructing core domain values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("accuracy must be a positive finite number of meters, got {0}")]
    InvalidAccuracy(f64),

    #[error("coordinates out of range: lat={latitude}, lng={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
