use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read specializations file at {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse specializations file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("specialization catalog validation error: {0}")]
    Validation(String),
}
