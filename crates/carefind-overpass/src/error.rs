use thiserror::Error;

/// Errors raised while talking to an Overpass endpoint.
///
/// None of these reach callers of [`crate::FacilitySource::query`]: transient
/// failures are retried, persistent ones fail over to the next endpoint, and
/// [`QueryError::AllEndpointsFailed`] is turned into a degraded result.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Network failure, timeout or an HTTP 5xx from the endpoint.
    #[error("endpoint {endpoint} unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    /// HTTP 429. `retry_after_secs` comes from the `Retry-After` header.
    #[error("endpoint {endpoint} rate limited the request")]
    RateLimited {
        endpoint: String,
        retry_after_secs: Option<u64>,
    },

    /// The endpoint answered but reported that it could not run the query.
    #[error("endpoint {endpoint} is overloaded: {remark}")]
    Overloaded { endpoint: String, remark: String },

    /// Any other non-success status. Retrying the same endpoint will not help.
    #[error("endpoint {endpoint} rejected the query with HTTP {status}")]
    Rejected { endpoint: String, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("all {endpoints} endpoints failed after {attempts} attempts")]
    AllEndpointsFailed { endpoints: usize, attempts: u32 },
}

/// Returns `true` for errors worth retrying against the same endpoint.
///
/// **Retriable:** [`QueryError::EndpointUnreachable`],
/// [`QueryError::RateLimited`], [`QueryError::Overloaded`].
///
/// **Not retriable:** everything else; the engine moves on to the next
/// endpoint instead.
#[must_use]
pub fn is_transient(err: &QueryError) -> bool {
    match err {
        QueryError::EndpointUnreachable { .. }
        | QueryError::RateLimited { .. }
        | QueryError::Overloaded { .. } => true,
        QueryError::Http(_)
        | QueryError::Rejected { .. }
        | QueryError::Deserialize { .. }
        | QueryError::InvalidEndpoint { .. }
        | QueryError::NoEndpoints
        | QueryError::AllEndpointsFailed { .. } => false,
    }
}
