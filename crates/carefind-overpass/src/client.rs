//! HTTP transport for a single Overpass interpreter endpoint.
//!
//! [`OverpassClient::interpret`] performs exactly one request and classifies
//! the outcome into [`QueryError`] variants. Retrying and failover live in
//! [`crate::engine`].

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode, Url};

use crate::error::QueryError;
use crate::types::{OverpassResponse, RawElement};

/// Remark fragments Overpass uses when it could not run a query to completion.
const OVERLOAD_REMARKS: &[&str] = &["runtime error", "too busy", "timed out", "rate_limited"];

/// A configured backend: the base URL as given plus its interpreter URL.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: String,
    interpreter: Url,
}

impl Endpoint {
    /// Parses a base URL such as `https://overpass-api.de/api`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidEndpoint`] if `base` is not an absolute
    /// http(s) URL.
    pub fn parse(base: &str) -> Result<Self, QueryError> {
        let trimmed = base.trim().trim_end_matches('/');
        let invalid = |reason: String| QueryError::InvalidEndpoint {
            endpoint: base.to_owned(),
            reason,
        };
        let interpreter =
            Url::parse(&format!("{trimmed}/interpreter")).map_err(|e| invalid(e.to_string()))?;
        if !matches!(interpreter.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", interpreter.scheme())));
        }
        Ok(Self {
            base: trimmed.to_owned(),
            interpreter,
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn interpreter_url(&self) -> &Url {
        &self.interpreter
    }
}

/// Client for Overpass `interpreter` endpoints.
pub struct OverpassClient {
    client: Client,
}

impl OverpassClient {
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, QueryError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Runs `query` once against `endpoint`, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::EndpointUnreachable`] on network failure, timeout or 5xx.
    /// - [`QueryError::RateLimited`] on HTTP 429.
    /// - [`QueryError::Rejected`] on any other non-success status.
    /// - [`QueryError::Overloaded`] when the server's `remark` reports it
    ///   could not finish the query.
    /// - [`QueryError::Deserialize`] if the body is not Overpass JSON.
    pub async fn interpret(
        &self,
        endpoint: &Endpoint,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<RawElement>, QueryError> {
        let unreachable = |reason: String| QueryError::EndpointUnreachable {
            endpoint: endpoint.base.clone(),
            reason,
        };

        let response = self
            .client
            .post(endpoint.interpreter.clone())
            .timeout(timeout)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| unreachable(describe_transport_error(&e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(QueryError::RateLimited {
                endpoint: endpoint.base.clone(),
                retry_after_secs,
            });
        }
        if status.is_server_error() {
            return Err(unreachable(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(QueryError::Rejected {
                endpoint: endpoint.base.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| unreachable(describe_transport_error(&e)))?;
        let parsed: OverpassResponse =
            serde_json::from_str(&body).map_err(|e| QueryError::Deserialize {
                context: format!("interpreter response from {}", endpoint.base),
                source: e,
            })?;

        if let Some(remark) = parsed.remark.as_deref() {
            let lowered = remark.to_lowercase();
            if OVERLOAD_REMARKS.iter().any(|m| lowered.contains(m)) {
                return Err(QueryError::Overloaded {
                    endpoint: endpoint.base.clone(),
                    remark: remark.to_owned(),
                });
            }
            tracing::debug!(endpoint = %endpoint.base, remark, "Overpass response remark");
        }

        Ok(parsed.elements)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_owned()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
