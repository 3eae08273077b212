//! Multi-endpoint facility search with retry, failover and fallback data.

use async_trait::async_trait;
use carefind_core::{EngineConfig, Facility, GeoPosition, SearchFilters};
use serde::Serialize;
use tokio::time::Instant;

use crate::client::{Endpoint, OverpassClient};
use crate::dedup::dedup_facilities;
use crate::error::QueryError;
use crate::fallback::fallback_facilities;
use crate::normalize::{normalize_elements, SkippedRecord};
use crate::query::FacilityQuery;
use crate::retry::{random_jitter, EndpointCursor, EndpointRetryState, RetryDecision, RetryPolicy};
use crate::types::RawElement;

/// Outcome of one facility query. Live and fallback data are never mixed.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityQueryResult {
    /// Distance-anchored to the query origin, deduplicated, unranked.
    pub facilities: Vec<Facility>,
    /// `true` when `facilities` is the built-in fallback dataset.
    pub degraded: bool,
    /// Base URL of the endpoint that answered; `None` when degraded.
    pub endpoint: Option<String>,
    pub skipped: Vec<SkippedRecord>,
}

impl FacilityQueryResult {
    /// The built-in dataset around `origin`, flagged degraded.
    #[must_use]
    pub fn fallback(origin: &GeoPosition) -> Self {
        Self {
            facilities: fallback_facilities(origin.latitude, origin.longitude),
            degraded: true,
            endpoint: None,
            skipped: Vec::new(),
        }
    }
}

/// Anything that can list facilities around a position.
///
/// Implementations never fail: exhausted backends degrade to fallback data.
#[async_trait]
pub trait FacilitySource: Send + Sync {
    async fn query(
        &self,
        origin: &GeoPosition,
        radius_meters: f64,
        filters: &SearchFilters,
    ) -> FacilityQueryResult;
}

/// Raw elements plus which endpoint produced them.
#[derive(Debug)]
pub struct LiveFetch {
    pub elements: Vec<RawElement>,
    pub endpoint_index: usize,
    pub attempts: u32,
}

/// Queries an ordered list of Overpass endpoints, primary first.
pub struct FacilityQueryEngine {
    client: OverpassClient,
    endpoints: Vec<Endpoint>,
    policy: RetryPolicy,
}

impl FacilityQueryEngine {
    /// Builds an engine from the configured endpoint list and retry limits.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NoEndpoints`] if `config.endpoints` is empty.
    /// - [`QueryError::InvalidEndpoint`] if an endpoint URL does not parse.
    /// - [`QueryError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, QueryError> {
        if config.endpoints.is_empty() {
            return Err(QueryError::NoEndpoints);
        }
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| Endpoint::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            client: OverpassClient::new(&config.user_agent)?,
            endpoints,
            policy: RetryPolicy::from_config(config),
        })
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Runs `query` against each endpoint in order until one succeeds.
    ///
    /// Transient failures are retried on the same endpoint with jittered
    /// exponential back-off inside the endpoint budget; anything else, or an
    /// exhausted budget, moves on to the next endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AllEndpointsFailed`] once every endpoint has been
    /// given up on.
    pub async fn fetch(&self, query: &FacilityQuery) -> Result<LiveFetch, QueryError> {
        let ql = query.to_overpass_ql();
        let mut cursor = EndpointCursor::new(self.endpoints.len());
        let mut total_attempts = 0u32;

        while let Some(index) = cursor.current() {
            let endpoint = &self.endpoints[index];
            let mut state = EndpointRetryState::new(self.policy, Instant::now());

            while let Some(timeout) = state.begin_attempt(Instant::now()) {
                total_attempts += 1;
                let err = match self.client.interpret(endpoint, &ql, timeout).await {
                    Ok(elements) => {
                        tracing::debug!(
                            endpoint = %endpoint.base(),
                            elements = elements.len(),
                            attempt = state.attempts(),
                            "Overpass query succeeded"
                        );
                        return Ok(LiveFetch {
                            elements,
                            endpoint_index: index,
                            attempts: total_attempts,
                        });
                    }
                    Err(err) => err,
                };

                match state.on_failure(&err, Instant::now(), random_jitter()) {
                    RetryDecision::RetryAfter(delay) => {
                        let delay_ms = carefind_core::duration_millis(delay);
                        tracing::warn!(
                            endpoint = %endpoint.base(),
                            attempt = state.attempts(),
                            max_retries = self.policy.max_retries,
                            delay_ms,
                            error = %err,
                            "Overpass transient error, retrying after back-off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::FailOver => {
                        tracing::warn!(
                            endpoint = %endpoint.base(),
                            attempt = state.attempts(),
                            error = %err,
                            "giving up on Overpass endpoint"
                        );
                        break;
                    }
                }
            }

            cursor.advance();
            if let Some(next) = cursor.current() {
                tracing::warn!(
                    from = %endpoint.base(),
                    to = %self.endpoints[next].base(),
                    "failing over to next Overpass endpoint"
                );
            }
        }

        Err(QueryError::AllEndpointsFailed {
            endpoints: self.endpoints.len(),
            attempts: total_attempts,
        })
    }
}

#[async_trait]
impl FacilitySource for FacilityQueryEngine {
    async fn query(
        &self,
        origin: &GeoPosition,
        radius_meters: f64,
        filters: &SearchFilters,
    ) -> FacilityQueryResult {
        let query = FacilityQuery {
            latitude: origin.latitude,
            longitude: origin.longitude,
            radius_meters,
            emergency_only: filters.emergency_only,
            server_timeout: self.policy.attempt_timeout,
        };

        match self.fetch(&query).await {
            Ok(live) => {
                let (facilities, skipped) =
                    normalize_elements(&live.elements, origin.latitude, origin.longitude);
                let facilities = dedup_facilities(facilities);
                tracing::info!(
                    endpoint = %self.endpoints[live.endpoint_index].base(),
                    attempts = live.attempts,
                    facilities = facilities.len(),
                    skipped = skipped.len(),
                    "facility query complete"
                );
                FacilityQueryResult {
                    facilities,
                    degraded: false,
                    endpoint: Some(self.endpoints[live.endpoint_index].base().to_owned()),
                    skipped,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "serving built-in fallback facilities");
                FacilityQueryResult::fallback(origin)
            }
        }
    }
}
