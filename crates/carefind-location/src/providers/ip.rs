//! Coarse network positioning through an IP geolocation service.

use std::time::Duration;

use async_trait::async_trait;
use carefind_core::{GeoPosition, PositionSource};
use reqwest::Client;
use serde::Deserialize;

use crate::error::SensorError;
use crate::provider::LocationProvider;

const DEFAULT_BASE_URL: &str = "http://ip-api.com/json";

/// City-level accuracy typical of IP geolocation.
pub const IP_FIX_ACCURACY_METERS: f64 = 5_000.0;

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Network location provider backed by an `ip-api.com` compatible service.
///
/// IP lookups cannot be made more precise, so high-accuracy requests return
/// the same coarse fix.
pub struct IpLocationProvider {
    client: Client,
    base_url: String,
}

impl IpLocationProvider {
    /// Creates a provider pointed at the public lookup service.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str) -> Result<Self, SensorError> {
        Self::with_base_url(user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a provider with a custom lookup URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] if the HTTP client cannot be built.
    pub fn with_base_url(user_agent: &str, base_url: &str) -> Result<Self, SensorError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SensorError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn get_fix(
        &self,
        _high_accuracy: bool,
        timeout: Duration,
    ) -> Result<GeoPosition, SensorError> {
        let response = self
            .client
            .get(&self.base_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let body: IpLookupResponse = response.json().await.map_err(map_http_error)?;
        if body.status != "success" {
            return Err(SensorError::Unavailable(
                body.message
                    .unwrap_or_else(|| "ip lookup failed".to_string()),
            ));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(SensorError::Unavailable(
                "ip lookup response has no coordinates".to_string(),
            ));
        };

        GeoPosition::new(lat, lon, IP_FIX_ACCURACY_METERS, PositionSource::Network)
            .map_err(|e| SensorError::Unavailable(e.to_string()))
    }
}

fn map_http_error(err: reqwest::Error) -> SensorError {
    if err.is_timeout() {
        SensorError::Timeout
    } else {
        SensorError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn parses_successful_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 12.9716,
                "lon": 77.5946,
                "city": "Bengaluru"
            })))
            .mount(&server)
            .await;

        let provider = IpLocationProvider::with_base_url("carefind-test/0.1", &server.uri()).unwrap();
        let fix = provider
            .get_fix(false, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(fix.source, PositionSource::Network);
        assert!((fix.accuracy_meters - IP_FIX_ACCURACY_METERS).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failed_lookup_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let provider = IpLocationProvider::with_base_url("carefind-test/0.1", &server.uri()).unwrap();
        let err = provider
            .get_fix(false, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, SensorError::Unavailable("private range".to_string()));
    }

    #[tokio::test]
    async fn slow_lookup_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(serde_json::json!({"status": "success", "lat": 1.0, "lon": 2.0})),
            )
            .mount(&server)
            .await;

        let provider = IpLocationProvider::with_base_url("carefind-test/0.1", &server.uri()).unwrap();
        let err = provider
            .get_fix(false, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, SensorError::Timeout);
    }
}
