//! A provider that always reports one configured position.

use std::time::Duration;

use async_trait::async_trait;
use carefind_core::{GeoPosition, PositionSource};
use tokio::sync::mpsc;

use crate::error::SensorError;
use crate::provider::LocationProvider;

/// Reports a fixed, user-supplied coordinate as a GPS-grade fix.
///
/// Used when the caller already knows where the user is (for example a
/// `--lat/--lon` pair on the command line).
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
}

impl StaticLocationProvider {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
        }
    }

    fn fix(&self) -> Result<GeoPosition, SensorError> {
        GeoPosition::new(
            self.latitude,
            self.longitude,
            self.accuracy_meters,
            PositionSource::Gps,
        )
        .map_err(|e| SensorError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn get_fix(
        &self,
        _high_accuracy: bool,
        _timeout: Duration,
    ) -> Result<GeoPosition, SensorError> {
        self.fix()
    }

    async fn watch(&self) -> Result<mpsc::Receiver<GeoPosition>, SensorError> {
        let fix = self.fix()?;
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            if tx.send(fix).await.is_ok() {
                // Hold the stream open until the subscriber side lets go.
                tx.closed().await;
            }
        });
        Ok(rx)
    }
}
