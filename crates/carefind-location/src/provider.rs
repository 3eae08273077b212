//! The platform location sensor seam.

use std::time::Duration;

use async_trait::async_trait;
use carefind_core::GeoPosition;
use tokio::sync::mpsc;

use crate::error::SensorError;

/// A source of position fixes.
///
/// Implementations wrap a device sensor, an IP geolocation service or a fixed
/// configured position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Requests a single fix. `high_accuracy` selects the power-hungry mode
    /// where the platform distinguishes one.
    async fn get_fix(
        &self,
        high_accuracy: bool,
        timeout: Duration,
    ) -> Result<GeoPosition, SensorError>;

    /// Starts continuous updates. The provider must stop producing fixes and
    /// release the sensor once the returned receiver is dropped.
    async fn watch(&self) -> Result<mpsc::Receiver<GeoPosition>, SensorError> {
        Err(SensorError::Unavailable(
            "continuous location updates are not supported".to_string(),
        ))
    }
}
