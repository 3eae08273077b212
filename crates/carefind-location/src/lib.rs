//! Location acquisition for carefind.
//!
//! [`LocationAcquirer`] turns a [`LocationProvider`] into a single-flight,
//! TTL-cached position source with accuracy escalation. [`WatchHub`] shares one
//! continuous provider stream among any number of subscribers.

pub mod acquire;
pub mod cache;
pub mod error;
pub mod provider;
pub mod providers;
pub mod watch;

pub use acquire::{AccuracyTarget, AcquireOptions, LocationAcquirer};
pub use cache::PositionCache;
pub use error::{LocationError, SensorError};
pub use provider::LocationProvider;
pub use providers::{IpLocationProvider, StaticLocationProvider, IP_FIX_ACCURACY_METERS};
pub use watch::{PositionSubscription, WatchHub};
