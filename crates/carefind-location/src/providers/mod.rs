//! Concrete [`crate::LocationProvider`] implementations.

mod fixed;
mod ip;

pub use fixed::StaticLocationProvider;
pub use ip::{IpLocationProvider, IP_FIX_ACCURACY_METERS};
