//! Command handlers. Results are printed to stdout as pretty JSON; logs go
//! to stderr.

use std::sync::Arc;

use carefind_core::{
    normalize_locale, EngineConfig, Locale, SearchFilters, SortBy, SpecializationId,
};
use carefind_engine::{DiscoveryEngine, DiscoveryError};
use carefind_location::{
    AccuracyTarget, IpLocationProvider, LocationProvider, StaticLocationProvider,
    IP_FIX_ACCURACY_METERS,
};
use clap::Args;
use serde::Serialize;

/// Where the user is. Without coordinates the position comes from IP lookup.
#[derive(Debug, Args)]
pub struct PositionArgs {
    /// Latitude of the search origin
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Longitude of the search origin
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
    /// Accuracy in meters reported for `--lat/--lon`
    #[arg(long, default_value = "10")]
    pub accuracy: f64,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Search radius in meters (defaults to CAREFIND_DEFAULT_RADIUS_METERS)
    #[arg(long)]
    pub radius: Option<f64>,
    /// Minimum average rating, 0 to 5
    #[arg(long, default_value = "0")]
    pub min_rating: f64,
    /// Only facilities offering this specialization id (e.g. cardiology)
    #[arg(long)]
    pub specialization: Option<String>,
    /// Only facilities with emergency services
    #[arg(long)]
    pub emergency_only: bool,
    /// Sort order: distance, rating or name
    #[arg(long, default_value = "distance")]
    pub sort: SortBy,
    /// Maximum number of facilities to return
    #[arg(long, default_value = "20")]
    pub limit: usize,
}

impl FilterArgs {
    pub(crate) fn to_filters(&self, defaults: SearchFilters) -> SearchFilters {
        SearchFilters {
            max_distance_meters: self.radius.unwrap_or(defaults.max_distance_meters),
            min_rating: self.min_rating,
            specialization_id: self.specialization.as_deref().map(SpecializationId::new),
            emergency_only: self.emergency_only,
            sort_by: self.sort,
            limit: self.limit,
        }
    }
}

/// Builds the engine with a fixed provider for explicit coordinates, or an
/// IP lookup whose accuracy target is relaxed to what IP fixes can meet.
fn build_engine(config: EngineConfig, position: &PositionArgs) -> anyhow::Result<DiscoveryEngine> {
    if let (Some(lat), Some(lon)) = (position.lat, position.lon) {
        let provider: Arc<dyn LocationProvider> =
            Arc::new(StaticLocationProvider::new(lat, lon, position.accuracy));
        return Ok(DiscoveryEngine::from_config(config, provider)?);
    }

    let provider: Arc<dyn LocationProvider> = Arc::new(IpLocationProvider::new(&config.user_agent)?);
    let mut target = AccuracyTarget::from_config(&config);
    target.accuracy_meters = target.accuracy_meters.max(IP_FIX_ACCURACY_METERS);
    tracing::info!("no coordinates given; locating by IP address");
    Ok(DiscoveryEngine::from_config(config, provider)?.with_accuracy_target(target))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn localized(err: DiscoveryError, locale: Locale) -> anyhow::Error {
    anyhow::anyhow!("{} ({err})", err.user_message(locale))
}

pub(crate) async fn run_find(
    config: EngineConfig,
    position: &PositionArgs,
    filters: &FilterArgs,
) -> anyhow::Result<()> {
    let engine = build_engine(config, position)?;
    let result = engine
        .find_nearby_facilities(filters.to_filters(engine.default_filters()))
        .await
        .map_err(|e| localized(e, Locale::En))?;
    if result.degraded {
        tracing::warn!("live facility data unavailable; showing approximate fallback results");
    }
    print_json(&result)
}

pub(crate) fn run_classify(config: &EngineConfig, text: &str, locale: &str) -> anyhow::Result<()> {
    let catalog = carefind_triage::load_catalog(config.specializations_path.as_deref())?;
    let classifier = carefind_triage::SymptomClassifier::new(catalog);
    print_json(&classifier.classify(text, locale))
}

pub(crate) async fn run_triage(
    config: EngineConfig,
    text: &str,
    locale: &str,
    position: &PositionArgs,
    filters: &FilterArgs,
) -> anyhow::Result<()> {
    let engine = build_engine(config, position)?;
    let result = engine
        .classify_and_search(text, locale, filters.to_filters(engine.default_filters()))
        .await
        .map_err(|e| localized(e, normalize_locale(locale)))?;
    print_json(&result)
}

pub(crate) async fn run_locate(
    config: EngineConfig,
    position: &PositionArgs,
    watch: Option<usize>,
) -> anyhow::Result<()> {
    let engine = build_engine(config, position)?;
    let Some(count) = watch else {
        let fix = engine
            .refresh_location()
            .await
            .map_err(|e| localized(e, Locale::En))?;
        return print_json(&fix);
    };

    let mut subscription = engine
        .watch_location()
        .await
        .map_err(|e| localized(e, Locale::En))?;
    for _ in 0..count {
        let Some(fix) = subscription.next().await else {
            break;
        };
        print_json(&fix)?;
    }
    Ok(())
}
