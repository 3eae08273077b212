//! Public discovery operations composed from location, query, triage,
//! ranking and caching.

use std::sync::Arc;

use carefind_core::{
    duration_millis, Classification, EngineConfig, GeoPosition, SearchFilters, SearchResult,
    SortBy, UrgencyLevel,
};
use carefind_location::{
    AccuracyTarget, AcquireOptions, LocationAcquirer, LocationProvider, PositionCache,
    PositionSubscription, WatchHub,
};
use carefind_overpass::{FacilityQueryEngine, FacilityQueryResult, FacilitySource};
use carefind_triage::{load_catalog, SymptomClassifier};
use futures::FutureExt;
use tokio::time::Instant;

use crate::error::{BuildError, DiscoveryError};
use crate::ranking::rank_facilities;
use crate::result_cache::{CacheKey, ResultCache};

/// Largest radius sent to the backend regardless of filters.
pub const MAX_QUERY_RADIUS_METERS: f64 = 50_000.0;

/// Rejects filters no search could satisfy.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidFilters`] for a non-positive or
/// non-finite distance, a rating outside `0..=5`, or a zero limit.
pub fn validate_filters(filters: &SearchFilters) -> Result<(), DiscoveryError> {
    if !(filters.max_distance_meters.is_finite() && filters.max_distance_meters > 0.0) {
        return Err(DiscoveryError::InvalidFilters(format!(
            "max distance must be positive, got {}",
            filters.max_distance_meters
        )));
    }
    if !(0.0..=5.0).contains(&filters.min_rating) {
        return Err(DiscoveryError::InvalidFilters(format!(
            "min rating must be between 0 and 5, got {}",
            filters.min_rating
        )));
    }
    if filters.limit == 0 {
        return Err(DiscoveryError::InvalidFilters(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn query_radius(filters: &SearchFilters) -> f64 {
    filters.max_distance_meters.min(MAX_QUERY_RADIUS_METERS)
}

/// Entry point for the surrounding application.
///
/// Holds the only mutable shared state (position and result caches) and is
/// cheap to share behind an `Arc`.
pub struct DiscoveryEngine {
    config: EngineConfig,
    accuracy: AccuracyTarget,
    acquirer: LocationAcquirer,
    watch: WatchHub,
    source: Arc<dyn FacilitySource>,
    classifier: SymptomClassifier,
    results: ResultCache,
}

impl DiscoveryEngine {
    #[must_use]
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn LocationProvider>,
        source: Arc<dyn FacilitySource>,
        classifier: SymptomClassifier,
    ) -> Self {
        let positions = Arc::new(PositionCache::new());
        Self {
            accuracy: AccuracyTarget::from_config(&config),
            acquirer: LocationAcquirer::new(
                Arc::clone(&provider),
                Arc::clone(&positions),
                config.location_ttl(),
            ),
            watch: WatchHub::new(provider, positions),
            source,
            classifier,
            results: ResultCache::new(config.result_cache_ttl()),
            config,
        }
    }

    /// Wires the Overpass query engine and the configured (or built-in)
    /// specialization catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if an endpoint URL is invalid or the catalog
    /// file cannot be loaded.
    pub fn from_config(
        config: EngineConfig,
        provider: Arc<dyn LocationProvider>,
    ) -> Result<Self, BuildError> {
        let source = Arc::new(FacilityQueryEngine::new(&config)?);
        let catalog = load_catalog(config.specializations_path.as_deref())?;
        Ok(Self::new(
            config,
            provider,
            source,
            SymptomClassifier::new(catalog),
        ))
    }

    /// Overrides the accuracy target derived from configuration.
    #[must_use]
    pub fn with_accuracy_target(mut self, target: AccuracyTarget) -> Self {
        self.accuracy = target;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn result_cache(&self) -> &ResultCache {
        &self.results
    }

    #[must_use]
    pub fn position_cache(&self) -> &Arc<PositionCache> {
        self.acquirer.cache()
    }

    /// Default filters with the configured search radius.
    #[must_use]
    pub fn default_filters(&self) -> SearchFilters {
        SearchFilters {
            max_distance_meters: self.config.default_radius_meters,
            ..SearchFilters::default()
        }
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.config.global_search_timeout()
    }

    /// Locates the user and returns matching facilities.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidFilters`] before any work is done.
    /// - [`DiscoveryError::Location`] for permission or capability failures.
    /// - [`DiscoveryError::TimedOut`] if no position was obtained before the
    ///   overall ceiling. A search that runs out of time once a position is
    ///   known returns degraded fallback data instead.
    pub async fn find_nearby_facilities(
        &self,
        filters: SearchFilters,
    ) -> Result<SearchResult, DiscoveryError> {
        validate_filters(&filters)?;
        let deadline = self.deadline();
        let origin = self.locate(deadline, false).await?;
        Ok(self.search_until(&origin, &filters, deadline).await)
    }

    /// Like [`DiscoveryEngine::find_nearby_facilities`] from a known origin.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidFilters`] for unusable filters.
    pub async fn find_nearby_facilities_at(
        &self,
        origin: &GeoPosition,
        filters: SearchFilters,
    ) -> Result<SearchResult, DiscoveryError> {
        validate_filters(&filters)?;
        Ok(self.search_until(origin, &filters, self.deadline()).await)
    }

    /// Classifies symptom text. Never fails.
    #[must_use]
    pub fn classify_symptoms(&self, text: &str, locale: &str) -> Classification {
        self.classifier.classify(text, locale)
    }

    /// Classifies `text`, then searches with filters shaped by the outcome.
    ///
    /// Emergency urgency forces emergency-capable facilities sorted by
    /// distance. Otherwise, when the caller set no specialization, the top
    /// inferred one is applied, and dropped again if nothing matches it.
    ///
    /// # Errors
    ///
    /// As [`DiscoveryEngine::find_nearby_facilities`].
    pub async fn classify_and_search(
        &self,
        text: &str,
        locale: &str,
        filters: SearchFilters,
    ) -> Result<SearchResult, DiscoveryError> {
        validate_filters(&filters)?;
        let classification = self.classify_symptoms(text, locale);

        let mut filters = filters;
        let mut inferred_specialization = false;
        if classification.urgency_level == UrgencyLevel::Emergency {
            filters.emergency_only = true;
            filters.sort_by = SortBy::Distance;
        } else if filters.specialization_id.is_none() {
            if let Some(top) = classification.specializations.first() {
                filters.specialization_id = Some(top.clone());
                inferred_specialization = true;
            }
        }

        let deadline = self.deadline();
        let origin = self.locate(deadline, false).await?;
        let mut result = self.search_until(&origin, &filters, deadline).await;

        if inferred_specialization && result.facilities.is_empty() {
            tracing::debug!(
                specialization = ?filters.specialization_id,
                "no facilities for inferred specialization; searching without it"
            );
            filters.specialization_id = None;
            result = self.search_until(&origin, &filters, deadline).await;
        }

        result.urgency_level = Some(classification.urgency_level);
        result.specializations = self.classifier.resolve(&classification.specializations);
        result.recommendations = classification.recommendations;
        Ok(result)
    }

    /// Forces a fresh fix and clears every cached search result.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::Location`] or [`DiscoveryError::TimedOut`].
    pub async fn refresh_location(&self) -> Result<GeoPosition, DiscoveryError> {
        self.results.invalidate(None);
        self.locate(self.deadline(), true).await
    }

    /// Subscribes to continuous position updates shared with other subscribers.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::Location`] if the provider cannot stream positions.
    pub async fn watch_location(&self) -> Result<PositionSubscription, DiscoveryError> {
        Ok(self.watch.subscribe().await?)
    }

    async fn locate(
        &self,
        deadline: Instant,
        force_refresh: bool,
    ) -> Result<GeoPosition, DiscoveryError> {
        let options = AcquireOptions {
            target: self.accuracy,
            force_refresh,
        };
        match tokio::time::timeout_at(deadline, self.acquirer.acquire(options)).await {
            Ok(position) => Ok(position?),
            Err(_) => {
                tracing::warn!("overall discovery timeout reached while locating");
                Err(DiscoveryError::TimedOut(self.config.global_search_timeout()))
            }
        }
    }

    async fn search_until(
        &self,
        origin: &GeoPosition,
        filters: &SearchFilters,
        deadline: Instant,
    ) -> SearchResult {
        if let Ok(result) = tokio::time::timeout_at(deadline, self.search(origin, filters)).await {
            result
        } else {
            tracing::warn!(
                timeout_ms = duration_millis(self.config.global_search_timeout()),
                "facility search exceeded the overall timeout; serving fallback data"
            );
            let fallback = FacilityQueryResult::fallback(origin);
            SearchResult {
                facilities: rank_facilities(fallback.facilities, filters),
                urgency_level: None,
                specializations: Vec::new(),
                recommendations: Vec::new(),
                degraded: true,
            }
        }
    }

    async fn search(&self, origin: &GeoPosition, filters: &SearchFilters) -> SearchResult {
        let radius = query_radius(filters);
        let key = CacheKey::new(origin.latitude, origin.longitude, radius, filters);

        let source = Arc::clone(&self.source);
        let query_origin = origin.clone();
        let query_filters = filters.clone();
        let mut result = self
            .results
            .get_or_compute(key, move || {
                async move {
                    let outcome = source.query(&query_origin, radius, &query_filters).await;
                    SearchResult {
                        facilities: rank_facilities(outcome.facilities, &query_filters),
                        urgency_level: None,
                        specializations: Vec::new(),
                        recommendations: Vec::new(),
                        degraded: outcome.degraded,
                    }
                }
                .boxed()
            })
            .await;

        // Shared and cached results may come from a nearby origin.
        for facility in &mut result.facilities {
            facility.anchor_to(origin.latitude, origin.longitude);
        }
        result.facilities = rank_facilities(result.facilities, filters);
        result
    }
}
