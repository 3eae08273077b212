use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carefind_core::{
    EngineConfig, Facility, GeoPosition, OpeningHours, PositionSource, SearchFilters, SortBy,
    SpecializationId, UrgencyLevel,
};
use carefind_engine::{DiscoveryEngine, DiscoveryError, SearchSession};
use carefind_location::{LocationProvider, SensorError, StaticLocationProvider};
use carefind_overpass::{FacilityQueryResult, FacilitySource};
use carefind_triage::SymptomClassifier;

const ORIGIN_LAT: f64 = 12.9716;
const ORIGIN_LNG: f64 = 77.5946;

/// Serves a fixed set of facilities and counts backend queries.
struct CountingSource {
    calls: AtomicUsize,
    delay: Duration,
    degraded: bool,
    facilities: Vec<Facility>,
    seen_filters: Mutex<Vec<SearchFilters>>,
}

impl CountingSource {
    fn new(facilities: Vec<Facility>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            degraded: false,
            facilities,
            seen_filters: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FacilitySource for CountingSource {
    async fn query(
        &self,
        origin: &GeoPosition,
        _radius_meters: f64,
        filters: &SearchFilters,
    ) -> FacilityQueryResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filters.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut facilities = self.facilities.clone();
        for facility in &mut facilities {
            facility.anchor_to(origin.latitude, origin.longitude);
        }
        FacilityQueryResult {
            facilities,
            degraded: self.degraded,
            endpoint: (!self.degraded).then(|| "http://overpass.test/api".to_string()),
            skipped: Vec::new(),
        }
    }
}

struct DeniedProvider;

#[async_trait]
impl LocationProvider for DeniedProvider {
    async fn get_fix(
        &self,
        _high_accuracy: bool,
        _timeout: Duration,
    ) -> Result<GeoPosition, SensorError> {
        Err(SensorError::PermissionDenied)
    }
}

fn facility(id: &str, lat_offset: f64, rating: f64, specs: &[&str], emergency: bool) -> Facility {
    Facility {
        id: id.to_string(),
        name: format!("Facility {id}"),
        address: "MG Road".to_string(),
        latitude: ORIGIN_LAT + lat_offset,
        longitude: ORIGIN_LNG,
        phone: None,
        specializations: specs.iter().map(|s| SpecializationId::new(s)).collect::<BTreeSet<_>>(),
        rating,
        review_count: 10,
        opening_hours: OpeningHours::unknown(),
        emergency_services: emergency,
        distance_meters: 0.0,
    }
}

fn sample_facilities() -> Vec<Facility> {
    vec![
        facility("osm:node/1", 0.002, 4.5, &["general_medicine"], false),
        facility("osm:node/2", 0.010, 3.8, &["cardiology", "emergency_medicine"], true),
        facility("osm:node/3", 0.005, 4.1, &["dermatology"], false),
    ]
}

fn engine_with(source: Arc<CountingSource>, config: EngineConfig) -> DiscoveryEngine {
    DiscoveryEngine::new(
        config,
        Arc::new(StaticLocationProvider::new(ORIGIN_LAT, ORIGIN_LNG, 10.0)),
        source,
        SymptomClassifier::default(),
    )
}

fn origin(lat: f64, lng: f64) -> GeoPosition {
    GeoPosition::new(lat, lng, 10.0, PositionSource::Gps).unwrap()
}

#[tokio::test]
async fn identical_searches_query_backend_once() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    let first = engine.find_nearby_facilities(SearchFilters::default()).await.unwrap();
    let second = engine.find_nearby_facilities(SearchFilters::default()).await.unwrap();

    assert_eq!(source.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(engine.result_cache().stats().hits, 1);
    let ids: Vec<&str> = first.facilities.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["osm:node/1", "osm:node/3", "osm:node/2"]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_searches_share_one_query() {
    let mut source = CountingSource::new(sample_facilities());
    source.delay = Duration::from_millis(500);
    let source = Arc::new(source);
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());
    let here = origin(ORIGIN_LAT, ORIGIN_LNG);

    let (a, b) = tokio::join!(
        engine.find_nearby_facilities_at(&here, SearchFilters::default()),
        engine.find_nearby_facilities_at(&here, SearchFilters::default()),
    );

    assert_eq!(source.calls(), 1);
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(engine.result_cache().stats().coalesced, 1);
}

#[tokio::test]
async fn degraded_results_are_not_cached() {
    let mut source = CountingSource::new(sample_facilities());
    source.degraded = true;
    let source = Arc::new(source);
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());
    let here = origin(ORIGIN_LAT, ORIGIN_LNG);

    let result = engine
        .find_nearby_facilities_at(&here, SearchFilters::default())
        .await
        .unwrap();
    assert!(result.degraded);
    engine
        .find_nearby_facilities_at(&here, SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(source.calls(), 2);
    assert!(engine.result_cache().is_empty());
}

#[tokio::test]
async fn cached_result_is_reanchored_to_new_origin() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    // Both origins round to the same cache cell.
    let first = engine
        .find_nearby_facilities_at(&origin(ORIGIN_LAT, ORIGIN_LNG), SearchFilters::default())
        .await
        .unwrap();
    let nearby = origin(ORIGIN_LAT + 0.00003, ORIGIN_LNG);
    let second = engine
        .find_nearby_facilities_at(&nearby, SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(source.calls(), 1);
    let before = first.facilities.iter().find(|f| f.id == "osm:node/1").unwrap();
    let after = second.facilities.iter().find(|f| f.id == "osm:node/1").unwrap();
    assert!(after.distance_meters < before.distance_meters);
    let expected = carefind_core::haversine_distance_meters(
        nearby.latitude,
        nearby.longitude,
        after.latitude,
        after.longitude,
    );
    assert!((after.distance_meters - expected).abs() < 1e-9);
}

#[tokio::test]
async fn different_filters_are_cached_separately() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());
    let here = origin(ORIGIN_LAT, ORIGIN_LNG);

    engine
        .find_nearby_facilities_at(&here, SearchFilters::default())
        .await
        .unwrap();
    let rated = engine
        .find_nearby_facilities_at(
            &here,
            SearchFilters {
                min_rating: 4.0,
                sort_by: SortBy::Rating,
                ..SearchFilters::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(source.calls(), 2);
    let ids: Vec<&str> = rated.facilities.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["osm:node/1", "osm:node/3"]);
}

#[tokio::test]
async fn invalid_filters_fail_before_any_query() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    let err = engine
        .find_nearby_facilities(SearchFilters {
            limit: 0,
            ..SearchFilters::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::InvalidFilters(_)));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn permission_denied_is_reported() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = DiscoveryEngine::new(
        EngineConfig::default(),
        Arc::new(DeniedProvider),
        Arc::clone(&source) as Arc<dyn FacilitySource>,
        SymptomClassifier::default(),
    );

    let err = engine
        .find_nearby_facilities(SearchFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::Location(carefind_location::LocationError::PermissionDenied)
    ));
    assert_eq!(source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn global_timeout_serves_degraded_fallback() {
    let mut source = CountingSource::new(sample_facilities());
    source.delay = Duration::from_secs(60);
    let source = Arc::new(source);
    let config = EngineConfig {
        global_search_timeout_ms: 1_000,
        ..EngineConfig::default()
    };
    let engine = engine_with(Arc::clone(&source), config);

    let result = engine.find_nearby_facilities(SearchFilters::default()).await.unwrap();

    assert!(result.degraded);
    assert!(!result.facilities.is_empty());
    assert!(result.facilities.iter().all(|f| f.id.starts_with("fallback:")));
    assert!(engine.result_cache().is_empty());
    assert_eq!(engine.result_cache().in_flight(), 0);
}

#[tokio::test]
async fn emergency_symptoms_force_emergency_filter() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    let result = engine
        .classify_and_search(
            "severe chest pain, can't breathe",
            "en",
            SearchFilters {
                sort_by: SortBy::Rating,
                ..SearchFilters::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.urgency_level, Some(UrgencyLevel::Emergency));
    let seen = source.seen_filters.lock().unwrap();
    assert!(seen[0].emergency_only);
    assert_eq!(seen[0].sort_by, SortBy::Distance);
    assert_eq!(result.facilities.len(), 1);
    assert!(result.facilities[0].emergency_services);
    assert!(result
        .specializations
        .iter()
        .any(|s| s.id.as_str() == "cardiology"));
    assert!(!result.recommendations.is_empty());
}

#[tokio::test]
async fn inferred_specialization_narrows_results() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    let result = engine
        .classify_and_search("itchy rash on my arm", "en", SearchFilters::default())
        .await
        .unwrap();

    let ids: Vec<&str> = result.facilities.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["osm:node/3"]);
    assert_eq!(result.specializations[0].id.as_str(), "dermatology");
}

#[tokio::test]
async fn empty_specialization_match_retries_without_it() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    let result = engine
        .classify_and_search("toothache since yesterday", "en", SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(result.facilities.len(), 3);
    assert_eq!(source.calls(), 2);
    let seen = source.seen_filters.lock().unwrap();
    assert!(seen[0].specialization_id.is_some());
    assert!(seen[1].specialization_id.is_none());
    assert_eq!(result.specializations[0].id.as_str(), "dentistry");
}

#[tokio::test]
async fn refresh_location_invalidates_cached_results() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(Arc::clone(&source), EngineConfig::default());

    engine.find_nearby_facilities(SearchFilters::default()).await.unwrap();
    assert_eq!(engine.result_cache().len(), 1);

    engine.refresh_location().await.unwrap();
    assert!(engine.result_cache().is_empty());

    engine.find_nearby_facilities(SearchFilters::default()).await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn watch_location_streams_provider_positions() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = engine_with(source, EngineConfig::default());

    let mut subscription = engine.watch_location().await.unwrap();
    let fix = subscription.next().await.unwrap();
    assert!((fix.latitude - ORIGIN_LAT).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn superseded_session_search_yields_nothing() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = Arc::new(engine_with(Arc::clone(&source), EngineConfig::default()));
    let session = SearchSession::with_debounce(engine, Duration::from_millis(300));

    let (stale, fresh) = tokio::join!(
        session.search(SearchFilters::default()),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session
                .search(SearchFilters {
                    min_rating: 4.0,
                    ..SearchFilters::default()
                })
                .await
        },
    );

    assert!(stale.unwrap().is_none());
    let fresh = fresh.unwrap().unwrap();
    assert_eq!(fresh.facilities.len(), 2);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_session_search_yields_nothing() {
    let source = Arc::new(CountingSource::new(sample_facilities()));
    let engine = Arc::new(engine_with(Arc::clone(&source), EngineConfig::default()));
    let session = SearchSession::new(engine);

    let (outcome, ()) = tokio::join!(session.search(SearchFilters::default()), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.cancel();
    });

    assert!(outcome.unwrap().is_none());
    assert_eq!(source.calls(), 0);
    assert_eq!(session.generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_running_query_resolves_promptly() {
    let mut source = CountingSource::new(sample_facilities());
    source.delay = Duration::from_secs(20);
    let source = Arc::new(source);
    let engine = Arc::new(engine_with(Arc::clone(&source), EngineConfig::default()));
    let session = SearchSession::with_debounce(Arc::clone(&engine), Duration::from_millis(400));

    let started = tokio::time::Instant::now();
    let (outcome, ()) = tokio::join!(session.search(SearchFilters::default()), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.cancel();
    });

    assert!(outcome.unwrap().is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(source.calls(), 1);
    assert_eq!(engine.result_cache().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn newer_search_stops_the_running_one() {
    let mut source = CountingSource::new(sample_facilities());
    source.delay = Duration::from_secs(5);
    let source = Arc::new(source);
    let engine = Arc::new(engine_with(Arc::clone(&source), EngineConfig::default()));
    let session = SearchSession::with_debounce(engine, Duration::from_millis(100));

    let started = tokio::time::Instant::now();
    let (stale, fresh) = tokio::join!(
        async {
            let outcome = session.search(SearchFilters::default()).await;
            (outcome, started.elapsed())
        },
        async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            session
                .search(SearchFilters {
                    min_rating: 4.0,
                    ..SearchFilters::default()
                })
                .await
        },
    );

    let (stale, stale_resolved_at) = stale;
    assert!(stale.unwrap().is_none());
    assert!(stale_resolved_at < Duration::from_secs(2));
    assert_eq!(fresh.unwrap().unwrap().facilities.len(), 2);
    assert_eq!(source.calls(), 2);
}
