#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

use shipment_trace::records::{PostalAddress, RouteSource};
use shipment_trace::{
    router, Coordinates, CorporateRecord, GeoLocation, Geocoder, LatLng, LookupError,
    ParcelEvent, ParcelTracker, RegistryLookup, SeaRoute, SeaRouteEstimator, TraceService,
};

// Scripted lookups that record what they were asked

#[derive(Default)]
pub struct MockRegistry {
    pub record: Option<CorporateRecord>,
    pub failure: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RegistryLookup for MockRegistry {
    async fn lookup_company(&self, name: &str) -> Result<Option<CorporateRecord>, LookupError> {
        self.calls.lock().push(name.to_string());
        match &self.failure {
            Some(message) => Err(LookupError::Network(message.clone())),
            None => Ok(self.record.clone()),
        }
    }
}

#[derive(Default)]
pub struct MockGeocoder {
    pub places: HashMap<String, GeoLocation>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode_address(&self, address: &str) -> Result<Option<GeoLocation>, LookupError> {
        self.calls.lock().push(address.to_string());
        Ok(self.places.get(address).cloned())
    }
}

#[derive(Default)]
pub struct MockEstimator {
    pub failure: Option<String>,
    pub calls: Mutex<Vec<(LatLng, LatLng)>>,
}

#[async_trait]
impl SeaRouteEstimator for MockEstimator {
    async fn estimate(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<SeaRoute, LookupError> {
        self.calls.lock().push((origin, destination));
        match &self.failure {
            Some(message) => Err(LookupError::Decode(message.clone())),
            None => Ok(sea_route()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Default)]
pub struct MockTracker {
    pub events: Vec<ParcelEvent>,
    pub failure: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ParcelTracker for MockTracker {
    async fn track_parcel(&self, tracking_code: &str) -> Result<Vec<ParcelEvent>, LookupError> {
        self.calls.lock().push(tracking_code.to_string());
        match &self.failure {
            Some(message) => Err(LookupError::Rejected(message.clone())),
            None => Ok(self.events.clone()),
        }
    }
}

pub struct Mocks {
    pub registry: Arc<MockRegistry>,
    pub geocoder: Arc<MockGeocoder>,
    pub estimator: Arc<MockEstimator>,
    pub tracker: Arc<MockTracker>,
}

impl Mocks {
    // All four lookups succeed
    pub fn succeeding() -> Self {
        Self {
            registry: Arc::new(MockRegistry {
                record: Some(acme()),
                ..Default::default()
            }),
            geocoder: Arc::new(MockGeocoder {
                places: HashMap::from([
                    ("Rotterdam".to_string(), rotterdam()),
                    ("Singapore".to_string(), singapore()),
                ]),
                ..Default::default()
            }),
            estimator: Arc::new(MockEstimator::default()),
            tracker: Arc::new(MockTracker {
                events: parcel_events(),
                ..Default::default()
            }),
        }
    }

    pub fn service(&self) -> TraceService {
        TraceService::new(
            self.registry.clone(),
            self.geocoder.clone(),
            self.estimator.clone(),
            self.tracker.clone(),
        )
    }

    pub fn app(&self, debug: bool) -> axum::Router {
        router(Arc::new(self.service()), debug)
    }
}

pub fn acme() -> CorporateRecord {
    CorporateRecord {
        lei: "5493001KJTIIGC8Y1R12".to_string(),
        legal_name: "ACME CORPORATION".to_string(),
        jurisdiction: Some("US-DE".to_string()),
        entity_status: Some("ACTIVE".to_string()),
        registration_status: Some("ISSUED".to_string()),
        legal_address: Some(PostalAddress {
            lines: vec!["1209 Orange Street".to_string()],
            city: Some("Wilmington".to_string()),
            region: Some("US-DE".to_string()),
            country: Some("US".to_string()),
            postal_code: Some("19801".to_string()),
        }),
        headquarters_address: None,
    }
}

pub fn rotterdam() -> GeoLocation {
    GeoLocation {
        display_name: "Rotterdam, South Holland, Netherlands".to_string(),
        coordinates: Coordinates::new(4.47917, 51.9225),
        category: Some("boundary".to_string()),
        place_type: Some("administrative".to_string()),
    }
}

pub fn singapore() -> GeoLocation {
    GeoLocation {
        display_name: "Singapore".to_string(),
        coordinates: Coordinates::new(103.8198, 1.3521),
        category: Some("place".to_string()),
        place_type: Some("city".to_string()),
    }
}

pub fn sea_route() -> SeaRoute {
    SeaRoute::from_km(15_400.0, Some(550.0), RouteSource::Searoutes)
}

pub fn parcel_events() -> Vec<ParcelEvent> {
    vec![
        ParcelEvent {
            status: "pre_transit".to_string(),
            message: "Pre-Shipment Info Sent to USPS".to_string(),
            datetime: None,
            location: None,
            carrier: Some("USPS".to_string()),
        },
        ParcelEvent {
            status: "in_transit".to_string(),
            message: "Picked up".to_string(),
            datetime: None,
            location: None,
            carrier: Some("USPS".to_string()),
        },
    ]
}

pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("Failed to parse JSON body")
    };
    (status, value)
}
