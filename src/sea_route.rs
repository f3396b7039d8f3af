// Sea-route estimation
// Searoutes when an API key is configured, great-circle distance otherwise

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::lookup::{ensure_success, join_url, LookupError, SeaRouteEstimator};
use crate::records::{LatLng, RouteSource, SeaRoute};

pub const DEFAULT_SEAROUTES_BASE_URL: &str = "https://api.searoutes.com";
pub const DEFAULT_CRUISE_SPEED_KNOTS: f64 = 14.0;

// IUGG mean Earth radius
const EARTH_RADIUS_KM: f64 = 6371.0088;

pub struct SearoutesEstimator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// GeoJSON FeatureCollection returned by /route/v2/sea
#[derive(Debug, Deserialize)]
struct RouteCollection {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    properties: RouteProperties,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    // metres
    distance: f64,
    // milliseconds
    duration: Option<f64>,
}

impl SearoutesEstimator {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn route_path(origin: LatLng, destination: LatLng) -> String {
        // Searoutes takes lon,lat pairs separated by ';'
        format!(
            "route/v2/sea/{},{};{},{}",
            origin.lng, origin.lat, destination.lng, destination.lat
        )
    }
}

#[async_trait]
impl SeaRouteEstimator for SearoutesEstimator {
    async fn estimate(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<SeaRoute, LookupError> {
        let url = join_url(&self.base_url, &Self::route_path(origin, destination));
        debug!(?origin, ?destination, "querying Searoutes");

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = ensure_success("searoutes", response).await?;

        let routes: RouteCollection = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(format!("searoutes: {}", e)))?;

        let properties = routes
            .features
            .into_iter()
            .next()
            .map(|feature| feature.properties)
            .ok_or_else(|| LookupError::Decode("searoutes: no route found".to_string()))?;

        Ok(SeaRoute::from_km(
            properties.distance / 1000.0,
            properties.duration.map(|ms| ms / 3_600_000.0),
            RouteSource::Searoutes,
        ))
    }

    fn name(&self) -> &'static str {
        "searoutes"
    }
}

/// Offline estimate used when no Searoutes key is available.
///
/// Distance is the haversine great-circle length, so it is a lower bound on
/// any real sailing route. Duration assumes a constant cruise speed.
pub struct GreatCircleEstimator {
    cruise_speed_knots: f64,
}

impl GreatCircleEstimator {
    pub fn new(cruise_speed_knots: f64) -> Self {
        Self { cruise_speed_knots }
    }
}

impl Default for GreatCircleEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CRUISE_SPEED_KNOTS)
    }
}

pub fn haversine_km(origin: LatLng, destination: LatLng) -> f64 {
    let (lat1, lat2) = (origin.lat.to_radians(), destination.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (destination.lng - origin.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[async_trait]
impl SeaRouteEstimator for GreatCircleEstimator {
    async fn estimate(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<SeaRoute, LookupError> {
        for (label, point) in [("origin", origin), ("destination", destination)] {
            if !point.is_valid() {
                return Err(LookupError::InvalidInput(format!(
                    "{} out of range: lat={}, lng={}",
                    label, point.lat, point.lng
                )));
            }
        }

        let mut route = SeaRoute::from_km(
            haversine_km(origin, destination),
            None,
            RouteSource::GreatCircle,
        );
        if self.cruise_speed_knots > 0.0 {
            route.duration_hours = Some(route.distance_nm / self.cruise_speed_knots);
        }
        Ok(route)
    }

    fn name(&self) -> &'static str {
        "great_circle"
    }
}
