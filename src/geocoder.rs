// Address geocoding backed by OpenStreetMap Nominatim

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::lookup::{ensure_success, join_url, Geocoder, LookupError};
use crate::records::{Coordinates, GeoLocation};

pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

// One hit of /search?format=jsonv2; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    category: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
}

impl TryFrom<NominatimPlace> for GeoLocation {
    type Error = LookupError;

    fn try_from(place: NominatimPlace) -> Result<Self, Self::Error> {
        let lon = parse_degrees("lon", &place.lon)?;
        let lat = parse_degrees("lat", &place.lat)?;
        Ok(GeoLocation {
            display_name: place.display_name,
            coordinates: Coordinates::new(lon, lat),
            category: place.category,
            place_type: place.place_type,
        })
    }
}

fn parse_degrees(field: &str, raw: &str) -> Result<f64, LookupError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LookupError::Decode(format!("nominatim: bad {} value {:?}", field, raw)))
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode_address(&self, address: &str) -> Result<Option<GeoLocation>, LookupError> {
        let url = join_url(&self.base_url, "search");
        debug!(address, "querying Nominatim");

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;
        let response = ensure_success("nominatim", response).await?;

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(format!("nominatim: {}", e)))?;

        places.into_iter().next().map(GeoLocation::try_from).transpose()
    }
}
