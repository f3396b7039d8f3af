// Request-scoped values returned by the lookups and merged into a trace report

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

// Registered identity of a legal entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateRecord {
    pub lei: String,
    pub legal_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_address: Option<PostalAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headquarters_address: Option<PostalAddress>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// A `[longitude, latitude]` pair, serialised in GeoJSON order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates(pub f64, pub f64);

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// Swap into the `{lat, lng}` form the sea-route estimator takes.
    pub fn to_lat_lng(self) -> LatLng {
        LatLng {
            lat: self.lat(),
            lng: self.lon(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }
}

// Geocoded address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub display_name: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Searoutes,
    GreatCircle,
}

// Maritime leg estimate between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeaRoute {
    pub distance_km: f64,
    pub distance_nm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    pub source: RouteSource,
}

pub const KM_PER_NAUTICAL_MILE: f64 = 1.852;

impl SeaRoute {
    pub fn from_km(distance_km: f64, duration_hours: Option<f64>, source: RouteSource) -> Self {
        Self {
            distance_km,
            distance_nm: distance_km / KM_PER_NAUTICAL_MILE,
            duration_hours,
            source,
        }
    }
}

// Single tracking milestone of a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelEvent {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EventLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// JSON container a field falls back to when there is nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyShape {
    Mapping,
    Sequence,
}

pub trait ReportShape {
    const EMPTY: EmptyShape;
}

impl ReportShape for CorporateRecord {
    const EMPTY: EmptyShape = EmptyShape::Mapping;
}

impl ReportShape for GeoLocation {
    const EMPTY: EmptyShape = EmptyShape::Mapping;
}

impl ReportShape for SeaRoute {
    const EMPTY: EmptyShape = EmptyShape::Mapping;
}

impl<T> ReportShape for Vec<T> {
    const EMPTY: EmptyShape = EmptyShape::Sequence;
}

/// Outcome of one lookup as it appears in the report.
///
/// The JSON shape is only decided when serialising: `Found` emits the value,
/// `Absent` emits `{}` or `[]` depending on the field, and `Failed` emits
/// `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldResult<T> {
    Found(T),
    Absent,
    Failed(String),
}

impl<T> FieldResult<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => FieldResult::Found(value),
            None => FieldResult::Absent,
        }
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            FieldResult::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldResult::Absent)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FieldResult::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> Default for FieldResult<T> {
    fn default() -> Self {
        FieldResult::Absent
    }
}

impl<T: Serialize + ReportShape> Serialize for FieldResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldResult::Found(value) => value.serialize(serializer),
            FieldResult::Absent => match T::EMPTY {
                EmptyShape::Mapping => serializer.serialize_map(Some(0))?.end(),
                EmptyShape::Sequence => serializer.serialize_seq(Some(0))?.end(),
            },
            FieldResult::Failed(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}
