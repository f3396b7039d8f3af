// Shipment trace service: one request fanned out to registry, geocoding,
// sea-route and parcel lookups, merged into a single report

pub mod config;
pub mod geocoder;
pub mod logging;
pub mod lookup;
pub mod parcel;
pub mod records;
pub mod registry;
pub mod sea_route;
pub mod server;
pub mod trace;

// Re-export key types for convenience
pub use config::{AppConfig, ConfigError, DispatchMode};
pub use logging::init_logging;
pub use lookup::{Geocoder, LookupError, ParcelTracker, RegistryLookup, SeaRouteEstimator};
pub use records::{
    Coordinates, CorporateRecord, FieldResult, GeoLocation, LatLng, ParcelEvent, SeaRoute,
};
pub use server::{build_trace_service, router, run};
pub use trace::{TraceError, TraceQuery, TraceReport, TraceService, SEA_ROUTE_FAILURE};
