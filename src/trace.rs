// Trace orchestration: fan one request out to the four lookups and merge the results
//
// Registry and geocoding failures abort the trace. Sea-route and parcel failures
// are folded into their own field, each with its own message policy.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::DispatchMode;
use crate::lookup::{Geocoder, LookupError, ParcelTracker, RegistryLookup, SeaRouteEstimator};
use crate::records::{CorporateRecord, FieldResult, GeoLocation, ParcelEvent, SeaRoute};

/// Message reported in `sea_leg` whenever estimation fails, whatever the cause.
pub const SEA_ROUTE_FAILURE: &str = "Sea\u{2011}route estimation failed.";

// Query parameters of one trace; empty strings count as not supplied
#[derive(Debug, Clone, Default)]
pub struct TraceQuery {
    pub company: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub tracking: Option<String>,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl TraceQuery {
    pub fn company(&self) -> Option<&str> {
        supplied(&self.company)
    }

    pub fn origin(&self) -> Option<&str> {
        supplied(&self.origin)
    }

    pub fn destination(&self) -> Option<&str> {
        supplied(&self.destination)
    }

    pub fn tracking(&self) -> Option<&str> {
        supplied(&self.tracking)
    }
}

// Always carries all five fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceReport {
    pub corporate_record: FieldResult<CorporateRecord>,
    pub origin: FieldResult<GeoLocation>,
    pub destination: FieldResult<GeoLocation>,
    pub sea_leg: FieldResult<SeaRoute>,
    pub parcel_events: FieldResult<Vec<ParcelEvent>>,
}

// Failures that are not absorbed into the report
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Registry lookup failed: {0}")]
    Registry(#[source] LookupError),

    #[error("Geocoding {which} failed: {source}")]
    Geocoding {
        which: &'static str,
        #[source]
        source: LookupError,
    },
}

pub struct TraceService {
    registry: Arc<dyn RegistryLookup>,
    geocoder: Arc<dyn Geocoder>,
    sea_routes: Arc<dyn SeaRouteEstimator>,
    parcels: Arc<dyn ParcelTracker>,
    dispatch: DispatchMode,
}

impl TraceService {
    pub fn new(
        registry: Arc<dyn RegistryLookup>,
        geocoder: Arc<dyn Geocoder>,
        sea_routes: Arc<dyn SeaRouteEstimator>,
        parcels: Arc<dyn ParcelTracker>,
    ) -> Self {
        Self {
            registry,
            geocoder,
            sea_routes,
            parcels,
            dispatch: DispatchMode::default(),
        }
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn dispatch(&self) -> DispatchMode {
        self.dispatch
    }

    pub fn sea_route_estimator(&self) -> &'static str {
        self.sea_routes.name()
    }

    pub async fn trace(&self, query: &TraceQuery) -> Result<TraceReport, TraceError> {
        let span = info_span!("trace", dispatch = %self.dispatch);

        async move {
            match self.dispatch {
                DispatchMode::Sequential => self.trace_sequential(query).await,
                DispatchMode::Concurrent => self.trace_concurrent(query).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn trace_sequential(&self, query: &TraceQuery) -> Result<TraceReport, TraceError> {
        let corporate_record = self.corporate_record(query.company()).await?;
        let origin = self.locate("origin", query.origin()).await?;
        let destination = self.locate("destination", query.destination()).await?;
        let sea_leg = self.sea_leg(&origin, &destination).await;
        let parcel_events = self.parcel_events(query.tracking()).await;

        Ok(TraceReport {
            corporate_record,
            origin,
            destination,
            sea_leg,
            parcel_events,
        })
    }

    async fn trace_concurrent(&self, query: &TraceQuery) -> Result<TraceReport, TraceError> {
        // Tracker POSTs create state upstream, so it only runs once nothing can abort the trace
        let (corporate_record, origin, destination) = futures::try_join!(
            self.corporate_record(query.company()),
            self.locate("origin", query.origin()),
            self.locate("destination", query.destination())
        )?;
        let (sea_leg, parcel_events) = futures::join!(
            self.sea_leg(&origin, &destination),
            self.parcel_events(query.tracking())
        );

        Ok(TraceReport {
            corporate_record,
            origin,
            destination,
            sea_leg,
            parcel_events,
        })
    }

    async fn corporate_record(
        &self,
        company: Option<&str>,
    ) -> Result<FieldResult<CorporateRecord>, TraceError> {
        let Some(company) = company else {
            return Ok(FieldResult::Absent);
        };
        debug!(company, "looking up corporate record");
        self.registry
            .lookup_company(company)
            .await
            .map(FieldResult::from_option)
            .map_err(TraceError::Registry)
    }

    async fn locate(
        &self,
        which: &'static str,
        address: Option<&str>,
    ) -> Result<FieldResult<GeoLocation>, TraceError> {
        let Some(address) = address else {
            return Ok(FieldResult::Absent);
        };
        debug!(which, address, "geocoding");
        self.geocoder
            .geocode_address(address)
            .await
            .map(FieldResult::from_option)
            .map_err(|source| TraceError::Geocoding { which, source })
    }

    async fn sea_leg(
        &self,
        origin: &FieldResult<GeoLocation>,
        destination: &FieldResult<GeoLocation>,
    ) -> FieldResult<SeaRoute> {
        let (Some(origin), Some(destination)) = (origin.found(), destination.found()) else {
            return FieldResult::Absent;
        };

        // Geocoder hands out [lon, lat]; the estimator takes {lat, lng}
        let from = origin.coordinates.to_lat_lng();
        let to = destination.coordinates.to_lat_lng();
        debug!(estimator = self.sea_routes.name(), ?from, ?to, "estimating sea leg");

        match self.sea_routes.estimate(from, to).await {
            Ok(route) => FieldResult::Found(route),
            Err(err) => {
                warn!(estimator = self.sea_routes.name(), error = %err, "sea-route estimation failed");
                FieldResult::Failed(SEA_ROUTE_FAILURE.to_string())
            }
        }
    }

    async fn parcel_events(&self, tracking_code: Option<&str>) -> FieldResult<Vec<ParcelEvent>> {
        let Some(tracking_code) = tracking_code else {
            return FieldResult::Absent;
        };
        debug!(tracking_code, "tracking parcel");

        match self.parcels.track_parcel(tracking_code).await {
            Ok(events) => FieldResult::Found(events),
            Err(err) => {
                warn!(tracking_code, error = %err, "parcel tracking failed");
                FieldResult::Failed(err.to_string())
            }
        }
    }
}
