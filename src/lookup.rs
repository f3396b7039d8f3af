// External lookups the trace orchestrator fans out to
// Each one is a trait so the orchestrator can run against any backend

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::records::{CorporateRecord, GeoLocation, LatLng, ParcelEvent, SeaRoute};

// Errors raised by a lookup backend
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} returned {status_code}: {message}")]
    Status {
        service: &'static str,
        status_code: u16,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    // Upstream refused the request; its own message is kept as-is
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait RegistryLookup: Send + Sync + 'static {
    // Ok(None) when no entity matches the name
    async fn lookup_company(&self, name: &str) -> Result<Option<CorporateRecord>, LookupError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync + 'static {
    // Ok(None) when the address text resolves to nothing
    async fn geocode_address(&self, address: &str) -> Result<Option<GeoLocation>, LookupError>;
}

#[async_trait]
pub trait SeaRouteEstimator: Send + Sync + 'static {
    async fn estimate(&self, origin: LatLng, destination: LatLng)
        -> Result<SeaRoute, LookupError>;

    // Short name for logs
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ParcelTracker: Send + Sync + 'static {
    async fn track_parcel(&self, tracking_code: &str) -> Result<Vec<ParcelEvent>, LookupError>;
}

// Settings shared by every HTTP-backed lookup
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub fn build_http_client(settings: &HttpSettings) -> Result<reqwest::Client, LookupError> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.timeout_ms))
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|e| LookupError::Network(format!("Failed to create HTTP client: {}", e)))
}

// Turns a non-2xx response into LookupError::Status, keeping a bounded body excerpt
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, LookupError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(LookupError::Status {
        service,
        status_code: status.as_u16(),
        message: excerpt(&body, 200),
    })
}

pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
