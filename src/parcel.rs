// Parcel tracking backed by the EasyPost trackers API

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::lookup::{excerpt, join_url, LookupError, ParcelTracker};
use crate::records::{EventLocation, ParcelEvent};

pub const DEFAULT_EASYPOST_BASE_URL: &str = "https://api.easypost.com/v2";

pub struct EasyPostTracker {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tracker {
    carrier: Option<String>,
    #[serde(default)]
    tracking_details: Vec<TrackingDetail>,
}

#[derive(Debug, Deserialize)]
struct TrackingDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    datetime: Option<String>,
    tracking_location: Option<TrackingLocation>,
}

#[derive(Debug, Deserialize)]
struct TrackingLocation {
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl TrackingLocation {
    fn into_event_location(self) -> Option<EventLocation> {
        let location = EventLocation {
            city: non_blank(self.city),
            state: non_blank(self.state),
            country: non_blank(self.country),
            zip: non_blank(self.zip),
        };
        if location == EventLocation::default() {
            None
        } else {
            Some(location)
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Tracker {
    fn into_events(self) -> Vec<ParcelEvent> {
        let carrier = self.carrier;
        self.tracking_details
            .into_iter()
            .map(|detail| ParcelEvent {
                status: detail.status,
                message: detail.message.unwrap_or_default(),
                datetime: detail.datetime.as_deref().and_then(parse_timestamp),
                location: detail
                    .tracking_location
                    .and_then(TrackingLocation::into_event_location),
                carrier: carrier.clone(),
            })
            .collect()
    }
}

impl EasyPostTracker {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ParcelTracker for EasyPostTracker {
    async fn track_parcel(&self, tracking_code: &str) -> Result<Vec<ParcelEvent>, LookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("EASYPOST_API_KEY"))?;
        let url = join_url(&self.base_url, "trackers");
        debug!(tracking_code, "creating EasyPost tracker");

        let response = self
            .client
            .post(&url)
            .basic_auth(api_key, None::<&str>)
            .json(&json!({ "tracker": { "tracking_code": tracking_code } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // 4xx carries a human-readable reason worth passing through
            if status.is_client_error() {
                if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
                    return Err(LookupError::Rejected(envelope.error.message));
                }
            }
            return Err(LookupError::Status {
                service: "easypost",
                status_code: status.as_u16(),
                message: excerpt(&body, 200),
            });
        }

        let tracker: Tracker = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(format!("easypost: {}", e)))?;
        Ok(tracker.into_events())
    }
}
