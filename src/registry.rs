// Corporate registry lookup backed by the GLEIF LEI records API

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::lookup::{ensure_success, join_url, LookupError, RegistryLookup};
use crate::records::{CorporateRecord, PostalAddress};

pub const DEFAULT_GLEIF_BASE_URL: &str = "https://api.gleif.org/api/v1";

pub struct GleifRegistry {
    client: reqwest::Client,
    base_url: String,
}

// JSON:API envelope returned by /lei-records
#[derive(Debug, Deserialize)]
struct LeiRecordsPage {
    #[serde(default)]
    data: Vec<LeiRecord>,
}

#[derive(Debug, Deserialize)]
struct LeiRecord {
    id: String,
    attributes: LeiAttributes,
}

#[derive(Debug, Deserialize)]
struct LeiAttributes {
    lei: Option<String>,
    entity: LeiEntity,
    registration: Option<LeiRegistration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeiEntity {
    legal_name: LeiName,
    jurisdiction: Option<String>,
    status: Option<String>,
    legal_address: Option<LeiAddress>,
    headquarters_address: Option<LeiAddress>,
}

#[derive(Debug, Deserialize)]
struct LeiName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LeiRegistration {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeiAddress {
    #[serde(default)]
    address_lines: Vec<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
}

impl From<LeiAddress> for PostalAddress {
    fn from(address: LeiAddress) -> Self {
        PostalAddress {
            lines: address.address_lines,
            city: address.city,
            region: address.region,
            country: address.country,
            postal_code: address.postal_code,
        }
    }
}

impl From<LeiRecord> for CorporateRecord {
    fn from(record: LeiRecord) -> Self {
        let attributes = record.attributes;
        let entity = attributes.entity;
        CorporateRecord {
            lei: attributes.lei.unwrap_or(record.id),
            legal_name: entity.legal_name.name,
            jurisdiction: entity.jurisdiction,
            entity_status: entity.status,
            registration_status: attributes.registration.and_then(|r| r.status),
            legal_address: entity.legal_address.map(PostalAddress::from),
            headquarters_address: entity.headquarters_address.map(PostalAddress::from),
        }
    }
}

impl GleifRegistry {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RegistryLookup for GleifRegistry {
    async fn lookup_company(&self, name: &str) -> Result<Option<CorporateRecord>, LookupError> {
        let url = join_url(&self.base_url, "lei-records");
        debug!(company = name, "querying GLEIF");

        let response = self
            .client
            .get(&url)
            .query(&[("filter[entity.legalName]", name), ("page[size]", "1")])
            .header(reqwest::header::ACCEPT, "application/vnd.api+json")
            .send()
            .await?;
        let response = ensure_success("gleif", response).await?;

        let page: LeiRecordsPage = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(format!("gleif: {}", e)))?;

        Ok(page.data.into_iter().next().map(CorporateRecord::from))
    }
}
