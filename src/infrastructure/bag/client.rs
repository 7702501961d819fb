//! BAG (Basisregistratie Adressen en Gebouwen) address API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::application::ports::{AddressLookupError, AddressLookupPort};
use crate::domain::{Address, AddressQuery, Coordinates};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the BAG API.
#[derive(Debug, Clone)]
pub struct BagClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// [`AddressLookupPort`] backed by the BAG "individuele bevragingen" API.
pub struct BagClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BagClient {
    pub fn new(config: BagClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.is_empty()),
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/hal+json");
        match &self.api_key {
            Some(key) => builder.header("X-Api-Key", key),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AddressLookupError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?params, "BAG request");

        let response = self
            .request(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                AddressLookupError::Unavailable(reason)
            })?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| AddressLookupError::Unavailable(format!("invalid response: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%url, "BAG API rejected the API key");
                Err(AddressLookupError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(AddressLookupError::NotFound),
            status => Err(AddressLookupError::Unavailable(format!(
                "unexpected status {status}"
            ))),
        }
    }

    /// Coordinates of the residential object an address refers to.
    async fn coordinates(&self, object_href: &str) -> Option<Coordinates> {
        let object_id = object_href.rsplit('/').next().filter(|id| !id.is_empty())?;
        let endpoint = format!("verblijfsobjecten/{object_id}");
        match self.get_json::<ResidentialObject>(&endpoint, &[]).await {
            Ok(object) => object.coordinates(),
            Err(e) => {
                debug!(object_id, error = %e, "No coordinates for address");
                None
            }
        }
    }
}

#[async_trait]
impl AddressLookupPort for BagClient {
    async fn lookup(&self, query: &AddressQuery) -> Result<Address, AddressLookupError> {
        let mut params = vec![
            ("postcode", query.postcode.as_str()),
            ("huisnummer", query.house_number.as_str()),
        ];
        if let Some(letter) = &query.house_letter {
            params.push(("huisletter", letter.as_str()));
        }
        if let Some(addition) = &query.house_number_addition {
            params.push(("huisnummertoevoeging", addition.as_str()));
        }

        let body: AddressSearch = self.get_json("adressen", &params).await?;
        let Some(found) = body.embedded.and_then(|e| e.adressen.into_iter().next()) else {
            return Err(AddressLookupError::NotFound);
        };

        let coordinates = match found.object_href() {
            Some(href) => self.coordinates(href).await,
            None => None,
        };

        info!(
            postcode = %query.postcode,
            house_number = %query.house_number,
            municipality = found.municipality_name.as_deref().unwrap_or(""),
            "Address found"
        );
        Ok(found.into_address(query, coordinates))
    }

    async fn health_check(&self) -> bool {
        match self
            .request(&self.base_url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            // the API root answers 404 when it is up
            Ok(response) => matches!(response.status(), StatusCode::OK | StatusCode::NOT_FOUND),
            Err(e) => {
                debug!(error = %e, "BAG health check failed");
                false
            }
        }
    }
}

// ── Wire types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddressSearch {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedAddresses>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedAddresses {
    #[serde(default)]
    adressen: Vec<BagAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BagAddress {
    postcode: Option<String>,
    huisnummer: Option<i64>,
    huisletter: Option<String>,
    huisnummertoevoeging: Option<String>,
    #[serde(rename = "openbareRuimteNaam")]
    street_name: Option<String>,
    #[serde(rename = "woonplaatsNaam")]
    place_name: Option<String>,
    #[serde(rename = "gemeenteNaam")]
    municipality_name: Option<String>,
    #[serde(rename = "_links")]
    links: Option<AddressLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressLinks {
    adresseert_verblijfsobject: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct ResidentialObject {
    geometrie: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lng, lat]`
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl ResidentialObject {
    fn coordinates(&self) -> Option<Coordinates> {
        match self.geometrie.as_ref()?.coordinates.as_slice() {
            [lng, lat, ..] => Some(Coordinates {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }
}

impl BagAddress {
    fn object_href(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .adresseert_verblijfsobject
            .as_ref()
            .map(|link| link.href.as_str())
    }

    fn into_address(self, query: &AddressQuery, coordinates: Option<Coordinates>) -> Address {
        Address {
            postcode: self
                .postcode
                .unwrap_or_else(|| query.postcode.to_string()),
            house_number: self
                .huisnummer
                .map(|n| n.to_string())
                .unwrap_or_else(|| query.house_number.clone()),
            house_letter: self.huisletter.or_else(|| query.house_letter.clone()),
            house_number_addition: self
                .huisnummertoevoeging
                .or_else(|| query.house_number_addition.clone()),
            street: self.street_name.unwrap_or_default(),
            city: self.place_name.unwrap_or_default(),
            municipality: self.municipality_name,
            coordinates,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
