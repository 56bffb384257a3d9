//! Places-search proxy.
//!
//! Turns a [`LabSearchParams`] into a text-search call against the places upstream, applies the
//! local filters the upstream cannot express, enriches the survivors with contact details and
//! normalizes everything into [`LabSearchResult`]s.
//!
//! Failures are terminal for the request: there is no retry. A missing API key is reported as
//! [`LabError::Configuration`] and a non-2xx upstream status as [`LabError::Upstream`].

use crate::constants::{
    ALTERNATE_LAB_TERMS, CONTACT_FIELD_MASK, DEFAULT_LAB_QUERY, DETAIL_FIELD_MASK,
    PLACES_LANGUAGE_CODE, PLACES_PAGE_SIZE, SEARCH_FIELD_MASK,
};
use crate::enrich::{enrich_all, ContactDetails};
use crate::{
    CoreConfig, LabDetail, LabError, LabResult, LabSearchPage, LabSearchParams, LabSearchResult,
};
use lablink_types::GeoPoint;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

// ============================================================================
// Upstream wire model
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: String,
    language_code: &'static str,
    max_result_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_bias: Option<LocationBiasBody>,
}

#[derive(Debug, Serialize)]
struct LocationBiasBody {
    circle: CircleBody,
}

#[derive(Debug, Serialize)]
struct CircleBody {
    center: LatLngBody,
    radius: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLngBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<RawPlace>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlace {
    id: Option<String>,
    /// Resource name, `places/{id}`.
    name: Option<String>,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    location: Option<LatLngBody>,
    rating: Option<f64>,
    user_rating_count: Option<u32>,
    business_status: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    regular_opening_hours: Option<OpeningHours>,
    international_phone_number: Option<String>,
    national_phone_number: Option<String>,
    website_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    open_now: Option<bool>,
}

impl RawPlace {
    /// Normalizes into the local shape. Places with neither an id nor a resource name are
    /// unusable and yield `None`.
    fn into_result(self) -> Option<LabSearchResult> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.name
                    .as_deref()
                    .and_then(|n| n.rsplit('/').next())
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })?;

        let name = self
            .display_name
            .map(|d| d.text)
            .filter(|t| !t.is_empty())
            .or(self.name.filter(|n| !n.is_empty()))
            .unwrap_or_else(|| id.clone());

        Some(LabSearchResult {
            name,
            address: self.formatted_address.unwrap_or_default(),
            rating: self.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            review_count: self.user_rating_count.unwrap_or(0),
            location: self
                .location
                .and_then(|l| GeoPoint::new(l.latitude, l.longitude).ok()),
            open_now: self.regular_opening_hours.and_then(|h| h.open_now),
            business_status: self.business_status,
            types: self.types,
            phone: self
                .international_phone_number
                .or(self.national_phone_number)
                .filter(|p| !p.is_empty()),
            website: self.website_uri.filter(|w| !w.is_empty()),
            distance_km: None,
            id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

// ============================================================================
// Query construction and local filters
// ============================================================================

/// Builds the free-text query sent upstream.
///
/// The keyword (or a generic lab query) is scoped to the requested city/state within
/// `country`. Bias-only searches send the bare query and rely on the location circle.
pub fn build_text_query(params: &LabSearchParams, country: &str) -> String {
    let mut query = params
        .keyword
        .as_ref()
        .map(|k| k.to_string())
        .unwrap_or_else(|| DEFAULT_LAB_QUERY.to_string());

    match (&params.city, &params.state) {
        (Some(city), Some(state)) => query.push_str(&format!(" in {city}, {state}, {country}")),
        (_, Some(state)) => query.push_str(&format!(" in {state}, {country}")),
        (Some(city), None) => query.push_str(&format!(" in {city}, {country}")),
        (None, None) => {
            if params.near.is_some() {
                return query;
            }
            if !query.to_lowercase().contains(&country.to_lowercase()) {
                query.push_str(&format!(" in {country}"));
            }
        }
    }

    if params.keyword.is_none() {
        query.push_str(ALTERNATE_LAB_TERMS);
    }

    query
}

/// Applies the type, open-now and minimum-rating filters, preserving upstream order.
pub fn apply_filters(results: Vec<LabSearchResult>, params: &LabSearchParams) -> Vec<LabSearchResult> {
    let type_needle = params.place_type.as_ref().map(|t| t.as_str().to_lowercase());
    let min_rating = params.min_rating.filter(|r| *r > 0.0);

    results
        .into_iter()
        .filter(|lab| match &type_needle {
            Some(needle) => {
                lab.types.iter().any(|t| t.to_lowercase().contains(needle))
                    || lab.name.to_lowercase().contains(needle)
            }
            None => true,
        })
        .filter(|lab| !params.open_now || lab.open_now == Some(true))
        .filter(|lab| min_rating.map_or(true, |min| lab.rating >= min))
        .collect()
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the places upstream. Cheap to clone.
#[derive(Clone, Debug)]
pub struct PlacesClient {
    cfg: Arc<CoreConfig>,
    http: reqwest::Client,
}

impl PlacesClient {
    /// Creates a client honouring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Transport` if the HTTP client cannot be built (TLS backend failure).
    pub fn new(cfg: Arc<CoreConfig>) -> LabResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.upstream_timeout())
            .user_agent(concat!("lablink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { cfg, http })
    }

    /// Runs one search page: text search, local filters, contact enrichment.
    ///
    /// # Errors
    ///
    /// - `LabError::InvalidInput` for out-of-range parameters,
    /// - `LabError::Configuration` if no API key is configured,
    /// - `LabError::Upstream` if the upstream answers non-2xx,
    /// - `LabError::Transport`/`LabError::Decode` for network or payload failures.
    pub async fn search(&self, params: &LabSearchParams) -> LabResult<LabSearchPage> {
        params.validate()?;
        let api_key = self.cfg.places_api_key()?;

        let text_query = build_text_query(params, self.cfg.search_country());
        tracing::info!(query = %text_query, paged = params.page_token.is_some(), "places text search");

        let body = SearchTextRequest {
            text_query,
            language_code: PLACES_LANGUAGE_CODE,
            max_result_count: PLACES_PAGE_SIZE,
            page_token: params.page_token.as_deref(),
            location_bias: params
                .near
                .filter(|_| !params.has_area())
                .map(|bias| LocationBiasBody {
                    circle: CircleBody {
                        center: LatLngBody {
                            latitude: bias.center.latitude(),
                            longitude: bias.center.longitude(),
                        },
                        radius: bias.radius_m,
                    },
                }),
        };

        let response = self
            .http
            .post(format!("{}/v1/places:searchText", self.cfg.places_base_url()))
            .header(API_KEY_HEADER, api_key)
            .header(FIELD_MASK_HEADER, SEARCH_FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        let data: SearchTextResponse = read_json(response, "Failed to fetch places").await?;
        let upstream_count = data.places.len();

        let results: Vec<LabSearchResult> = data
            .places
            .into_iter()
            .filter_map(RawPlace::into_result)
            .collect();
        let results = apply_filters(results, params);
        tracing::debug!(upstream_count, kept = results.len(), "filtered places page");

        let results = enrich_all(results, |id| async move { self.contact_details(&id).await }).await;

        Ok(LabSearchPage {
            results,
            next_page_token: data.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Looks up one place and normalizes it as a lab detail record.
    ///
    /// Accepts either a bare place id or a `places/{id}` resource name.
    ///
    /// # Errors
    ///
    /// - `LabError::InvalidInput` for an empty id,
    /// - `LabError::Configuration` if no API key is configured,
    /// - `LabError::Upstream` if the upstream answers non-2xx,
    /// - `LabError::NotFound` if the upstream record has no usable id.
    pub async fn lab_details(&self, id: &str) -> LabResult<LabDetail> {
        let id = normalize_place_id(id)?;
        let place = self
            .get_place(id, DETAIL_FIELD_MASK, "Failed to fetch place details")
            .await?;
        let lab = place
            .into_result()
            .ok_or_else(|| LabError::NotFound(format!("place {id}")))?;
        Ok(LabDetail { lab })
    }

    async fn contact_details(&self, id: &str) -> LabResult<ContactDetails> {
        let place = self
            .get_place(id, CONTACT_FIELD_MASK, "Failed to fetch contact details")
            .await?;
        Ok(ContactDetails {
            phone: place
                .international_phone_number
                .or(place.national_phone_number)
                .filter(|p| !p.is_empty()),
            website: place.website_uri.filter(|w| !w.is_empty()),
        })
    }

    async fn get_place(
        &self,
        id: &str,
        field_mask: &str,
        failure: &str,
    ) -> LabResult<RawPlace> {
        let api_key = self.cfg.places_api_key()?;
        let response = self
            .http
            .get(format!(
                "{}/v1/places/{}",
                self.cfg.places_base_url(),
                urlencoding::encode(id)
            ))
            .header(API_KEY_HEADER, api_key)
            .header(FIELD_MASK_HEADER, field_mask)
            .send()
            .await?;
        read_json(response, failure).await
    }
}

fn normalize_place_id(id: &str) -> LabResult<&str> {
    let id = id.trim();
    let id = id.strip_prefix("places/").unwrap_or(id);
    if id.is_empty() {
        return Err(LabError::InvalidInput("Missing Lab ID".into()));
    }
    Ok(id)
}

/// Decodes a 2xx body, or turns a non-2xx response into `LabError::Upstream`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, failure: &str) -> LabResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<UpstreamErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        tracing::error!(status = status.as_u16(), "places upstream error: {detail}");
        return Err(LabError::Upstream {
            status: status.as_u16(),
            message: failure.to_string(),
        });
    }

    serde_json::from_str(&body).map_err(LabError::Decode)
}
