//! Lab search domain types.
//!
//! A [`LabSearchResult`] is transient: it is built fresh from each upstream page, possibly
//! enriched and ranked, and then handed to the caller. Nothing here is persisted.

use crate::constants::{DEFAULT_BIAS_RADIUS_M, PLACES_SOURCE};
use crate::contact;
use crate::{LabError, LabResult};
use api_shared::{LabDetailRes, LabRecord};
use lablink_types::{GeoPoint, NonEmptyText};

/// One lab returned by a search.
#[derive(Clone, Debug, PartialEq)]
pub struct LabSearchResult {
    /// External place identifier, unique within a search session.
    pub id: String,
    pub name: String,
    /// Formatted postal address; empty when the upstream has none.
    pub address: String,
    /// Rating in `[0, 5]`, `0.0` when unrated.
    pub rating: f64,
    pub review_count: u32,
    /// `None` when the upstream reported no coordinates.
    pub location: Option<GeoPoint>,
    /// `None` when opening hours are unknown.
    pub open_now: Option<bool>,
    pub business_status: Option<String>,
    pub types: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Distance from the user, set only by the distance ranker.
    pub distance_km: Option<f64>,
}

impl LabSearchResult {
    /// Minimal result with only an id and a name; every other field empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            rating: 0.0,
            review_count: 0,
            location: None,
            open_now: None,
            business_status: None,
            types: Vec::new(),
            phone: None,
            website: None,
            distance_km: None,
        }
    }

    /// True when a detail lookup could still add a phone number or website.
    pub fn needs_enrichment(&self) -> bool {
        self.phone.is_none() || self.website.is_none()
    }
}

impl From<LabSearchResult> for LabRecord {
    fn from(lab: LabSearchResult) -> Self {
        LabRecord {
            id: lab.id,
            name: lab.name,
            formatted_address: lab.address,
            rating: lab.rating,
            user_ratings_total: lab.review_count,
            latitude: lab.location.map(|p| p.latitude()),
            longitude: lab.location.map(|p| p.longitude()),
            open_now: lab.open_now,
            business_status: lab.business_status,
            types: lab.types,
            phone_number: lab.phone,
            website: lab.website,
            distance_km: lab.distance_km,
        }
    }
}

impl From<LabRecord> for LabSearchResult {
    fn from(rec: LabRecord) -> Self {
        LabSearchResult {
            id: rec.id,
            name: rec.name,
            address: rec.formatted_address,
            rating: rec.rating,
            review_count: rec.user_ratings_total,
            location: GeoPoint::from_parts(rec.latitude, rec.longitude),
            open_now: rec.open_now,
            business_status: rec.business_status,
            types: rec.types,
            phone: rec.phone_number,
            website: rec.website,
            distance_km: rec.distance_km,
        }
    }
}

/// Normalized single-lab record resolved from the places upstream.
#[derive(Clone, Debug, PartialEq)]
pub struct LabDetail {
    pub lab: LabSearchResult,
}

impl From<LabDetail> for LabDetailRes {
    fn from(detail: LabDetail) -> Self {
        let lab = detail.lab;
        let whatsapp_url = lab
            .phone
            .as_deref()
            .and_then(|phone| contact::whatsapp_link(phone, None));

        LabDetailRes {
            id: lab.id,
            name: lab.name,
            address: lab.address,
            rating: lab.rating,
            user_ratings_total: lab.review_count,
            latitude: lab.location.map(|p| p.latitude()),
            longitude: lab.location.map(|p| p.longitude()),
            open_now: lab.open_now,
            status: lab.business_status,
            types: lab.types,
            phone: lab.phone,
            website: lab.website,
            whatsapp_url,
            tests: Vec::new(),
            source: PLACES_SOURCE.to_string(),
        }
    }
}

/// A circle the upstream should prefer results from ("near me" searches).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationBias {
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl LocationBias {
    pub fn around(center: GeoPoint) -> Self {
        Self {
            center,
            radius_m: DEFAULT_BIAS_RADIUS_M,
        }
    }
}

/// Parameters of one lab search.
///
/// `page_token` selects a continuation page; all other fields must be identical to the
/// request that produced the token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabSearchParams {
    pub city: Option<NonEmptyText>,
    pub state: Option<NonEmptyText>,
    pub keyword: Option<NonEmptyText>,
    /// Substring matched against place types and the display name.
    pub place_type: Option<NonEmptyText>,
    pub open_now: bool,
    pub min_rating: Option<f64>,
    pub near: Option<LocationBias>,
    pub page_token: Option<String>,
}

impl LabSearchParams {
    /// City/state search, the common case.
    pub fn in_area(city: Option<&str>, state: Option<&str>) -> Self {
        Self {
            city: NonEmptyText::optional(city),
            state: NonEmptyText::optional(state),
            ..Self::default()
        }
    }

    /// Free-text search with no location.
    pub fn keyword(keyword: &str) -> Self {
        Self {
            keyword: NonEmptyText::optional(Some(keyword)),
            ..Self::default()
        }
    }

    pub fn near(center: GeoPoint) -> Self {
        Self {
            near: Some(LocationBias::around(center)),
            ..Self::default()
        }
    }

    /// Same query, continued at `token`.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// True when the query names a city or state.
    pub fn has_area(&self) -> bool {
        self.city.is_some() || self.state.is_some()
    }

    /// Validates numeric inputs.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidInput` if the minimum rating is outside `[0, 5]` (or NaN), or
    /// the bias radius is not a positive finite number.
    pub fn validate(&self) -> LabResult<()> {
        if let Some(rating) = self.min_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(LabError::InvalidInput(format!(
                    "rating must be between 0 and 5, got {rating}"
                )));
            }
        }

        if let Some(bias) = &self.near {
            if !(bias.radius_m.is_finite() && bias.radius_m > 0.0) {
                return Err(LabError::InvalidInput(
                    "radius must be a positive number of metres".into(),
                ));
            }
        }

        Ok(())
    }

    /// Encodes the parameters as `/labs/search` query pairs.
    ///
    /// Absent and falsy values are left out, so an empty `LabSearchParams` yields no pairs.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(city) = &self.city {
            pairs.push(("city", city.to_string()));
        }
        if let Some(state) = &self.state {
            pairs.push(("state", state.to_string()));
        }
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.to_string()));
        }
        if let Some(place_type) = &self.place_type {
            pairs.push(("type", place_type.to_string()));
        }
        if self.open_now {
            pairs.push(("open_now", "true".into()));
        }
        if let Some(rating) = self.min_rating.filter(|r| *r > 0.0) {
            pairs.push(("rating", rating.to_string()));
        }
        if let Some(bias) = &self.near {
            pairs.push(("lat", bias.center.latitude().to_string()));
            pairs.push(("lng", bias.center.longitude().to_string()));
            pairs.push(("radius", bias.radius_m.to_string()));
        }
        if let Some(token) = &self.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        pairs
    }
}

/// One page of search results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabSearchPage {
    pub results: Vec<LabSearchResult>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagos() -> GeoPoint {
        GeoPoint::new(6.5244, 3.3792).expect("valid point")
    }

    #[test]
    fn record_conversion_keeps_unknown_location_absent() {
        let lab = LabSearchResult::new("p1", "Synlab");
        let rec = LabRecord::from(lab.clone());
        assert_eq!(rec.latitude, None);
        assert_eq!(rec.longitude, None);
        assert_eq!(LabSearchResult::from(rec), lab);
    }

    #[test]
    fn record_conversion_carries_location() {
        let mut lab = LabSearchResult::new("p1", "Synlab");
        lab.location = Some(lagos());
        let rec = LabRecord::from(lab);
        assert_eq!(rec.latitude, Some(6.5244));
        assert_eq!(rec.longitude, Some(3.3792));
    }

    #[test]
    fn needs_enrichment_until_both_contact_fields_present() {
        let mut lab = LabSearchResult::new("p1", "Synlab");
        assert!(lab.needs_enrichment());
        lab.phone = Some("+234 1 000 0000".into());
        assert!(lab.needs_enrichment());
        lab.website = Some("https://synlab.ng".into());
        assert!(!lab.needs_enrichment());
    }

    #[test]
    fn detail_response_adds_whatsapp_link_and_source() {
        let mut lab = LabSearchResult::new("p1", "Synlab");
        lab.phone = Some("0803 123 4567".into());
        let res = LabDetailRes::from(LabDetail { lab });
        assert_eq!(res.source, "google_places");
        assert_eq!(res.whatsapp_url.as_deref(), Some("https://wa.me/2348031234567"));
        assert!(res.tests.is_empty());
    }

    #[test]
    fn validate_rejects_bad_rating_and_radius() {
        let mut params = LabSearchParams {
            min_rating: Some(5.5),
            ..LabSearchParams::default()
        };
        assert!(matches!(params.validate(), Err(LabError::InvalidInput(_))));

        params.min_rating = Some(f64::NAN);
        assert!(params.validate().is_err());

        params.min_rating = Some(4.0);
        params.near = Some(LocationBias {
            center: lagos(),
            radius_m: 0.0,
        });
        assert!(params.validate().is_err());

        params.near = Some(LocationBias::around(lagos()));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn query_pairs_skip_absent_values() {
        assert!(LabSearchParams::default().to_query_pairs().is_empty());

        let params = LabSearchParams {
            open_now: true,
            min_rating: Some(4.0),
            ..LabSearchParams::in_area(Some("Ikeja"), Some("Lagos"))
        }
        .with_page_token("tok");

        assert_eq!(
            params.to_query_pairs(),
            vec![
                ("city", "Ikeja".to_string()),
                ("state", "Lagos".to_string()),
                ("open_now", "true".to_string()),
                ("rating", "4".to_string()),
                ("pageToken", "tok".to_string()),
            ]
        );
    }

    #[test]
    fn in_area_treats_blank_city_as_absent() {
        let params = LabSearchParams::in_area(Some(""), Some("Lagos"));
        assert!(params.city.is_none());
        assert!(params.has_area());
    }
}
