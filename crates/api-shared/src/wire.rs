//! JSON wire types for the REST API.
//!
//! Field names follow what existing front-end consumers already read: lab search items are
//! snake_case (`formatted_address`, `user_ratings_total`) while catalog and booking payloads
//! are camelCase. Do not rename fields without coordinating with those consumers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Labs
// ============================================================================

/// One lab in a search response.
///
/// `latitude`/`longitude` are omitted when the upstream did not report a location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub user_ratings_total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_status: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabSearchRes {
    pub labs: Vec<LabRecord>,
    #[serde(
        rename = "nextPageToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_page_token: Option<String>,
}

/// Normalized single-lab record returned by `GET /labs/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabDetailRes {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub user_ratings_total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_url: Option<String>,
    /// Offered tests; always empty for labs resolved from the places upstream.
    pub tests: Vec<String>,
    pub source: String,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalTestRes {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub preparation: String,
    pub sample_type: String,
    pub turnaround_time: String,
    pub common_uses: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestPackageRes {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tests: Vec<String>,
    pub popular: bool,
    pub estimated_price: u64,
    pub discount: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListTestsRes {
    pub tests: Vec<MedicalTestRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPackagesRes {
    pub packages: Vec<TestPackageRes>,
}

/// A package together with the tests it resolves to.
///
/// Ids in `package.tests` that are not in the catalog are absent from `tests`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageDetailRes {
    pub package: TestPackageRes,
    pub tests: Vec<MedicalTestRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoriesRes {
    pub categories: Vec<String>,
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingReq {
    pub user_id: String,
    /// `test` or `package`.
    pub item_kind: String,
    pub item_id: String,
    pub lab_id: String,
    pub lab_name: String,
    #[serde(default)]
    pub lab_address: String,
    /// RFC 3339 timestamp of the appointment.
    pub scheduled_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRes {
    pub id: String,
    pub user_id: String,
    pub item_kind: String,
    pub item_id: String,
    pub item_name: String,
    pub lab_id: String,
    pub lab_name: String,
    pub lab_address: String,
    pub price: u64,
    pub scheduled_at: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListBookingsRes {
    pub bookings: Vec<BookingRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalendarLinksRes {
    pub google: String,
    pub outlook: String,
    pub ics: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_search_res_uses_camel_case_token() {
        let res = LabSearchRes {
            labs: vec![],
            next_page_token: Some("abc".into()),
        };
        let json = serde_json::to_value(&res).expect("serialize");
        assert_eq!(json["nextPageToken"], "abc");
    }

    #[test]
    fn lab_search_res_omits_missing_token() {
        let res = LabSearchRes {
            labs: vec![],
            next_page_token: None,
        };
        let json = serde_json::to_string(&res).expect("serialize");
        assert_eq!(json, r#"{"labs":[]}"#);
    }

    #[test]
    fn lab_record_tolerates_sparse_payload() {
        let rec: LabRecord =
            serde_json::from_str(r#"{"id":"p1","name":"Clina Lancet"}"#).expect("parse");
        assert_eq!(rec.rating, 0.0);
        assert_eq!(rec.latitude, None);
        assert!(rec.types.is_empty());
    }
}
