//! Constants used throughout the LabLink core crate.

/// Default root of the places upstream (no trailing slash).
pub const DEFAULT_PLACES_BASE_URL: &str = "https://places.googleapis.com";

/// Country appended to free-text place queries when none is configured.
pub const DEFAULT_SEARCH_COUNTRY: &str = "Nigeria";

/// Upstream request timeout when none is configured.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Query used when the caller gives no keyword.
pub const DEFAULT_LAB_QUERY: &str = "medical laboratory";

/// Widening clause appended to keyword-less queries.
pub const ALTERNATE_LAB_TERMS: &str = " OR diagnostic centre OR pathology laboratory";

/// Radius of a "near me" location bias when the caller does not give one.
pub const DEFAULT_BIAS_RADIUS_M: f64 = 5_000.0;

/// Page size requested from the places upstream.
pub const PLACES_PAGE_SIZE: u32 = 20;

pub const PLACES_LANGUAGE_CODE: &str = "en";

/// Field mask for text search. `nextPageToken` must be listed or the upstream drops it.
pub const SEARCH_FIELD_MASK: &str = "places.name,places.displayName,places.formattedAddress,places.id,places.location,places.rating,places.userRatingCount,places.businessStatus,places.types,places.regularOpeningHours.openNow,nextPageToken";

/// Field mask for the per-lab contact lookup used during enrichment.
pub const CONTACT_FIELD_MASK: &str = "internationalPhoneNumber,websiteUri";

/// Field mask for the full detail lookup behind `GET /labs/{id}`.
pub const DETAIL_FIELD_MASK: &str = "id,displayName,formattedAddress,location,rating,userRatingCount,businessStatus,types,regularOpeningHours,internationalPhoneNumber,websiteUri";

/// Source tag attached to lab details resolved from the places upstream.
pub const PLACES_SOURCE: &str = "google_places";

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Country calling code used when normalising local phone numbers for WhatsApp links.
pub const DEFAULT_COUNTRY_CALLING_CODE: &str = "234";
