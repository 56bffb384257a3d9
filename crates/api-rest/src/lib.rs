//! # API REST
//!
//! REST API implementation for LabLink.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! Uses `api-shared` for wire types and `lablink-core` for everything else.

#![warn(rust_2018_idioms)]

mod error;

pub use error::{ApiError, ApiResult};

use api_shared::{
    BookingRes, CalendarLinksRes, CategoriesRes, CreateBookingReq, ErrorRes, HealthRes,
    HealthService, LabDetailRes, LabRecord, LabSearchRes, ListBookingsRes, ListPackagesRes,
    ListTestsRes, MedicalTestRes, PackageDetailRes, TestPackageRes,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use lablink_core::catalog::ALL_CATEGORIES;
use lablink_core::{
    filter_catalog, Booking, BookingRequest, BookingStore, Catalog, CategoryFilter, CoreConfig,
    GeoPoint, LabError, LabResult, LabSearchParams, LocationBias, NonEmptyText, PlacesClient,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

/// Application state for the REST API server
///
/// Shared by all request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub catalog: Arc<Catalog>,
    pub places: PlacesClient,
    pub bookings: Arc<dyn BookingStore>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns `LabError::Transport` if the places HTTP client cannot be built.
    pub fn new(
        cfg: Arc<CoreConfig>,
        catalog: Arc<Catalog>,
        bookings: Arc<dyn BookingStore>,
    ) -> LabResult<Self> {
        Ok(Self {
            places: PlacesClient::new(cfg.clone())?,
            cfg,
            catalog,
            bookings,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        search_labs,
        lab_details,
        list_tests,
        list_categories,
        list_packages,
        package_details,
        create_booking,
        list_bookings,
        booking_calendar,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        LabRecord,
        LabSearchRes,
        LabDetailRes,
        MedicalTestRes,
        TestPackageRes,
        ListTestsRes,
        ListPackagesRes,
        PackageDetailRes,
        CategoriesRes,
        CreateBookingReq,
        BookingRes,
        ListBookingsRes,
        CalendarLinksRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full router: API routes, Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    if !state.cfg.has_places_api_key() {
        tracing::warn!("no places API key configured, lab search will answer 500");
    }

    Router::new()
        .route("/health", get(health))
        .route("/labs/search", get(search_labs))
        .route("/labs/:id", get(lab_details))
        .route("/catalog/tests", get(list_tests))
        .route("/catalog/categories", get(list_categories))
        .route("/catalog/packages", get(list_packages))
        .route("/catalog/packages/:id", get(package_details))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id/calendar", get(booking_calendar))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ============================================================================
// Labs
// ============================================================================

/// Query string of `GET /labs/search`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LabSearchQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub keyword: Option<String>,
    /// Substring matched against place types and names.
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub open_now: Option<bool>,
    /// Minimum rating, `0` to `5`.
    pub rating: Option<f64>,
    #[serde(rename = "pageToken")]
    pub page_token: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Bias radius in metres, used with `lat`/`lng`.
    pub radius: Option<f64>,
}

impl LabSearchQuery {
    /// # Errors
    ///
    /// Returns `LabError::InvalidInput` if only one of `lat`/`lng` is given, and
    /// `LabError::Types` if they are out of range.
    pub fn into_search_params(self) -> LabResult<LabSearchParams> {
        let near = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                let mut bias = LocationBias::around(GeoPoint::new(lat, lng)?);
                if let Some(radius) = self.radius {
                    bias.radius_m = radius;
                }
                Some(bias)
            }
            (None, None) => None,
            _ => {
                return Err(LabError::InvalidInput(
                    "lat and lng must be given together".into(),
                ))
            }
        };

        let params = LabSearchParams {
            city: NonEmptyText::optional(self.city),
            state: NonEmptyText::optional(self.state),
            keyword: NonEmptyText::optional(self.keyword),
            place_type: NonEmptyText::optional(self.place_type),
            open_now: self.open_now.unwrap_or(false),
            min_rating: self.rating,
            near,
            page_token: self.page_token.filter(|t| !t.trim().is_empty()),
        };
        params.validate()?;
        Ok(params)
    }
}

#[utoipa::path(
    get,
    path = "/labs/search",
    params(LabSearchQuery),
    responses(
        (status = 200, description = "One page of labs", body = LabSearchRes),
        (status = 400, description = "Invalid query", body = ErrorRes),
        (status = 500, description = "Missing API key", body = ErrorRes),
        (status = 502, description = "Places upstream unreachable", body = ErrorRes)
    )
)]
/// Search labs through the places upstream
///
/// Results are in upstream order, filtered locally and enriched with contact details.
/// A non-2xx upstream status is passed through.
#[axum::debug_handler]
async fn search_labs(
    State(state): State<AppState>,
    Query(query): Query<LabSearchQuery>,
) -> ApiResult<Json<LabSearchRes>> {
    let params = query.into_search_params()?;
    let page = state.places.search(&params).await?;

    Ok(Json(LabSearchRes {
        labs: page.results.into_iter().map(LabRecord::from).collect(),
        next_page_token: page.next_page_token,
    }))
}

#[utoipa::path(
    get,
    path = "/labs/{id}",
    params(("id" = String, Path, description = "Place id")),
    responses(
        (status = 200, description = "Lab details", body = LabDetailRes),
        (status = 500, description = "Missing API key", body = ErrorRes)
    )
)]
/// Resolve one lab by place id
#[axum::debug_handler]
async fn lab_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LabDetailRes>> {
    let detail = state.places.lab_details(&id).await?;
    Ok(Json(detail.into()))
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTestsQuery {
    /// Category name, or `All`.
    pub category: Option<String>,
    /// Case-insensitive search over name and description.
    pub q: Option<String>,
    /// Comma-separated test ids offered by a lab.
    #[serde(rename = "labTests")]
    pub lab_tests: Option<String>,
}

#[utoipa::path(
    get,
    path = "/catalog/tests",
    params(ListTestsQuery),
    responses(
        (status = 200, description = "Filtered tests", body = ListTestsRes)
    )
)]
/// List catalog tests
#[axum::debug_handler]
async fn list_tests(
    State(state): State<AppState>,
    Query(query): Query<ListTestsQuery>,
) -> Json<ListTestsRes> {
    let offered = query.lab_tests.as_deref().map(|ids| {
        ids.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    });
    let source = match &offered {
        Some(ids) => state.catalog.tests_offered(ids),
        None => state.catalog.tests().to_vec(),
    };

    let category = CategoryFilter::parse(query.category.as_deref());
    let tests = filter_catalog(&source, &category, query.q.as_deref().unwrap_or(""));

    Json(ListTestsRes {
        tests: tests.into_iter().map(Into::into).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/catalog/categories",
    responses(
        (status = 200, description = "Test categories, led by All", body = CategoriesRes)
    )
)]
/// List test categories
#[axum::debug_handler]
async fn list_categories(State(state): State<AppState>) -> Json<CategoriesRes> {
    let categories = std::iter::once(ALL_CATEGORIES.to_string())
        .chain(state.catalog.categories())
        .collect();
    Json(CategoriesRes { categories })
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPackagesQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    /// Only popular packages.
    pub popular: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/catalog/packages",
    params(ListPackagesQuery),
    responses(
        (status = 200, description = "Filtered packages", body = ListPackagesRes)
    )
)]
/// List test packages
#[axum::debug_handler]
async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<ListPackagesQuery>,
) -> Json<ListPackagesRes> {
    let source = if query.popular.unwrap_or(false) {
        state.catalog.popular_packages()
    } else {
        state.catalog.packages().to_vec()
    };

    let category = CategoryFilter::parse(query.category.as_deref());
    let packages = filter_catalog(&source, &category, query.q.as_deref().unwrap_or(""));

    Json(ListPackagesRes {
        packages: packages.into_iter().map(Into::into).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/catalog/packages/{id}",
    params(("id" = String, Path, description = "Package id")),
    responses(
        (status = 200, description = "Package with its resolved tests", body = PackageDetailRes),
        (status = 404, description = "Unknown package", body = ErrorRes)
    )
)]
/// Show one package and the tests it bundles
#[axum::debug_handler]
async fn package_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PackageDetailRes>> {
    let package = state
        .catalog
        .package(&id)
        .ok_or_else(|| LabError::NotFound(format!("package '{id}'")))?;
    let tests = state.catalog.resolve_package(package);

    Ok(Json(PackageDetailRes {
        package: package.clone().into(),
        tests: tests.into_iter().map(Into::into).collect(),
    }))
}

// ============================================================================
// Bookings
// ============================================================================

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingReq,
    responses(
        (status = 201, description = "Booking created", body = BookingRes),
        (status = 400, description = "Invalid booking", body = ErrorRes),
        (status = 404, description = "Unknown test or package", body = ErrorRes)
    )
)]
/// Confirm a booking
///
/// Validates the selection against the catalog and stores it with status `pending`.
#[axum::debug_handler]
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingReq>,
) -> ApiResult<(StatusCode, Json<BookingRes>)> {
    let request = BookingRequest::try_from(req)?;
    let booking = Booking::confirm(request, &state.catalog, chrono::Utc::now())?;
    let res = BookingRes::from(&booking);
    state.bookings.insert(booking)?;

    Ok((StatusCode::CREATED, Json(res)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[utoipa::path(
    get,
    path = "/bookings",
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "The user's bookings, latest appointment first", body = ListBookingsRes)
    )
)]
/// List a user's bookings
#[axum::debug_handler]
async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Json<ListBookingsRes>> {
    let bookings = state.bookings.list_for_user(&query.user_id)?;
    Ok(Json(ListBookingsRes {
        bookings: bookings.iter().map(BookingRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}/calendar",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Calendar links for the appointment", body = CalendarLinksRes),
        (status = 400, description = "Malformed booking id", body = ErrorRes),
        (status = 404, description = "Unknown booking", body = ErrorRes)
    )
)]
/// Calendar links for a booking
#[axum::debug_handler]
async fn booking_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CalendarLinksRes>> {
    let uuid = Uuid::parse_str(&id)
        .map_err(|_| LabError::InvalidInput(format!("'{id}' is not a booking id")))?;
    let booking = state
        .bookings
        .get(uuid)?
        .ok_or_else(|| LabError::NotFound(format!("booking {uuid}")))?;

    let event = booking.calendar_event();
    Ok(Json(CalendarLinksRes {
        google: event.google_calendar_url(),
        outlook: event.outlook_calendar_url(),
        ics: event.to_ics(),
    }))
}
