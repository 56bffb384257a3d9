//! # LabLink Core
//!
//! Core business logic for the LabLink lab finder.
//!
//! This crate contains the data operations behind the service:
//! - Lab search against the places upstream, with local filters and contact enrichment
//! - Distance ranking of results around the user
//! - The medical test and package catalog
//! - Booking confirmation, storage and calendar links
//!
//! **No API concerns**: HTTP servers and handlers belong in `api-rest`; wire types live in
//! `api-shared`.

pub mod booking;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod contact;
pub mod distance;
pub mod enrich;
pub mod error;
pub mod lab;
pub mod places;

pub use booking::{
    BookedItem, BookedLab, Booking, BookingRequest, BookingStatus, BookingStore,
    InMemoryBookingStore, ItemKind,
};
pub use calendar::CalendarEvent;
pub use catalog::{filter_catalog, Catalog, CatalogEntry, CategoryFilter, MedicalTest, TestPackage};
pub use config::CoreConfig;
pub use contact::whatsapp_link;
pub use distance::{haversine_km, rank_by_distance};
pub use enrich::{enrich_all, ContactDetails};
pub use error::{LabError, LabResult};
pub use lab::{LabDetail, LabSearchPage, LabSearchParams, LabSearchResult, LocationBias};
pub use places::PlacesClient;

pub use lablink_types::{GeoPoint, NonEmptyText};
