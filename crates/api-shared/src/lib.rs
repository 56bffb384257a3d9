//! # API Shared
//!
//! Shared wire definitions for the LabLink APIs.
//!
//! Contains:
//! - JSON request/response types (`wire` module), annotated for OpenAPI
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` on the server side and by `lablink-client` to decode responses.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
