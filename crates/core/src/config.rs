//! Core runtime configuration.
//!
//! This module defines configuration that is resolved once at process startup and then passed
//! into core services. Services never read process-wide environment variables while handling a
//! request, which keeps tests free to inject fixture keys and stub upstream URLs.

use crate::constants::{
    DEFAULT_PLACES_BASE_URL, DEFAULT_SEARCH_COUNTRY, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use crate::{LabError, LabResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    places_api_key: Option<String>,
    places_base_url: String,
    search_country: String,
    upstream_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A missing API key is accepted here: the proxy reports it per request as a
    /// configuration error so the rest of the service (catalog, bookings) stays usable.
    ///
    /// # Errors
    ///
    /// Returns `LabError::InvalidInput` if the base URL is not an http(s) URL, the country is
    /// blank, or the timeout is zero.
    pub fn new(
        places_api_key: Option<String>,
        places_base_url: String,
        search_country: String,
        upstream_timeout: Duration,
    ) -> LabResult<Self> {
        let places_base_url = places_base_url.trim().trim_end_matches('/').to_string();
        if !(places_base_url.starts_with("http://") || places_base_url.starts_with("https://")) {
            return Err(LabError::InvalidInput(format!(
                "places base URL must start with http:// or https://, got '{places_base_url}'"
            )));
        }

        let search_country = search_country.trim().to_string();
        if search_country.is_empty() {
            return Err(LabError::InvalidInput(
                "search country cannot be empty".into(),
            ));
        }

        if upstream_timeout.is_zero() {
            return Err(LabError::InvalidInput(
                "upstream timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            places_api_key: places_api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            places_base_url,
            search_country,
            upstream_timeout,
        })
    }

    /// Configuration with the given key and defaults for everything else.
    pub fn with_defaults(places_api_key: Option<String>) -> LabResult<Self> {
        Self::new(
            places_api_key,
            DEFAULT_PLACES_BASE_URL.into(),
            DEFAULT_SEARCH_COUNTRY.into(),
            Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    /// The places API key.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Configuration` when no key was configured.
    pub fn places_api_key(&self) -> LabResult<&str> {
        self.places_api_key
            .as_deref()
            .ok_or_else(|| LabError::Configuration("Missing API Key".into()))
    }

    pub fn has_places_api_key(&self) -> bool {
        self.places_api_key.is_some()
    }

    pub fn places_base_url(&self) -> &str {
        &self.places_base_url
    }

    pub fn search_country(&self) -> &str {
        &self.search_country
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }
}

/// Returns the first candidate that is present and not blank.
///
/// Used at startup to honour a preferred env var with legacy fallbacks.
pub fn first_non_blank(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Parse the upstream timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn upstream_timeout_from_env_value(value: Option<String>) -> LabResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS)),
        Some(v) => {
            let secs = v.parse::<u64>().map_err(|_| {
                LabError::InvalidInput(format!("upstream timeout must be whole seconds, got '{v}'"))
            })?;
            Ok(Duration::from_secs(secs))
        }
    }
}
