//! # LabLink Client
//!
//! Client-side lab search state: the paged result list a lab finder screen renders, kept
//! consistent across overlapping searches and "load more" requests.
//!
//! The network side is behind [`LabSearchBackend`]; [`HttpLabSearchBackend`] talks to the
//! LabLink REST service.

#![warn(rust_2018_idioms)]

mod backend;
mod error;
mod phase;
mod search;

pub use backend::{HttpLabSearchBackend, LabSearchBackend};
pub use error::{ClientError, ClientResult};
pub use phase::{SearchEvent, SearchPhase};
pub use search::{LabSearch, LabSearchState};
