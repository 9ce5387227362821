//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_council_api;

pub use http_council_api::{ApiClientConfig, HttpCouncilApi};
