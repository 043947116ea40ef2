//! HTTP adapters for the content store and the NLP service.

pub mod content_api;
pub mod error;
pub mod nlp_api;

pub use {
    content_api::ContentApiClient,
    error::{Error, Result},
    nlp_api::NlpApiClient,
};

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
