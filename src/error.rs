// src/error.rs
// =============================================================================
// The failure taxonomy for a single preview fetch.
//
// Every way a fetch can stop short of producing metadata has a named
// variant here. None of these ever crosses the public boundary as an
// error: `LinkMetadataService::fetch_metadata` collapses all of them into
// `None` ("no preview available") so a hostile or broken link can never
// fail the request that carried it.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - Struct variants: each failure carries the context that explains it
// =============================================================================

use thiserror::Error;

/// Why a preview fetch produced no metadata
#[derive(Debug, Error)]
pub enum FetchError {
    /// The input did not parse as a URL, or used a scheme other than
    /// http/https
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The hostname is blocklisted, resolved to nothing, or resolved to at
    /// least one address outside the globally routable range
    #[error("unsafe address for '{host}': {reason}")]
    UnsafeAddress { host: String, reason: String },

    /// A redirect pointed at a URL this fetch already visited
    #[error("redirect loop: '{url}' was already visited")]
    RedirectLoop { url: String },

    /// The chain needed more than the allowed number of redirects
    #[error("too many redirects (limit {max})")]
    RedirectLimitExceeded { max: usize },

    /// The final response was not HTML, so there is nothing to extract
    #[error("final response is not HTML (content-type '{content_type}')")]
    NonHtmlContent { content_type: String },

    /// Non-success status, connection failure, or a malformed response
    #[error("upstream failure: {message}")]
    UpstreamFailure { message: String },

    /// The shared deadline elapsed before the fetch finished
    #[error("fetch timed out after {ms} ms")]
    Timeout { ms: u64 },
}
