// src/lib.rs
// =============================================================================
// Library root for audiolink-preview.
//
// The AudioLink service decodes text out of audio; when that text is a URL,
// it wants a link preview (title, description, image) to show alongside it.
// Fetching an attacker-influenced URL from a server is a textbook SSRF
// vector, so everything in this crate is built around one rule: we only
// ever connect to addresses that are globally routable, and we re-check
// that rule at every step of a redirect chain.
//
// Module map:
// - error:   the failure taxonomy for a single fetch
// - safety:  address classification, DNS resolution, the URL safety guard
// - preview: redirect walking, HTML metadata extraction, the public service
//
// The binary in src/main.rs is a thin CLI shell over this library; the
// service boundary that embeds this crate calls
// `LinkMetadataService::fetch_metadata` and treats `None` as "no preview
// available".
// =============================================================================

pub mod error;
pub mod preview;
pub mod safety;

// Re-export the public API at the crate root so callers don't need to know
// about our internal module organization
pub use error::FetchError;
pub use preview::{LinkMetadataService, Metadata, PreviewConfig, MAX_REDIRECTS, METADATA_TIMEOUT_MS};
pub use safety::{classify, classify_ip, is_http_url, AddressRange, DnsResolver, ResolveHost, SafeUrlGuard};
