// src/preview/mod.rs
// =============================================================================
// This module turns a safe URL into preview metadata.
//
// Submodules:
// - follow:  walks a redirect chain by hand, re-checking safety at each hop
// - extract: pulls title/description/image out of the final HTML document
// - service: owns the HTTP client and the guard, applies the shared
//   deadline, and exposes the public fetch operations
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod extract;
mod follow;
mod service;

// Re-export public items from submodules
pub use extract::{extract, Metadata};
pub use follow::MAX_REDIRECTS;
pub use service::{LinkMetadataService, PreviewConfig, METADATA_TIMEOUT_MS};

// The error taxonomy lives at the crate root; re-export it here so
// `preview::FetchError` works too
pub use crate::error::FetchError;
