// src/safety/mod.rs
// =============================================================================
// This module decides whether a URL is safe to fetch from the server side.
//
// Submodules:
// - classify: sorts IP addresses into ranges; only globally routable
//   addresses are fetchable
// - resolve:  turns hostnames into the full set of addresses they advertise
// - guard:    combines scheme checks, a hostname blocklist, resolution and
//   classification into a single yes/no safety decision
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod classify;
mod guard;
mod resolve;

// Re-export public items from submodules
// This lets users write `safety::classify()` instead of
// `safety::classify::classify()`
pub use classify::{classify, classify_ip, AddressRange};
pub use guard::{is_http_url, SafeUrlGuard};
pub use resolve::{DnsResolver, ResolveHost};
