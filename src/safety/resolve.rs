// src/safety/resolve.rs
// =============================================================================
// This module turns hostnames into IP addresses.
//
// Two rules matter for safety:
// - A hostname that is itself an IP literal (including bracketed IPv6 like
//   [::1]) resolves to exactly that address, without any DNS lookup.
// - A real lookup returns EVERY address the name advertises (A and AAAA),
//   not just the first one. The guard rejects the whole host if any single
//   address is unsafe, so it needs the full set.
//
// Resolution failure is not an error here - it yields an empty set, and the
// guard treats an empty set as unsafe.
//
// The ResolveHost trait is the seam that lets tests substitute a fixed
// lookup table for the real resolver.
// =============================================================================

use std::future::Future;
use std::net::IpAddr;

use anyhow::Result;
use hickory_resolver::TokioResolver;

// Resolves a hostname to the set of addresses it advertises
//
// Implementations return an empty Vec when the name does not resolve;
// callers decide what that means (the guard: unsafe).
pub trait ResolveHost {
    /// Resolve a hostname to every address it advertises, or empty on failure
    fn resolve(&self, host: &str) -> impl Future<Output = Vec<IpAddr>> + Send;
}

// The production resolver, backed by the system DNS configuration
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioResolver,
}

impl DnsResolver {
    /// Build a resolver from the system DNS configuration
    pub fn new() -> Result<Self> {
        let resolver = TokioResolver::builder_tokio()?.build();
        Ok(Self { resolver })
    }
}

impl ResolveHost for DnsResolver {
    async fn resolve(&self, host: &str) -> Vec<IpAddr> {
        // IPv6 literals arrive in URL form with brackets ([::1])
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        // IP literals bypass DNS entirely
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return vec![ip];
        }

        match self.resolver.lookup_ip(bare).await {
            Ok(response) => response.iter().collect(),
            Err(_) => Vec::new(),
        }
    }
}
