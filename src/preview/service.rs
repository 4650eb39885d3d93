// src/preview/service.rs
// =============================================================================
// This module is the public face of the crate: LinkMetadataService.
//
// The service owns everything one fetch needs - the HTTP client (built once,
// redirects disabled, fixed headers) and the safety guard - and is an
// explicitly constructed object handed to whoever needs previews. There is
// no global instance and no shared mutable state: concurrent fetches each
// own their visited set and their deadline.
//
// The deadline is armed ONCE per operation, around the whole redirect walk
// and body read. A slow chain cannot stretch the budget by spending 4.9
// seconds per hop; the whole fetch shares the same 5000 ms.
//
// Two entry points:
// - fetch()          -> Result<Metadata, FetchError>, with the reason
// - fetch_metadata() -> Option<Metadata>, the boundary contract: every
//   failure is logged and becomes None ("no preview available")
// =============================================================================

use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{redirect, Client};

use super::extract::{extract, Metadata};
use super::follow::{RedirectFollower, MAX_REDIRECTS};
use crate::error::FetchError;
use crate::safety::{DnsResolver, ResolveHost, SafeUrlGuard};

/// Budget for one whole fetch operation, redirects included
pub const METADATA_TIMEOUT_MS: u64 = 5_000;

// Fixed outbound headers; existing callers and tests match on these exactly
const USER_AGENT: &str = "AudioLink/1.0 (+https://github.com/ggerganov/ggwave)";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

// Settings for a service instance
//
// The defaults ARE the contract; overriding them is for tests (shorter
// timeouts, a permissive guard for a loopback mock server).
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Shared deadline for one whole fetch
    pub timeout: Duration,
    /// Redirect hop limit
    pub max_redirects: usize,
    /// Test-only: skip blocklist/resolution/classification in the guard
    pub allow_unsafe_hosts: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(METADATA_TIMEOUT_MS),
            max_redirects: MAX_REDIRECTS,
            allow_unsafe_hosts: false,
        }
    }
}

// Fetches link preview metadata without letting the server be used as a
// proxy into internal networks
#[derive(Clone)]
pub struct LinkMetadataService<R = DnsResolver> {
    client: Client,
    guard: SafeUrlGuard<R>,
    config: PreviewConfig,
}

impl LinkMetadataService<DnsResolver> {
    /// Service with the system resolver and the contract defaults
    pub fn new() -> Result<Self> {
        Self::with_config(PreviewConfig::default())
    }

    /// Service with the system resolver and custom settings
    pub fn with_config(config: PreviewConfig) -> Result<Self> {
        Self::with_resolver(DnsResolver::new()?, config)
    }
}

impl<R: ResolveHost> LinkMetadataService<R> {
    /// Service with a custom resolver (the seam tests use)
    pub fn with_resolver(resolver: R, config: PreviewConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        // Automatic redirects stay off: the follower validates every hop
        // itself before requesting it
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .build()?;

        let guard = SafeUrlGuard::new(resolver).allow_unsafe_hosts(config.allow_unsafe_hosts);

        Ok(Self {
            client,
            guard,
            config,
        })
    }

    // Fetch with the failure reason, under the shared deadline
    pub async fn fetch(&self, url: &str) -> Result<Metadata, FetchError> {
        let ms = self.config.timeout.as_millis() as u64;
        // One timer for the whole operation. When it fires, whatever network
        // call is in flight is dropped and the fetch fails closed
        tokio::time::timeout(self.config.timeout, self.walk_and_extract(url))
            .await
            .unwrap_or(Err(FetchError::Timeout { ms }))
    }

    // The public boundary operation: any failure means "no preview"
    pub async fn fetch_metadata(&self, url: &str) -> Option<Metadata> {
        match self.fetch(url).await {
            Ok(metadata) => Some(metadata),
            Err(FetchError::Timeout { .. }) => {
                eprintln!("Warning: metadata fetch timed out for {}", url);
                None
            }
            Err(e) => {
                eprintln!("Warning: unable to fetch metadata for {}: {}", url, e);
                None
            }
        }
    }

    async fn walk_and_extract(&self, url: &str) -> Result<Metadata, FetchError> {
        let follower = RedirectFollower::new(&self.client, &self.guard, self.config.max_redirects);
        let page = follower.follow(url).await?;
        Ok(extract(&page.html, page.url.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The guard never consults the resolver when allow_unsafe_hosts is on,
    // and the strict test below wants an empty answer anyway
    struct NullResolver;

    impl ResolveHost for NullResolver {
        async fn resolve(&self, _host: &str) -> Vec<IpAddr> {
            Vec::new()
        }
    }

    fn test_service(timeout_ms: u64) -> LinkMetadataService<NullResolver> {
        LinkMetadataService::with_resolver(
            NullResolver,
            PreviewConfig {
                timeout: Duration::from_millis(timeout_ms),
                max_redirects: MAX_REDIRECTS,
                allow_unsafe_hosts: true,
            },
        )
        .unwrap()
    }

    fn og_page(title: &str) -> String {
        format!(
            r#"<html><head>
                <meta property="og:title" content="{title}">
                <meta property="og:description" content="A description.">
                <meta property="og:image" content="https://cdn.example.com/img.png">
            </head><body></body></html>"#
        )
    }

    fn html_response(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
    }

    fn redirect_to(location: &str) -> ResponseTemplate {
        ResponseTemplate::new(302).insert_header("location", location)
    }

    #[tokio::test]
    async fn test_fetch_extracts_metadata_from_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(html_response(og_page("Hello")))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let metadata = service
            .fetch_metadata(&format!("{}/article", server.uri()))
            .await
            .expect("should produce a preview");

        assert_eq!(metadata.url, format!("{}/article", server.uri()));
        assert_eq!(metadata.title.as_deref(), Some("Hello"));
        assert_eq!(metadata.description.as_deref(), Some("A description."));
        assert_eq!(
            metadata.image.as_deref(),
            Some("https://cdn.example.com/img.png")
        );
    }

    #[tokio::test]
    async fn test_redirect_chain_within_limit_ends_on_final_url() {
        let server = MockServer::start().await;
        // Five redirects, then the page - exactly the limit
        for i in 1..=5 {
            let target = if i == 5 {
                "/final".to_string()
            } else {
                format!("/r{}", i + 1)
            };
            Mock::given(method("GET"))
                .and(path(format!("/r{}", i)))
                .respond_with(redirect_to(&target))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/final"))
            .respond_with(html_response(og_page("Landed")))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let metadata = service
            .fetch_metadata(&format!("{}/r1", server.uri()))
            .await
            .expect("five redirects are within the limit");

        assert_eq!(metadata.url, format!("{}/final", server.uri()));
        assert_eq!(metadata.title.as_deref(), Some("Landed"));
    }

    #[tokio::test]
    async fn test_six_redirects_exceed_the_limit() {
        let server = MockServer::start().await;
        for i in 1..=6 {
            let target = if i == 6 {
                "/final".to_string()
            } else {
                format!("/r{}", i + 1)
            };
            Mock::given(method("GET"))
                .and(path(format!("/r{}", i)))
                .respond_with(redirect_to(&target))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/final"))
            .respond_with(html_response(og_page("Unreachable")))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let result = service.fetch(&format!("{}/r1", server.uri())).await;
        assert!(matches!(
            result,
            Err(FetchError::RedirectLimitExceeded { max: 5 })
        ));
    }

    #[tokio::test]
    async fn test_redirect_cycle_is_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(redirect_to("/b"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(redirect_to("/a"))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let result = service.fetch(&format!("{}/a", server.uri())).await;
        assert!(matches!(result, Err(FetchError::RedirectLoop { .. })));
    }

    #[tokio::test]
    async fn test_relative_location_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(redirect_to("/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(html_response(og_page("Moved")))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let metadata = service
            .fetch_metadata(&format!("{}/old", server.uri()))
            .await
            .expect("relative redirect should resolve");
        assert_eq!(metadata.url, format!("{}/new", server.uri()));
    }

    #[tokio::test]
    async fn test_non_html_content_yields_no_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"ok":true}"#),
            )
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let url = format!("{}/data", server.uri());

        let result = service.fetch(&url).await;
        assert!(matches!(result, Err(FetchError::NonHtmlContent { .. })));
        assert!(service.fetch_metadata(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_error_status_yields_no_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let result = service.fetch(&format!("{}/gone", server.uri())).await;
        assert!(matches!(result, Err(FetchError::UpstreamFailure { .. })));
    }

    #[tokio::test]
    async fn test_shared_deadline_cuts_off_a_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                html_response(og_page("Too late")).set_delay(Duration::from_millis(2_000)),
            )
            .mount(&server)
            .await;

        let service = test_service(200);
        let url = format!("{}/slow", server.uri());

        let result = service.fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Timeout { ms: 200 })));
        assert!(service.fetch_metadata(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_page_without_metadata_still_yields_a_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bare"))
            .respond_with(html_response("<html><body>plain</body></html>".to_string()))
            .mount(&server)
            .await;

        let service = test_service(5_000);
        let metadata = service
            .fetch_metadata(&format!("{}/bare", server.uri()))
            .await
            .expect("an empty record is still a record");
        assert_eq!(metadata.url, format!("{}/bare", server.uri()));
        assert_eq!(metadata.title, None);
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.image, None);
    }

    #[tokio::test]
    async fn test_strict_guard_blocks_loopback_before_any_request() {
        // Default (strict) config: the guard rejects the mock server's
        // loopback address, so no request is ever made
        let service = LinkMetadataService::with_resolver(
            NullResolver,
            PreviewConfig {
                timeout: Duration::from_millis(5_000),
                max_redirects: MAX_REDIRECTS,
                allow_unsafe_hosts: false,
            },
        )
        .unwrap();

        let result = service.fetch("http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(FetchError::UnsafeAddress { .. })));
        assert!(service.fetch_metadata("http://127.0.0.1:9/").await.is_none());
    }
}
