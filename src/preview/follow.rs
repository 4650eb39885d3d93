// src/preview/follow.rs
// =============================================================================
// This module walks HTTP redirect chains by hand.
//
// Automatic redirect following is disabled on the client, because the whole
// point is to re-run the safety guard BEFORE every single request. A chain
// that starts at a harmless public host can 302 into 10.0.0.0/8 on hop two;
// with automatic redirects the client would already be connected before we
// ever saw the target.
//
// The walk is bounded three ways:
// - a hop limit (MAX_REDIRECTS), so chains cannot run forever
// - a visited set, so A -> B -> A stops as a loop instead of ping-ponging
//   until the hop limit
// - the caller's shared deadline, armed once for the whole operation (see
//   service.rs), not per hop
//
// The per-response decision (follow / terminal / fail) is a pure function,
// next_hop(), so the loop and cycle logic can be tested without a network.
// =============================================================================

use std::collections::HashSet;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::FetchError;
use crate::safety::{ResolveHost, SafeUrlGuard};

/// Maximum number of redirects followed in one fetch
pub const MAX_REDIRECTS: usize = 5;

// The terminal 2xx HTML response of a successful walk
pub(crate) struct FinalPage {
    pub url: Url,
    pub html: String,
}

// Drives the bounded redirect walk for one fetch operation
//
// Borrows the client and guard from the service; the visited set and hop
// counter live inside follow(), so every call owns its own state.
pub(crate) struct RedirectFollower<'a, R> {
    client: &'a Client,
    guard: &'a SafeUrlGuard<R>,
    max_redirects: usize,
}

impl<'a, R: ResolveHost> RedirectFollower<'a, R> {
    pub fn new(client: &'a Client, guard: &'a SafeUrlGuard<R>, max_redirects: usize) -> Self {
        Self {
            client,
            guard,
            max_redirects,
        }
    }

    pub async fn follow(&self, start_url: &str) -> Result<FinalPage, FetchError> {
        let mut current = Url::parse(start_url.trim()).map_err(|e| FetchError::InvalidUrl {
            url: start_url.to_string(),
            reason: e.to_string(),
        })?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut hops = 0;

        while hops <= self.max_redirects {
            // Re-validate at every hop. The guard resolves fresh each time,
            // so a name that moved since the last hop is caught here
            self.guard.check(current.as_str()).await?;

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::UpstreamFailure {
                    message: e.to_string(),
                })?;

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|h| h.to_str().ok())
                .map(String::from);

            match next_hop(status, location.as_deref(), &current, &mut visited)? {
                Some(next) => {
                    current = next;
                    hops += 1;
                }
                None => {
                    // Terminal response. Check the transport's effective URL
                    // once more - the guard must pass on what was actually
                    // reached, not just on what we asked for
                    let effective = response.url().clone();
                    self.guard.check(effective.as_str()).await?;

                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    if !content_type.contains("text/html") {
                        return Err(FetchError::NonHtmlContent { content_type });
                    }

                    let html =
                        response
                            .text()
                            .await
                            .map_err(|e| FetchError::UpstreamFailure {
                                message: e.to_string(),
                            })?;
                    return Ok(FinalPage {
                        url: effective,
                        html,
                    });
                }
            }
        }

        Err(FetchError::RedirectLimitExceeded {
            max: self.max_redirects,
        })
    }
}

// Decides what one response means for the walk
//
// Returns:
//   Ok(Some(next)) - a redirect to follow; `current` is now in `visited`
//   Ok(None)       - a terminal success response
//   Err(..)        - the walk stops with that failure
//
// The visited set is keyed by the pre-redirect URL and the current URL is
// only inserted when its redirect is actually followed. The start URL is
// therefore not in the set on hop zero; a chain that redirects straight
// back to it is still caught on the following hop.
fn next_hop(
    status: StatusCode,
    location: Option<&str>,
    current: &Url,
    visited: &mut HashSet<String>,
) -> Result<Option<Url>, FetchError> {
    if status.is_redirection() {
        let location = location.ok_or_else(|| FetchError::UpstreamFailure {
            message: format!("HTTP {} without a Location header", status.as_u16()),
        })?;

        // Location may be relative; resolve it against the current URL
        let next = current.join(location).map_err(|e| FetchError::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        })?;

        if visited.contains(next.as_str()) {
            return Err(FetchError::RedirectLoop {
                url: next.to_string(),
            });
        }

        visited.insert(current.as_str().to_string());
        return Ok(Some(next));
    }

    if status.is_success() {
        return Ok(None);
    }

    Err(FetchError::UpstreamFailure {
        message: format!("HTTP {}", status.as_u16()),
    })
}
