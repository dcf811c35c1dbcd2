//! Content acquisition cascade.
//!
//! Strategies in priority order:
//!
//! 1. RSS-Bridge proxy instances ([`bridge`]), each given one attempt.
//! 2. Direct fetch of the profile page ([`page`]), scraped for embedded
//!    JSON.
//! 3. Placeholder generation ([`crate::fallback`]), which cannot fail.
//!
//! Transitions are failure-driven: transport errors, non-2xx statuses, and
//! decode failures are all non-fatal inside the cascade and merely advance
//! it. Exhaustion is not an error — the generator resolves it. Execution is
//! strictly sequential with exactly one request in flight at a time, each
//! under its own bounded timeout.

pub mod bridge;
pub mod page;

use crate::config::Config;
use crate::fallback;
use crate::model::Post;
use thiserror::Error;

/// Errors produced while acquiring posts from a real upstream.
///
/// All of these are non-fatal within the cascade; they only decide which
/// strategy runs next and what gets logged.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response could not be decoded as the expected document shape
    #[error("Parse error: {0}")]
    Parse(String),
    /// The source responded but yielded zero usable posts
    #[error("No posts in response")]
    Empty,
    /// Every configured proxy endpoint failed
    #[error("All proxy endpoints failed")]
    Exhausted,
}

/// Acquires up to a page of recent posts for `handle`, trying each strategy
/// in turn.
///
/// Always returns a non-empty list of at most [`crate::model::PAGE_SIZE`]
/// posts: when every real source fails, the placeholder generator fills the
/// page. Partial upstream failures are invisible in the result.
///
/// The direct-fetch stage is deliberately not retried: any failure there
/// drops straight to placeholders, while the proxy stage walks its whole
/// endpoint list first.
pub async fn acquire_posts(client: &reqwest::Client, config: &Config, handle: &str) -> Vec<Post> {
    match bridge::fetch_from_bridge(client, config, handle).await {
        Ok(posts) => return posts,
        Err(e) => {
            tracing::warn!(error = %e, "Proxy cascade failed, falling back to direct page fetch");
        }
    }

    match page::fetch_from_profile_page(client, config, handle).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!(error = %e, "Direct fetch failed, generating placeholder posts");
            fallback::placeholder_posts(handle)
        }
    }
}
