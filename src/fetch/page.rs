//! Direct-fetch strategy: pull the profile's own page and scrape the JSON
//! embedded in its HTML.
//!
//! One request only. Any failure here — request construction, transport,
//! status, body read, or both scrapers coming up empty — is non-retriable
//! within the run; the orchestrator drops to the placeholder generator.

use super::FetchError;
use crate::config::Config;
use crate::model::Post;
use crate::scrape;
use std::time::Duration;

/// Fetches `{profile_base}/{handle}/` with a browser-like User-Agent and
/// runs the embedded-media-block scraper, then the legacy full-page-data
/// scraper if the first yields nothing.
///
/// # Errors
///
/// Any transport/status failure, or [`FetchError::Empty`] when the page was
/// fetched but neither scraper found a post.
pub async fn fetch_from_profile_page(
    client: &reqwest::Client,
    config: &Config,
    handle: &str,
) -> Result<Vec<Post>, FetchError> {
    let url = format!("{}/{}/", config.profile_base.trim_end_matches('/'), handle);

    let request = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, config.browser_user_agent.as_str());

    let response = tokio::time::timeout(Duration::from_secs(config.timeout_secs), request.send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    // Body read is bounded separately; headers arriving says nothing about
    // the body ever completing.
    let html = tokio::time::timeout(Duration::from_secs(config.timeout_secs), response.text())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    let mut posts = scrape::extract_posts(&html);
    if posts.is_empty() {
        tracing::debug!(url = %url, "No embedded media blocks, trying full-page data blob");
        posts = scrape::extract_from_shared_data(&html);
    }

    if posts.is_empty() {
        return Err(FetchError::Empty);
    }

    tracing::info!(url = %url, posts = posts.len(), "Scraped posts from profile page");
    Ok(posts)
}
