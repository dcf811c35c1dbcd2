//! RSS-Bridge proxy strategy — the richest acquisition source.
//!
//! Public RSS-Bridge instances republish a profile as an Atom feed. Each
//! configured endpoint gets exactly one attempt, in priority order; the
//! first that yields at least one normalized post wins. A non-200 status,
//! transport error, timeout, or parse failure just advances to the next
//! endpoint.

use super::FetchError;
use crate::config::Config;
use crate::model::{Post, PAGE_SIZE};
use chrono::Utc;
use feed_rs::model::Entry;
use std::time::Duration;

/// Walks the configured proxy endpoints until one produces posts.
///
/// # Errors
///
/// Returns the last endpoint's error (or [`FetchError::Exhausted`] when the
/// endpoint list is empty) once every instance has been tried.
pub async fn fetch_from_bridge(
    client: &reqwest::Client,
    config: &Config,
    handle: &str,
) -> Result<Vec<Post>, FetchError> {
    let mut last_error = FetchError::Exhausted;

    for endpoint in &config.bridge_endpoints {
        match try_endpoint(client, config, endpoint, handle).await {
            Ok(posts) if !posts.is_empty() => {
                tracing::info!(
                    endpoint = %endpoint,
                    posts = posts.len(),
                    "Fetched posts from proxy"
                );
                return Ok(posts);
            }
            Ok(_) => {
                tracing::warn!(endpoint = %endpoint, "Proxy returned a feed with no entries");
                last_error = FetchError::Empty;
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Proxy endpoint failed");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// One bounded-timeout request against a single RSS-Bridge instance.
async fn try_endpoint(
    client: &reqwest::Client,
    config: &Config,
    endpoint: &str,
    handle: &str,
) -> Result<Vec<Post>, FetchError> {
    let request = client
        .get(endpoint)
        .query(&[
            ("bridge", "Instagram"),
            ("context", "Username"),
            ("u", handle),
            ("format", "Atom"),
        ])
        .header(reqwest::header::USER_AGENT, config.user_agent.as_str());

    let response = tokio::time::timeout(Duration::from_secs(config.timeout_secs), request.send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    // The body read gets its own bound: a 200 whose body never arrives
    // must not stall the cascade any more than a dead connection does.
    let bytes = tokio::time::timeout(Duration::from_secs(config.timeout_secs), response.bytes())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;
    parse_bridge_feed(&bytes)
}

/// Parses an Atom document returned by a proxy into normalized posts, up to
/// [`PAGE_SIZE`] entries in source order.
pub fn parse_bridge_feed(bytes: &[u8]) -> Result<Vec<Post>, FetchError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(feed
        .entries
        .iter()
        .take(PAGE_SIZE)
        .map(entry_to_post)
        .collect())
}

fn entry_to_post(entry: &Entry) -> Post {
    let post_url = entry_link(entry);
    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .unwrap_or("");

    Post {
        id: last_path_segment(&entry.id).to_string(),
        code: shortcode_from_url(&post_url),
        caption: entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        image_url: extract_img_attributes(body),
        video_url: String::new(),
        // Heuristic, not authoritative: proxies don't flag media kind,
        // so sniff the rendered content instead.
        is_video: body.contains("video") || body.contains(".mp4"),
        timestamp: entry.updated.or(entry.published).unwrap_or_else(Utc::now),
        post_url,
        likes: 0,
        comments: 0,
    }
}

/// Permalink of an entry: the "alternate" link, else the first link with an
/// empty relation. Unlike the scrape path, an entry without any usable link
/// is still kept (with an empty URL).
fn entry_link(entry: &Entry) -> String {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().unwrap_or("").is_empty())
        })
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

fn last_path_segment(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

fn shortcode_from_url(post_url: &str) -> String {
    post_url
        .split_once("/p/")
        .and_then(|(_, rest)| rest.split('/').next())
        .unwrap_or_default()
        .to_string()
}

/// Best-effort extraction of the first `<img` tag's raw attribute string,
/// up to the next `>`. Only guaranteed correct for the simple single-tag
/// markup RSS-Bridge emits; this is deliberately not an HTML parser.
fn extract_img_attributes(content: &str) -> String {
    let Some(start) = content.find("<img") else {
        return String::new();
    };
    let rest = &content[start + 4..];
    match rest.find('>') {
        Some(end) => rest[..end].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn atom_doc(entries: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>bridge feed</title>
  <id>urn:gramfeed:test</id>
  <updated>2024-05-01T12:00:00Z</updated>
  {entries}
</feed>"#
        )
    }

    fn atom_entry(code: &str, rel: &str) -> String {
        let rel_attr = if rel.is_empty() {
            String::new()
        } else {
            format!(" rel=\"{rel}\"")
        };
        format!(
            r#"<entry>
    <id>https://www.instagram.com/p/{code}</id>
    <title>Post {code} #tag</title>
    <link{rel_attr} href="https://www.instagram.com/p/{code}/"/>
    <updated>2024-05-01T12:00:00Z</updated>
    <content type="html">&lt;img src="https://cdn.example.com/{code}.jpg" alt="post"&gt;</content>
  </entry>"#
        )
    }

    #[test]
    fn test_parse_entry_fields() {
        let doc = atom_doc(&atom_entry("AAA111", "alternate"));
        let posts = parse_bridge_feed(doc.as_bytes()).unwrap();

        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.id, "AAA111");
        assert_eq!(post.post_url, "https://www.instagram.com/p/AAA111/");
        assert_eq!(post.code, "AAA111");
        assert_eq!(post.caption, "Post AAA111 #tag");
        assert_eq!(post.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert!(post.image_url.contains("cdn.example.com/AAA111.jpg"));
    }

    #[test]
    fn test_link_without_rel_is_accepted() {
        let doc = atom_doc(&atom_entry("BBB222", ""));
        let posts = parse_bridge_feed(doc.as_bytes()).unwrap();
        assert_eq!(posts[0].post_url, "https://www.instagram.com/p/BBB222/");
    }

    #[test]
    fn test_entry_without_links_is_kept_with_empty_url() {
        let doc = atom_doc(
            r#"<entry>
    <id>urn:post:17</id>
    <title>orphan</title>
    <updated>2024-05-01T12:00:00Z</updated>
  </entry>"#,
        );
        let posts = parse_bridge_feed(doc.as_bytes()).unwrap();

        assert_eq!(posts.len(), 1);
        assert!(posts[0].post_url.is_empty());
        assert!(posts[0].code.is_empty());
        assert_eq!(posts[0].id, "urn:post:17");
    }

    #[test]
    fn test_video_heuristic_on_content_body() {
        let entry = r#"<entry>
    <id>https://www.instagram.com/p/VID001</id>
    <title>clip</title>
    <link rel="alternate" href="https://www.instagram.com/p/VID001/"/>
    <updated>2024-05-01T12:00:00Z</updated>
    <content type="html">&lt;a href="https://cdn.example.com/clip.mp4"&gt;clip&lt;/a&gt;</content>
  </entry>"#;
        let posts = parse_bridge_feed(atom_doc(entry).as_bytes()).unwrap();
        assert!(posts[0].is_video);
    }

    #[test]
    fn test_entries_capped_at_page_size() {
        let entries: String = (0..11)
            .map(|i| atom_entry(&format!("CAP{i:02}"), "alternate"))
            .collect();
        let posts = parse_bridge_feed(atom_doc(&entries).as_bytes()).unwrap();
        assert_eq!(posts.len(), PAGE_SIZE);
        // Source order preserved
        assert_eq!(posts[0].code, "CAP00");
        assert_eq!(posts[7].code, "CAP07");
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let result = parse_bridge_feed(b"<not really xml");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_shortcode_from_url_edge_cases() {
        assert_eq!(shortcode_from_url("https://x.com/p/Ab1/"), "Ab1");
        assert_eq!(shortcode_from_url("https://x.com/p/Ab1"), "Ab1");
        assert_eq!(shortcode_from_url("https://x.com/reel/Ab1/"), "");
        assert_eq!(shortcode_from_url(""), "");
    }

    #[test]
    fn test_extract_img_attributes_is_best_effort() {
        assert_eq!(
            extract_img_attributes(r#"<p>hi</p><img src="https://a/b.jpg">"#),
            r#" src="https://a/b.jpg""#
        );
        assert_eq!(extract_img_attributes("no images here"), "");
        assert_eq!(extract_img_attributes("<img src=\"unterminated"), "");
    }
}
