//! Extraction of post records from a profile's raw HTML.
//!
//! Two independent parsers, tried in order by the direct-fetch strategy:
//!
//! 1. [`extract_posts`] — scans for repeated `"shortcode_media": {…}`
//!    JSON fragments embedded in the page.
//! 2. [`extract_from_shared_data`] — legacy full-page blob: an ordered list
//!    of structural markers (`window._sharedData = {…}` and friends), the
//!    first of which that matches and decodes as JSON is walked down to the
//!    timeline media edges.
//!
//! Neither parser is a real HTML or JS parser. Each marker only locates an
//! opening brace; the object itself is carved out by a string-aware
//! balanced-brace scan. Fragments that fail to decode are skipped, never
//! fatal, and zero results is an ordinary outcome that the caller treats
//! as "try the next source".

pub mod value;

use crate::model::{permalink, Post, PAGE_SIZE};
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use self::value::{get_bool, get_i64, get_list, get_map, get_str};

/// Marker for embedded per-post JSON fragments. Matches up to the opening
/// brace; the object body is carved out separately.
static SHORTCODE_MEDIA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""shortcode_media"\s*:\s*\{"#).expect("valid regex"));

/// Ordered markers for the legacy "all data embedded in page" blob. Each is
/// an independent strategy; the first that matches and decodes wins.
static PAGE_DATA_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"window\._sharedData\s*=\s*\{",
        r#"<script[^>]*>\s*window\.__initialData\s*=\s*\{"#,
        r"__additionalDataLoaded\s*\(\s*'[^']*'\s*,\s*\{",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Scans raw HTML for embedded `shortcode_media` JSON fragments and
/// normalizes each into a [`Post`], up to [`PAGE_SIZE`].
///
/// Fragments that fail to decode as JSON are skipped. Records without a
/// shortcode are unusable (no permalink can be derived) and are discarded.
pub fn extract_posts(html: &str) -> Vec<Post> {
    let mut posts = Vec::new();

    for m in SHORTCODE_MEDIA.find_iter(html) {
        if posts.len() >= PAGE_SIZE {
            break;
        }
        // The match ends on the opening brace of the object
        let Some(fragment) = balanced_object(html, m.end() - 1) else {
            continue;
        };
        let Ok(record) = serde_json::from_str::<Value>(fragment) else {
            tracing::debug!("Embedded media fragment is not valid JSON, skipping");
            continue;
        };
        let post = normalize_media_record(&record);
        if !post.code.is_empty() {
            posts.push(post);
        }
    }

    posts
}

/// Tries each legacy page-blob marker in order; the first one that matches,
/// decodes as JSON, and yields any posts wins. No match or no posts returns
/// an empty list — callers treat that the same as a decode failure.
pub fn extract_from_shared_data(html: &str) -> Vec<Post> {
    for (idx, marker) in PAGE_DATA_MARKERS.iter().enumerate() {
        let Some(m) = marker.find(html) else {
            continue;
        };
        let Some(blob) = balanced_object(html, m.end() - 1) else {
            continue;
        };
        let Ok(data) = serde_json::from_str::<Value>(blob) else {
            tracing::debug!(marker = idx, "Page data marker matched but blob is not JSON");
            continue;
        };

        let posts = collect_timeline_posts(&data);
        if !posts.is_empty() {
            tracing::debug!(marker = idx, posts = posts.len(), "Extracted posts from page blob");
            return posts;
        }
    }

    Vec::new()
}

/// Walks the fixed nested-key path of the legacy blob:
/// `entry_data → ProfilePage[0] → graphql → user →
/// edge_owner_to_timeline_media → edges`, normalizing each edge node.
fn collect_timeline_posts(data: &Value) -> Vec<Post> {
    let edges = timeline_edges(data).unwrap_or(&[]);

    let mut posts = Vec::new();
    for edge in edges.iter().take(PAGE_SIZE) {
        let Some(node) = get_map(edge, "node") else {
            continue;
        };
        let post = normalize_media_record(node);
        if !post.code.is_empty() {
            posts.push(post);
        }
    }
    posts
}

fn timeline_edges(data: &Value) -> Option<&[Value]> {
    let entry_data = get_map(data, "entry_data")?;
    let profile_page = get_list(entry_data, "ProfilePage")?.first()?;
    let graphql = get_map(profile_page, "graphql")?;
    let user = get_map(graphql, "user")?;
    let timeline = get_map(user, "edge_owner_to_timeline_media")?;
    get_list(timeline, "edges")
}

/// Converts a loosely-typed media record into a [`Post`].
///
/// Every field is read independently and defensively: a missing or
/// wrong-typed key leaves the corresponding field at its zero value and
/// never fails the record. A record that ends up with an empty `code` has
/// no derivable permalink; callers must exclude it.
pub fn normalize_media_record(record: &Value) -> Post {
    let mut post = Post::default();

    if let Some(id) = get_str(record, "id") {
        post.id = id.to_string();
    }

    if let Some(code) = get_str(record, "shortcode") {
        post.code = code.to_string();
        post.post_url = permalink(code);
    }

    if let Some(url) = get_str(record, "display_url") {
        post.image_url = url.to_string();
    }

    if let Some(is_video) = get_bool(record, "is_video") {
        post.is_video = is_video;
    }

    if let Some(url) = get_str(record, "video_url") {
        post.video_url = url.to_string();
    }

    if let Some(secs) = get_i64(record, "taken_at_timestamp") {
        if let Some(ts) = Utc.timestamp_opt(secs, 0).single() {
            post.timestamp = ts;
        }
    }

    // First caption-edge node's text, when present
    if let Some(text) = get_map(record, "edge_media_to_caption")
        .and_then(|c| get_list(c, "edges"))
        .and_then(|edges| edges.first())
        .and_then(|edge| get_map(edge, "node"))
        .and_then(|node| get_str(node, "text"))
    {
        post.caption = text.to_string();
    }

    if let Some(count) = get_map(record, "edge_liked_by").and_then(|l| get_i64(l, "count")) {
        post.likes = count.max(0) as u32;
    }

    if let Some(count) =
        get_map(record, "edge_media_to_comment").and_then(|c| get_i64(c, "count"))
    {
        post.comments = count.max(0) as u32;
    }

    post
}

/// Carves the balanced JSON object starting at the `{` at byte offset
/// `start`. String-aware (braces inside string literals and escaped quotes
/// are ignored) but deliberately nothing more — this is a fragment
/// extractor for machine-generated page data, not a JSON parser.
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn media_record(code: &str) -> String {
        json!({
            "id": format!("17890{code}"),
            "shortcode": code,
            "display_url": format!("https://cdn.example.com/{code}.jpg"),
            "is_video": false,
            "taken_at_timestamp": 1714560000,
            "edge_media_to_caption": {"edges": [{"node": {"text": format!("Post {code} #sunset")}}]},
            "edge_liked_by": {"count": 321},
            "edge_media_to_comment": {"count": 12}
        })
        .to_string()
    }

    #[test]
    fn test_normalize_full_record() {
        let record: Value = serde_json::from_str(&media_record("AbCd123")).unwrap();
        let post = normalize_media_record(&record);

        assert_eq!(post.code, "AbCd123");
        assert_eq!(post.post_url, "https://www.instagram.com/p/AbCd123/");
        assert_eq!(post.image_url, "https://cdn.example.com/AbCd123.jpg");
        assert_eq!(post.caption, "Post AbCd123 #sunset");
        assert_eq!(post.likes, 321);
        assert_eq!(post.comments, 12);
        assert_eq!(post.timestamp.timestamp(), 1714560000);
        assert!(!post.is_video);
    }

    #[test]
    fn test_normalize_missing_fields_default_to_zero() {
        let record = json!({"shortcode": "X1"});
        let post = normalize_media_record(&record);

        assert_eq!(post.code, "X1");
        assert_eq!(post.likes, 0);
        assert_eq!(post.comments, 0);
        assert!(post.caption.is_empty());
        assert!(post.image_url.is_empty());
    }

    #[test]
    fn test_normalize_wrong_typed_fields_are_ignored() {
        let record = json!({
            "shortcode": "X2",
            "is_video": "yes",            // wrong type
            "taken_at_timestamp": "soon", // wrong type
            "edge_liked_by": {"count": "many"}
        });
        let post = normalize_media_record(&record);

        assert_eq!(post.code, "X2");
        assert!(!post.is_video);
        assert_eq!(post.likes, 0);
    }

    #[test]
    fn test_normalize_video_record() {
        let record = json!({
            "shortcode": "V1",
            "is_video": true,
            "video_url": "https://cdn.example.com/v1.mp4"
        });
        let post = normalize_media_record(&record);
        assert!(post.is_video);
        assert_eq!(post.video_url, "https://cdn.example.com/v1.mp4");
    }

    #[test]
    fn test_extract_posts_from_embedded_fragments() {
        let html = format!(
            "<html><script>stuff \"shortcode_media\": {} more \"shortcode_media\": {}</script></html>",
            media_record("AAA111"),
            media_record("BBB222"),
        );

        let posts = extract_posts(&html);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].code, "AAA111");
        assert_eq!(posts[1].code, "BBB222");
    }

    #[test]
    fn test_extract_posts_skips_undecodable_fragment() {
        let html = format!(
            "\"shortcode_media\": {{not json at all}} \"shortcode_media\": {}",
            media_record("CCC333"),
        );

        let posts = extract_posts(&html);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].code, "CCC333");
    }

    #[test]
    fn test_extract_posts_discards_record_without_shortcode() {
        let html = r#""shortcode_media": {"id": "123", "display_url": "https://x/y.jpg"}"#;
        assert!(extract_posts(html).is_empty());
    }

    #[test]
    fn test_extract_posts_caps_at_page_size() {
        let mut html = String::new();
        for i in 0..12 {
            html.push_str(&format!(
                "\"shortcode_media\": {} ",
                media_record(&format!("P{i:02}"))
            ));
        }
        assert_eq!(extract_posts(&html).len(), PAGE_SIZE);
    }

    fn shared_data_page(codes: &[&str]) -> String {
        let edges: Vec<Value> = codes
            .iter()
            .map(|c| json!({"node": serde_json::from_str::<Value>(&media_record(c)).unwrap()}))
            .collect();
        let blob = json!({
            "entry_data": {
                "ProfilePage": [{
                    "graphql": {
                        "user": {
                            "edge_owner_to_timeline_media": {"edges": edges}
                        }
                    }
                }]
            }
        });
        format!("<html><script>window._sharedData = {blob};</script></html>")
    }

    #[test]
    fn test_shared_data_walk() {
        let html = shared_data_page(&["S1", "S2", "S3"]);
        let posts = extract_from_shared_data(&html);

        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].code, "S1");
        assert_eq!(posts[2].post_url, "https://www.instagram.com/p/S3/");
    }

    #[test]
    fn test_shared_data_missing_path_returns_empty() {
        let html = r#"window._sharedData = {"entry_data": {"LoginPage": []}};"#;
        assert!(extract_from_shared_data(html).is_empty());
    }

    #[test]
    fn test_shared_data_no_marker_returns_empty() {
        assert!(extract_from_shared_data("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn test_shared_data_caps_at_page_size() {
        let codes: Vec<String> = (0..11).map(|i| format!("E{i:02}")).collect();
        let refs: Vec<&str> = codes.iter().map(String::as_str).collect();
        let posts = extract_from_shared_data(&shared_data_page(&refs));
        assert_eq!(posts.len(), PAGE_SIZE);
    }

    #[test]
    fn test_balanced_object_respects_strings() {
        let text = r#"pre {"a": "}{", "b": {"c": 1}} post"#;
        let obj = balanced_object(text, 4).unwrap();
        assert_eq!(obj, r#"{"a": "}{", "b": {"c": 1}}"#);
    }

    #[test]
    fn test_balanced_object_unterminated_returns_none() {
        assert!(balanced_object(r#"{"a": {"b": 1}"#, 0).is_none());
    }

    #[test]
    fn test_balanced_object_handles_escaped_quotes() {
        let text = r#"{"a": "say \"}\" loudly"}"#;
        assert_eq!(balanced_object(text, 0).unwrap(), text);
    }
}
