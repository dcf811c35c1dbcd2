//! Normalized, source-agnostic representation of a single profile post.
//!
//! Every acquisition strategy (RSS-Bridge proxy, direct page scrape,
//! placeholder generator) produces the same `Post` shape, so the serializer
//! never needs to know where a post came from.

use chrono::{DateTime, Utc};

/// Maximum number of posts any strategy may return.
pub const PAGE_SIZE: usize = 8;

/// One social-media post, normalized from whichever source produced it.
///
/// Lifecycle is strictly transient: a `Post` is built inside a single
/// strategy invocation, collected into a list of at most [`PAGE_SIZE`]
/// entries, handed once to the serializer, and dropped. Nothing mutates a
/// post after construction and nothing persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Opaque source identifier.
    pub id: String,
    /// Short public identifier (shortcode); may be empty for proxy-sourced
    /// posts whose permalink carries no `/p/` segment.
    pub code: String,
    /// Free caption text; may contain hashtag/mention tokens and newlines.
    pub caption: String,
    /// Primary still-image URL, empty when unknown.
    pub image_url: String,
    /// Video URL; only meaningful when `is_video` is set, may still be empty.
    pub video_url: String,
    /// Canonical permalink; doubles as the feed item's unique identifier.
    /// Non-empty for any post parsed from a genuine source.
    pub post_url: String,
    /// Publication time; defaults to "now" when unrecoverable.
    pub timestamp: DateTime<Utc>,
    /// When true, `video_url` is the preferred media for rendering.
    pub is_video: bool,
    /// Like count, 0 when the source doesn't expose it.
    pub likes: u32,
    /// Comment count, 0 when the source doesn't expose it.
    pub comments: u32,
}

impl Default for Post {
    fn default() -> Self {
        Self {
            id: String::new(),
            code: String::new(),
            caption: String::new(),
            image_url: String::new(),
            video_url: String::new(),
            post_url: String::new(),
            timestamp: Utc::now(),
            is_video: false,
            likes: 0,
            comments: 0,
        }
    }
}

/// Permalink for a post shortcode.
pub fn permalink(code: &str) -> String {
    format!("https://www.instagram.com/p/{code}/")
}

/// Canonical profile page URL for a handle.
pub fn profile_url(handle: &str) -> String {
    format!("https://www.instagram.com/{handle}/")
}
