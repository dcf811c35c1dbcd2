//! Placeholder post generation — the cascade's unconditional terminal
//! fallback.
//!
//! When every real source fails, the pipeline still has to emit a
//! well-formed feed, so this generator produces a full page of synthetic
//! posts. Shape is deterministic (ids, codes, spacing, counts); content
//! varies only with the handle and the wall clock.

use crate::model::{permalink, Post, PAGE_SIZE};
use chrono::{Duration, Utc};

/// Produces exactly [`PAGE_SIZE`] synthetic posts for `handle`.
///
/// Sequential ids and codes, timestamps descending 24 hours apart starting
/// at "now", a placeholder image, and monotonically increasing like/comment
/// counts. This function cannot fail and never returns fewer than
/// [`PAGE_SIZE`] records.
pub fn placeholder_posts(handle: &str) -> Vec<Post> {
    let base_time = Utc::now();

    (0..PAGE_SIZE)
        .map(|i| {
            let n = i + 1;
            let code = format!("SAMPLE{n:03}");
            let post_url = permalink(&code);
            Post {
                id: format!("placeholder_{n}"),
                code,
                caption: format!("Sample post {n} from @{handle} #instagram #photo"),
                image_url: format!("https://via.placeholder.com/640x640?text={handle}+{n}"),
                video_url: String::new(),
                post_url,
                timestamp: base_time - Duration::hours(24 * i as i64),
                is_video: false,
                likes: 1000 + (i as u32) * 100,
                comments: 50 + (i as u32) * 10,
            }
        })
        .collect()
}
