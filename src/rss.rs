//! RSS 2.0 serialization of a normalized post list.
//!
//! This is the output contract feed readers depend on: element names,
//! ordering, and attributes here are the compatibility surface. The
//! document is emitted with quick-xml's event writer.
//!
//! A serialization failure is the pipeline's one hard error — it is
//! surfaced, never swallowed.

use crate::model::{profile_url, Post, PAGE_SIZE};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::io::Cursor;

/// Title length cap before the ellipsis marker is appended.
const TITLE_MAX_CHARS: usize = 50;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("valid regex"));
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").expect("valid regex"));

/// Channel-level identity of the emitted feed.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
    pub title: String,
    pub link: String,
    pub description: String,
    pub build_time: DateTime<Utc>,
}

impl ChannelIdentity {
    /// Standard channel identity for a profile handle.
    pub fn for_handle(handle: &str) -> Self {
        Self {
            title: format!("{handle}'s Instagram Feed"),
            link: profile_url(handle),
            description: format!("Latest {PAGE_SIZE} posts from @{handle} Instagram account"),
            build_time: Utc::now(),
        }
    }
}

/// Serializes a post list into a complete RSS 2.0 document.
///
/// # Errors
///
/// Fails only when the XML writer does — should not occur for well-formed
/// input, but must be propagated when it does.
pub fn generate_feed(posts: &[Post], identity: &ChannelIdentity) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;

    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    write_text_element(&mut writer, "title", &identity.title)?;
    write_text_element(&mut writer, "link", &identity.link)?;
    write_text_element(&mut writer, "description", &identity.description)?;
    write_text_element(&mut writer, "language", "en-us")?;
    write_text_element(
        &mut writer,
        "lastBuildDate",
        &identity.build_time.to_rfc2822(),
    )?;
    write_text_element(&mut writer, "generator", "gramfeed")?;

    for post in posts {
        write_item(&mut writer, post)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated RSS contains invalid UTF-8")
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, post: &Post) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .context("Failed to write item element")?;

    write_text_element(writer, "title", &item_title(post))?;
    write_text_element(writer, "link", &post.post_url)?;
    write_text_element(writer, "description", &item_description(post))?;
    write_text_element(writer, "pubDate", &post.timestamp.to_rfc2822())?;
    // The permalink is reused verbatim as the item identifier
    write_text_element(writer, "guid", &post.post_url)?;

    // Enclosure only when the post has a primary media URL. The true size
    // is never known, so length is always a zero placeholder.
    if let Some((url, mime_type)) = enclosure_for_post(post) {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", url));
        enclosure.push_attribute(("length", "0"));
        enclosure.push_attribute(("type", mime_type));
        writer
            .write_event(Event::Empty(enclosure))
            .context("Failed to write enclosure element")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .context("Failed to write item end")?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// Primary media URL and MIME type for the item enclosure, when any.
fn enclosure_for_post(post: &Post) -> Option<(&str, &'static str)> {
    if post.is_video && !post.video_url.is_empty() {
        Some((post.video_url.as_str(), "video/mp4"))
    } else if !post.image_url.is_empty() {
        Some((post.image_url.as_str(), "image/jpeg"))
    } else {
        None
    }
}

/// Item title: first caption line, truncated to [`TITLE_MAX_CHARS`]
/// characters with an ellipsis marker, then stripped of hashtag and mention
/// tokens. The stripping applies to the title only; the body keeps them as
/// links.
fn item_title(post: &Post) -> String {
    let first_line = post.caption.lines().next().unwrap_or("");

    let truncated = if first_line.chars().count() > TITLE_MAX_CHARS {
        let mut t: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        t.push_str("...");
        t
    } else {
        first_line.to_string()
    };

    truncated
        .split_whitespace()
        .filter(|word| !word.starts_with('#') && !word.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Item body: embedded media, the HTML-escaped caption with hashtags and
/// mentions rewritten as links and newlines as `<br>`, then the count
/// summary and a "view original" link. The returned string is HTML; the
/// XML writer entity-escapes it on emission.
fn item_description(post: &Post) -> String {
    let mut desc = String::new();

    if post.is_video && !post.video_url.is_empty() {
        let url = html_escape::encode_double_quoted_attribute(&post.video_url);
        desc.push_str(&format!(
            "<video controls style=\"max-width:100%;height:auto;\">\
             <source src=\"{url}\" type=\"video/mp4\">\
             Your browser does not support the video tag.</video><br><br>"
        ));
    } else if !post.image_url.is_empty() {
        let url = html_escape::encode_double_quoted_attribute(&post.image_url);
        desc.push_str(&format!(
            "<img src=\"{url}\" alt=\"Instagram post\" style=\"max-width:100%;height:auto;\"><br><br>"
        ));
    }

    if !post.caption.is_empty() {
        let caption = html_escape::encode_text(&post.caption).into_owned();
        let caption = link_hashtags(&caption);
        let caption = link_mentions(&caption);
        let caption = caption.replace('\n', "<br>");
        desc.push_str(&format!("<p>{caption}</p>"));
    }

    desc.push_str(&format!(
        "<small>👍 {} likes • 💬 {} comments</small><br>",
        post.likes, post.comments
    ));
    desc.push_str(&format!(
        "<small>🔗 <a href=\"{}\">View on Instagram</a></small>",
        html_escape::encode_double_quoted_attribute(&post.post_url)
    ));

    desc
}

fn link_hashtags(text: &str) -> String {
    HASHTAG
        .replace_all(
            text,
            "<a href=\"https://www.instagram.com/explore/tags/$1\">#$1</a>",
        )
        .into_owned()
}

fn link_mentions(text: &str) -> String {
    MENTION
        .replace_all(text, "<a href=\"https://www.instagram.com/$1\">@$1</a>")
        .into_owned()
}
