use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use gramfeed::config::Config;
use gramfeed::fetch;
use gramfeed::rss::{self, ChannelIdentity};

#[derive(Parser, Debug)]
#[command(name = "gramfeed", about = "Republish an Instagram profile as an RSS feed")]
struct Args {
    /// Profile handle to fetch (with or without a leading @)
    username: String,

    /// Output file (defaults to <username>_feed.xml)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Config file path (defaults to ./gramfeed.toml; missing file is fine)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured proxy endpoints (repeatable, tried in order)
    #[arg(long = "endpoint", value_name = "URL")]
    endpoints: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let username = args.username.trim_start_matches('@').to_string();
    if username.is_empty() {
        anyhow::bail!("Username must not be empty");
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("gramfeed.toml"));
    let mut config = Config::load(&config_path).context("Failed to load config file")?;
    if !args.endpoints.is_empty() {
        config.bridge_endpoints = args.endpoints.clone();
    }

    let client = reqwest::Client::new();

    println!("Fetching Instagram posts for @{username}...");
    let posts = fetch::acquire_posts(&client, &config, &username).await;

    // Only reachable if the placeholder generator is bypassed; surfaced as
    // a hard error rather than writing an empty feed.
    if posts.is_empty() {
        anyhow::bail!("No posts found for @{username}");
    }
    println!("Found {} posts", posts.len());

    let identity = ChannelIdentity::for_handle(&username);
    let feed = rss::generate_feed(&posts, &identity).context("Failed to generate RSS feed")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{username}_feed.xml")));
    write_feed(&output, &feed)?;

    println!("RSS feed generated successfully: {}", output.display());
    println!("Posts included:");
    for (i, post) in posts.iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            summary_line(&post.caption, 50),
            post.timestamp.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

fn write_feed(path: &Path, feed: &str) -> Result<()> {
    std::fs::write(path, feed)
        .with_context(|| format!("Failed to write RSS file '{}'", path.display()))
}

/// First line of a caption, truncated for the console summary.
fn summary_line(caption: &str, max_chars: usize) -> String {
    let line = caption.lines().next().unwrap_or("");
    if line.chars().count() <= max_chars {
        line.to_string()
    } else {
        let truncated: String = line.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
