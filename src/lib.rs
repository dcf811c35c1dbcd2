//! gramfeed — republish a public Instagram profile's recent posts as an
//! RSS 2.0 feed.
//!
//! The interesting part is acquisition, not serialization: upstream sources
//! change format, rate-limit, and disappear, so posts are pulled through a
//! cascade of independent strategies (RSS-Bridge proxies → direct page
//! scrape → placeholder generation) that degrades gracefully and never
//! comes back empty-handed. See [`fetch::acquire_posts`] for the cascade
//! and [`rss::generate_feed`] for the output contract.

pub mod config;
pub mod fallback;
pub mod fetch;
pub mod model;
pub mod rss;
pub mod scrape;
