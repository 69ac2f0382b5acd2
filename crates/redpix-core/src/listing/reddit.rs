//! Subreddit "hot" listing over Reddit's public JSON endpoints.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::UrlSource;
use crate::download::{self, DownloadOptions};

pub const DEFAULT_REDDIT_BASE: &str = "https://www.reddit.com";

/// Reddit returns at most this many posts per page.
const PAGE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    url: Option<String>,
}

/// Reads `/r/<name>/hot.json`, following `after` cursors until `count` posts are seen.
#[derive(Debug, Clone)]
pub struct RedditListing {
    base: url::Url,
    http: DownloadOptions,
}

impl RedditListing {
    /// `bot_name` ends up in the User-Agent, which Reddit requires to be descriptive.
    pub fn new(base: &str, bot_name: &str, mut http: DownloadOptions) -> Result<Self> {
        let base = url::Url::parse(base).with_context(|| format!("invalid listing url {base:?}"))?;
        http.user_agent = user_agent(bot_name);
        Ok(Self { base, http })
    }

    fn page_url(&self, collection: &str, limit: usize, after: Option<&str>) -> Result<url::Url> {
        let mut url = self
            .base
            .join(&format!("r/{}/hot.json", collection))
            .with_context(|| format!("invalid collection name {collection:?}"))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("limit", &limit.to_string());
            q.append_pair("raw_json", "1");
            if let Some(after) = after {
                q.append_pair("after", after);
            }
        }
        Ok(url)
    }
}

impl UrlSource for RedditListing {
    fn urls(&self, collection: &str, count: usize) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(count);
        let mut after: Option<String> = None;
        while urls.len() < count {
            let limit = (count - urls.len()).min(PAGE_LIMIT);
            let page = self.page_url(collection, limit, after.as_deref())?;
            tracing::debug!(url = %page, "fetching listing page");
            let body = download::get_bytes(page.as_str(), &self.http)
                .with_context(|| format!("listing r/{collection}"))?;
            let (mut page_urls, next) = parse_listing(&body)?;
            page_urls.truncate(count - urls.len());
            let got = page_urls.len();
            urls.extend(page_urls);
            match next {
                Some(n) if got > 0 => after = Some(n),
                _ => break,
            }
        }
        Ok(urls)
    }
}

fn user_agent(bot_name: &str) -> String {
    let bot = bot_name.trim();
    if bot.is_empty() || bot == "." {
        concat!("redpix/", env!("CARGO_PKG_VERSION")).to_string()
    } else {
        format!("redpix/{} (bot {})", env!("CARGO_PKG_VERSION"), bot)
    }
}

/// Post URLs in listing order plus the `after` cursor, if any.
fn parse_listing(body: &[u8]) -> Result<(Vec<String>, Option<String>)> {
    let listing: Listing = serde_json::from_slice(body).context("parse listing JSON")?;
    let urls = listing
        .data
        .children
        .into_iter()
        .filter_map(|c| c.data.url)
        .collect();
    Ok((urls, listing.data.after))
}
