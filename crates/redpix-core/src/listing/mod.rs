//! Sources of candidate URLs for a collection.
//!
//! The batch driver only depends on `UrlSource` and does not know about Reddit
//! or any other listing API.

mod reddit;

pub use reddit::{RedditListing, DEFAULT_REDDIT_BASE};

use std::collections::HashMap;

/// Returns up to `count` URLs for a collection, most promoted first.
pub trait UrlSource: Send + Sync {
    fn urls(&self, collection: &str, count: usize) -> anyhow::Result<Vec<String>>;
}

/// Fixed URL lists keyed by collection name. Unknown collections yield nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    lists: HashMap<String, Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collection: &str, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.lists
            .insert(collection.to_string(), urls.into_iter().map(Into::into).collect());
        self
    }
}

impl UrlSource for StaticSource {
    fn urls(&self, collection: &str, count: usize) -> anyhow::Result<Vec<String>> {
        Ok(self
            .lists
            .get(collection)
            .map(|urls| urls.iter().take(count).cloned().collect())
            .unwrap_or_default())
    }
}
