//! Syntactic URL filtering and target filename derivation.
//!
//! Decides from the shape of a URL alone (no network access) whether it is a
//! well-formed absolute URL that plausibly points at an image. Also derives the
//! deterministic on-disk name a verified image is promoted to.

mod path;

pub use path::{target_filename, url_basename};

use std::collections::BTreeSet;

/// URL extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Schemes we know how to download.
const DOWNLOADABLE_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Filters candidate URLs by syntax and trailing extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFilter {
    extensions: BTreeSet<String>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl UrlFilter {
    /// Build a filter accepting exactly `extensions` (matched case-sensitively, without the dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// True iff `url` is a well-formed absolute URL with a host.
    ///
    /// Strings with whitespace anywhere are rejected outright: the `url` crate
    /// would otherwise trim or percent-encode them into something valid.
    pub fn is_valid(&self, url: &str) -> bool {
        if url.is_empty() || url.chars().any(char::is_whitespace) {
            return false;
        }
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        DOWNLOADABLE_SCHEMES.contains(&parsed.scheme())
            && parsed.host_str().is_some_and(|h| !h.is_empty())
    }

    /// True iff `url` is valid and the text after its final `.` is an allowed extension.
    pub fn is_image(&self, url: &str) -> bool {
        if !self.is_valid(url) {
            return false;
        }
        match url.rsplit_once('.') {
            Some((_, ext)) => self.extensions.contains(ext),
            None => false,
        }
    }
}
