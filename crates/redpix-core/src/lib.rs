pub mod logging;
pub mod settings;

// Fetch-validate-persist pipeline, leaf first.
pub mod url_filter;
pub mod validate;
pub mod transient;
pub mod download;
pub mod fetcher;

pub mod batch;
pub mod listing;

pub use batch::{BatchReport, ImageDownloader};
pub use fetcher::{FetchError, FetchOutcome, ImageFetcher};
pub use listing::{RedditListing, StaticSource, UrlSource};
pub use settings::{Settings, SettingsError, SettingsOverrides};
