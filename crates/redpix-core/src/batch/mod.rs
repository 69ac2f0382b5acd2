//! Batch driver: lists a collection's URLs and fetches each one.
//!
//! Each URL is an independent unit of work. Download failures are logged and
//! counted without stopping the batch; filesystem failures stop it.

mod parallel;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::fetcher::{FetchError, FetchOutcome, ImageFetcher};
use crate::listing::UrlSource;
use crate::settings::Settings;

/// Tally of URL outcomes for one or more collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub promoted: usize,
    pub discarded: usize,
    pub skipped: usize,
    /// URLs whose download failed.
    pub failed: usize,
    /// Collections whose listing could not be read.
    pub listing_failures: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.promoted + self.discarded + self.skipped + self.failed
    }

    fn merge(&mut self, other: BatchReport) {
        self.promoted += other.promoted;
        self.discarded += other.discarded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.listing_failures += other.listing_failures;
    }

    /// Count one URL's result. Returns the error back if it must end the batch.
    fn record(&mut self, result: Result<FetchOutcome, FetchError>) -> Result<(), FetchError> {
        match result {
            Ok(FetchOutcome::Promoted(_)) => self.promoted += 1,
            Ok(FetchOutcome::Discarded) => self.discarded += 1,
            Ok(FetchOutcome::Skipped) => self.skipped += 1,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("{}", e);
                self.failed += 1;
            }
        }
        Ok(())
    }
}

/// Downloads the top images of collections from a `UrlSource`.
pub struct ImageDownloader {
    source: Arc<dyn UrlSource>,
    fetcher: Arc<ImageFetcher>,
    jobs: usize,
}

impl ImageDownloader {
    /// `jobs` bounds how many URLs are in flight at once; 1 means strictly sequential.
    pub fn new(source: Arc<dyn UrlSource>, fetcher: ImageFetcher, jobs: usize) -> Self {
        Self {
            source,
            fetcher: Arc::new(fetcher),
            jobs: jobs.max(1),
        }
    }

    /// Fetch up to `count` URLs of `collection` into `target_dir`.
    pub async fn download_images_from_source(
        &self,
        collection: &str,
        count: usize,
        target_dir: &str,
    ) -> Result<BatchReport> {
        let urls = self.list(collection, count).await??;
        self.fetch_urls(collection, urls, target_dir).await
    }

    /// The outer error is a failed listing task (panic or cancellation); the
    /// inner one is the source failing to list.
    async fn list(&self, collection: &str, count: usize) -> Result<Result<Vec<String>>> {
        tokio::task::spawn_blocking({
            let source = Arc::clone(&self.source);
            let collection = collection.to_string();
            move || source.urls(&collection, count)
        })
        .await
        .context("listing task join")
    }

    async fn fetch_urls(&self, collection: &str, urls: Vec<String>, target_dir: &str) -> Result<BatchReport> {
        tracing::info!(collection, urls = urls.len(), "listed candidate urls");
        let report = if self.jobs > 1 {
            parallel::fetch_all_parallel(&self.fetcher, urls, target_dir, collection, self.jobs).await?
        } else {
            self.fetch_all_sequential(urls, target_dir, collection).await?
        };
        tracing::info!(
            collection,
            promoted = report.promoted,
            discarded = report.discarded,
            skipped = report.skipped,
            failed = report.failed,
            "collection done"
        );
        Ok(report)
    }

    async fn fetch_all_sequential(
        &self,
        urls: Vec<String>,
        target_dir: &str,
        collection: &str,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for url in urls {
            let result = tokio::task::spawn_blocking({
                let fetcher = Arc::clone(&self.fetcher);
                let target_dir = target_dir.to_string();
                let collection = collection.to_string();
                move || fetcher.fetch(&url, &target_dir, &collection)
            })
            .await
            .context("fetch task join")?;
            report.record(result)?;
        }
        Ok(report)
    }

    /// Every configured collection in order. A collection whose listing fails
    /// is counted and skipped; any other error ends the run.
    pub async fn run(&self, settings: &Settings) -> Result<BatchReport> {
        let mut total = BatchReport::default();
        for collection in &settings.subreddits {
            let urls = match self.list(collection, settings.count).await? {
                Ok(urls) => urls,
                Err(e) => {
                    tracing::warn!(collection = %collection, "skipping collection: {:#}", e);
                    total.listing_failures += 1;
                    continue;
                }
            };
            total.merge(self.fetch_urls(collection, urls, &settings.to).await?);
        }
        Ok(total)
    }
}
