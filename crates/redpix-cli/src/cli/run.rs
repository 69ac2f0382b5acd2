//! Download run: build the listing source and batch driver, then report.

use anyhow::Result;
use redpix_core::{ImageDownloader, RedditListing, Settings};
use std::sync::Arc;

pub async fn run_download(settings: &Settings) -> Result<()> {
    let listing = RedditListing::new(&settings.listing_url, &settings.botname, settings.download_options())?;
    let downloader = ImageDownloader::new(Arc::new(listing), settings.fetcher(), settings.jobs);

    let report = downloader.run(settings).await?;
    println!(
        "{} saved, {} discarded, {} skipped, {} failed",
        report.promoted, report.discarded, report.skipped, report.failed
    );
    if report.listing_failures > 0 {
        println!("{} subreddit listing(s) could not be read", report.listing_failures);
    }
    Ok(())
}
