//! Fetch a collection's URLs with bounded concurrency.
//!
//! Keeps up to `max_concurrent` fetches running at once on the blocking pool;
//! when one finishes, the next URL is started until the list is exhausted.

use anyhow::Result;
use std::sync::Arc;

use super::BatchReport;
use crate::fetcher::{FetchError, ImageFetcher};

/// A fatal error stops new URLs from starting; fetches already in flight are
/// allowed to finish (so none leaves a transient file behind) before the first
/// fatal error is returned.
pub(super) async fn fetch_all_parallel(
    fetcher: &Arc<ImageFetcher>,
    urls: Vec<String>,
    target_dir: &str,
    collection: &str,
    max_concurrent: usize,
) -> Result<BatchReport> {
    let max_concurrent = max_concurrent.max(1);
    let mut pending = urls.into_iter();
    let mut join_set = tokio::task::JoinSet::new();
    let mut report = BatchReport::default();
    let mut fatal: Option<FetchError> = None;

    loop {
        while fatal.is_none() && join_set.len() < max_concurrent {
            let Some(url) = pending.next() else {
                break;
            };
            let fetcher = Arc::clone(fetcher);
            let target_dir = target_dir.to_string();
            let collection = collection.to_string();
            join_set.spawn_blocking(move || fetcher.fetch(&url, &target_dir, &collection));
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        let result = res.map_err(|e| anyhow::anyhow!("fetch task join: {}", e))?;
        if let Err(e) = report.record(result) {
            tracing::error!("stopping batch: {}", e);
            fatal.get_or_insert(e);
        }
    }

    match fatal {
        Some(e) => Err(e.into()),
        None => Ok(report),
    }
}
