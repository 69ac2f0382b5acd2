//! Fetch-validate-persist for a single URL.
//!
//! Each call walks `filtered -> downloaded -> verified -> promoted | discarded`
//! exactly once. There are no retries and no state shared between calls, so an
//! `ImageFetcher` can be used from many threads at once.

use std::path::{Path, PathBuf};

use crate::download::{self, DownloadError, DownloadOptions};
use crate::transient::TransientFile;
use crate::url_filter::{self, UrlFilter};
use crate::validate::{ContentValidator, Orientation};

/// How one URL ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rejected by the syntactic filter; nothing was downloaded.
    Skipped,
    /// Downloaded bytes were not an acceptable image and were deleted.
    Discarded,
    /// Verified image now lives at this path.
    Promoted(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure for this URL only; other URLs are unaffected.
    #[error("download {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: DownloadError,
    },
    /// Creating, inspecting, renaming or deleting files failed.
    #[error("{action} {}: {source}", .path.display())]
    Persist {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether the batch should stop. Only filesystem failures are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Persist { .. })
    }
}

/// Downloads one URL, verifies it, and either keeps or deletes it.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    filter: UrlFilter,
    validator: ContentValidator,
    download: DownloadOptions,
    transient_dir: PathBuf,
}

impl ImageFetcher {
    pub fn new(
        filter: UrlFilter,
        validator: ContentValidator,
        download: DownloadOptions,
        transient_dir: PathBuf,
    ) -> Self {
        Self {
            filter,
            validator,
            download,
            transient_dir,
        }
    }

    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    pub fn validator(&self) -> &ContentValidator {
        &self.validator
    }

    /// Runs the whole pipeline for `url`, promoting to
    /// `<target_dir>/<collection>_<basename>` on success.
    ///
    /// The transient file never outlives this call, whatever the outcome.
    pub fn fetch(
        &self,
        url: &str,
        target_dir: &str,
        collection: &str,
    ) -> Result<FetchOutcome, FetchError> {
        if !self.filter.is_image(url) {
            tracing::debug!(url, "skipped: not an image url");
            return Ok(FetchOutcome::Skipped);
        }

        let mut transient =
            TransientFile::create_in(&self.transient_dir).map_err(|source| FetchError::Persist {
                action: "create transient file in",
                path: self.transient_dir.clone(),
                source,
            })?;

        let file = transient
            .file()
            .map_err(|source| persist("write", transient.path(), source))?;
        let bytes = download::download_to(url, file, &self.download).map_err(|source| {
            FetchError::Download {
                url: url.to_string(),
                source,
            }
        })?;
        transient.close().map_err(|source| persist("sync", transient.path(), source))?;
        tracing::debug!(url, bytes, path = %transient.path().display(), "downloaded");

        let target = url_filter::target_filename(target_dir, collection, url);
        if self.verify(transient.path())? {
            transient
                .promote(&target)
                .map_err(|source| persist("promote to", &target, source))?;
            tracing::info!(url, path = %target.display(), "saved image");
            Ok(FetchOutcome::Promoted(target))
        } else {
            let path = transient.path().to_path_buf();
            transient
                .discard()
                .map_err(|source| persist("remove", &path, source))?;
            tracing::info!(url, "discarded: not an acceptable image");
            Ok(FetchOutcome::Discarded)
        }
    }

    /// Format check always; orientation check only when a constraint is set.
    fn verify(&self, path: &Path) -> Result<bool, FetchError> {
        let inspect = |r: anyhow::Result<bool>| {
            r.map_err(|e| {
                persist(
                    "inspect",
                    path,
                    std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)),
                )
            })
        };
        if !inspect(self.validator.is_image(path))? {
            return Ok(false);
        }
        if self.validator.orientation() == Orientation::Both {
            return Ok(true);
        }
        let ok = inspect(self.validator.is_orientation_ok(path))?;
        if !ok {
            tracing::debug!(path = %path.display(), orientation = %self.validator.orientation(), "wrong orientation");
        }
        Ok(ok)
    }
}

fn persist(action: &'static str, path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Persist {
        action,
        path: path.to_path_buf(),
        source,
    }
}
