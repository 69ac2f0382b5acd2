//! Single-stream HTTP GET into a local file.
//!
//! Blocking; call from `spawn_blocking` when used from async code. No retries:
//! a failed transfer is reported once and the caller decides what to do.

use std::fs::File;
use std::io::{self, Write};
use std::time::Duration;

/// Transfer settings shared by every download in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Upper bound on the whole transfer.
    pub timeout: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("redpix/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the body to disk failed; the transfer was aborted.
    #[error("write: {0}")]
    Write(#[source] io::Error),
}

/// GETs `url` and writes the body into `out`. Returns the number of bytes written.
pub fn download_to(url: &str, out: &File, opts: &DownloadOptions) -> Result<u64, DownloadError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(&opts.user_agent)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;

    let mut written = 0u64;
    let mut write_err: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let mut w: &File = out;
            match w.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.perform()
    };
    if let Some(e) = write_err {
        return Err(DownloadError::Write(e));
    }
    performed?;

    let code = easy.response_code()?;
    let is_http = url.starts_with("http://") || url.starts_with("https://");
    if is_http && !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }
    Ok(written)
}

/// GETs `url` into memory. Used for small documents such as listing JSON.
pub fn get_bytes(url: &str, opts: &DownloadOptions) -> Result<Vec<u8>, DownloadError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(&opts.user_agent)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    easy.accept_encoding("")?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }
    Ok(body)
}
