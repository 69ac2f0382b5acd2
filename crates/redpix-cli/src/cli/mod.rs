//! CLI for the redpix subreddit image downloader.

mod run;

use anyhow::Result;
use clap::Parser;
use redpix_core::settings::{self, FileConfig, Settings, SettingsOverrides};
use std::path::{Path, PathBuf};

/// Exit status when the run started but hit a fatal error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for bad configuration; nothing was downloaded.
pub const EXIT_CONFIG: i32 = 2;

/// Download the top images of one or more subreddits.
///
/// Every option can also be given through the environment variable shown, or
/// in ~/.config/redpix/config.toml.
#[derive(Debug, Parser)]
#[command(name = "redpix")]
#[command(about = "redpix: download top subreddit images", long_about = None)]
pub struct Cli {
    /// Comma-separated subreddits, e.g. FractalPorn,ExposurePorn.
    #[arg(short, long, env = "REDPIX_SUBREDDITS")]
    pub subreddits: Option<String>,

    /// Posts to read per subreddit [default: 1].
    #[arg(short, long, env = "REDPIX_COUNT")]
    pub count: Option<usize>,

    /// Output directory [default: .].
    #[arg(short, long, env = "REDPIX_TO")]
    pub to: Option<String>,

    /// Bot name sent in the User-Agent.
    #[arg(short, long, env = "REDPIX_BOTNAME")]
    pub botname: Option<String>,

    /// Comma-separated image formats to keep [default: jpeg,png].
    #[arg(short, long, env = "REDPIX_FILETYPES")]
    pub filetypes: Option<String>,

    /// portrait, landscape or both [default: both].
    #[arg(short, long, env = "REDPIX_ORIENTATION")]
    pub orientation: Option<String>,

    /// Comma-separated URL extensions treated as image links [default: jpg,jpeg,png].
    #[arg(long, env = "REDPIX_EXTENSIONS")]
    pub extensions: Option<String>,

    /// Download up to N images concurrently [default: 1].
    #[arg(short, long, env = "REDPIX_JOBS", value_name = "N")]
    pub jobs: Option<usize>,

    /// Per-download timeout in seconds [default: 120].
    #[arg(long, env = "REDPIX_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Base URL of the listing API [default: https://www.reddit.com].
    #[arg(long, env = "REDPIX_LISTING_URL", value_name = "URL")]
    pub listing_url: Option<String>,

    /// Read this config file instead of the XDG one.
    #[arg(long, env = "REDPIX_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            subreddits: self.subreddits.clone(),
            count: self.count,
            to: self.to.clone(),
            botname: self.botname.clone(),
            filetypes: self.filetypes.clone(),
            orientation: self.orientation.clone(),
            extensions: self.extensions.clone(),
            jobs: self.jobs,
            timeout_secs: self.timeout,
            listing_url: self.listing_url.clone(),
        }
    }

    /// Load the config file, apply overrides, and validate. No network access.
    pub fn load_settings(&self) -> Result<Settings> {
        match &self.config {
            Some(_) => self.load_settings_with(None),
            None => self.load_settings_with(Some(settings::config_path()?.as_path())),
        }
    }

    /// `default_config` is read when no `--config` was given, and a default file
    /// is written there only once the settings have validated.
    fn load_settings_with(&self, default_config: Option<&Path>) -> Result<Settings> {
        let file = match (&self.config, default_config) {
            (Some(path), _) => settings::load_from(path)?,
            (None, Some(path)) => settings::load_or_default(path)?,
            (None, None) => FileConfig::default(),
        };
        let resolved = Settings::resolve(self.overrides(), file)?;
        resolved.check_dirs()?;
        if let (None, Some(path)) = (&self.config, default_config) {
            if let Err(e) = settings::init_default(path) {
                tracing::warn!("could not write default config: {:#}", e);
            }
        }
        Ok(resolved)
    }
}

/// Parse arguments, run, and return the process exit status.
pub async fn run_from_args() -> i32 {
    let cli = Cli::parse();

    let settings = match cli.load_settings() {
        Ok(s) => s,
        Err(err) => {
            tracing::error!("configuration error: {:#}", err);
            eprintln!("redpix error: {:#}", err);
            return EXIT_CONFIG;
        }
    };
    tracing::debug!("resolved settings: {:?}", settings);

    match run::run_download(&settings).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!("run failed: {:#}", err);
            eprintln!("redpix error: {:#}", err);
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
