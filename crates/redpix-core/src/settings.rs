//! Run settings: config file, command-line/env overrides, and validation.
//!
//! Precedence is command line, then environment (both arrive through
//! `SettingsOverrides`), then `~/.config/redpix/config.toml`, then built-in
//! defaults. The result is an immutable `Settings` built once per run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::DownloadOptions;
use crate::fetcher::ImageFetcher;
use crate::listing::DEFAULT_REDDIT_BASE;
use crate::url_filter::{UrlFilter, DEFAULT_EXTENSIONS};
use crate::validate::{
    ContentValidator, ImageKind, Orientation, ParseKindError, ParseOrientationError, DEFAULT_KINDS,
};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Subreddits to read when none are given on the command line.
    pub subreddits: Vec<String>,
    /// Posts to read per subreddit.
    pub count: usize,
    /// Output directory.
    pub to: String,
    /// Bot name, sent in the User-Agent.
    pub botname: String,
    /// Allowed image encodings, checked against file contents.
    pub filetypes: Vec<ImageKind>,
    pub orientation: Orientation,
    /// URL extensions that mark a link as a probable image.
    pub extensions: Vec<String>,
    /// URLs processed concurrently per subreddit.
    pub jobs: usize,
    /// Per-download timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL of the listing API.
    pub listing_url: String,
    /// Where transient downloads live; system temp dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient_dir: Option<PathBuf>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            subreddits: Vec::new(),
            count: 1,
            to: ".".to_string(),
            botname: ".".to_string(),
            filetypes: DEFAULT_KINDS.to_vec(),
            orientation: Orientation::Both,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            jobs: 1,
            timeout_secs: 120,
            listing_url: DEFAULT_REDDIT_BASE.to_string(),
            transient_dir: None,
        }
    }
}

/// Values supplied on the command line or through the environment.
/// List-valued options are comma-separated strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub subreddits: Option<String>,
    pub count: Option<usize>,
    pub to: Option<String>,
    pub botname: Option<String>,
    pub filetypes: Option<String>,
    pub orientation: Option<String>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub listing_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no subreddits given (use --subreddits or set them in the config file)")]
    MissingSubreddits,
    #[error(transparent)]
    Orientation(#[from] ParseOrientationError),
    #[error(transparent)]
    FileType(#[from] ParseKindError),
    #[error("at least one file type is required")]
    NoFileTypes,
    #[error("at least one URL extension is required")]
    NoExtensions,
    #[error("jobs must be at least 1")]
    ZeroJobs,
    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("invalid listing url {0:?}")]
    ListingUrl(String),
    #[error("{what} {} does not exist or is not a directory", .path.display())]
    MissingDirectory { what: &'static str, path: PathBuf },
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub subreddits: Vec<String>,
    pub count: usize,
    pub to: String,
    pub botname: String,
    pub filetypes: Vec<ImageKind>,
    pub orientation: Orientation,
    pub extensions: Vec<String>,
    pub jobs: usize,
    pub timeout: Duration,
    pub listing_url: String,
    pub transient_dir: PathBuf,
}

impl Settings {
    /// Merge overrides onto the file config and validate the result.
    pub fn resolve(overrides: SettingsOverrides, file: FileConfig) -> Result<Self, SettingsError> {
        let subreddits = match overrides.subreddits {
            Some(csv) => split_csv(&csv),
            None => file.subreddits.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        };
        if subreddits.is_empty() {
            return Err(SettingsError::MissingSubreddits);
        }

        let orientation = match overrides.orientation {
            Some(o) => o.parse()?,
            None => file.orientation,
        };

        let mut filetypes = match overrides.filetypes {
            Some(csv) => split_csv(&csv)
                .iter()
                .map(|s| s.parse::<ImageKind>())
                .collect::<Result<Vec<_>, _>>()?,
            None => file.filetypes,
        };
        filetypes.sort();
        filetypes.dedup();
        if filetypes.is_empty() {
            return Err(SettingsError::NoFileTypes);
        }

        let extensions = match overrides.extensions {
            Some(csv) => split_csv(&csv),
            None => file.extensions,
        };
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if extensions.is_empty() {
            return Err(SettingsError::NoExtensions);
        }

        let jobs = overrides.jobs.unwrap_or(file.jobs);
        if jobs == 0 {
            return Err(SettingsError::ZeroJobs);
        }
        let timeout_secs = overrides.timeout_secs.unwrap_or(file.timeout_secs);
        if timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }

        let listing_url = overrides.listing_url.unwrap_or(file.listing_url);
        if url::Url::parse(&listing_url).is_err() {
            return Err(SettingsError::ListingUrl(listing_url));
        }

        Ok(Settings {
            subreddits,
            count: overrides.count.unwrap_or(file.count),
            to: overrides.to.unwrap_or(file.to),
            botname: overrides.botname.unwrap_or(file.botname),
            filetypes,
            orientation,
            extensions,
            jobs,
            timeout: Duration::from_secs(timeout_secs),
            listing_url,
            transient_dir: file.transient_dir.unwrap_or_else(std::env::temp_dir),
        })
    }

    /// Output and transient directories must already exist; nothing is created for the user.
    pub fn check_dirs(&self) -> Result<(), SettingsError> {
        let dirs = [
            ("output directory", PathBuf::from(&self.to)),
            ("transient directory", self.transient_dir.clone()),
        ];
        for (what, path) in dirs {
            if !path.is_dir() {
                return Err(SettingsError::MissingDirectory { what, path });
            }
        }
        Ok(())
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            timeout: self.timeout,
            ..DownloadOptions::default()
        }
    }

    /// Orchestrator configured from these settings.
    pub fn fetcher(&self) -> ImageFetcher {
        ImageFetcher::new(
            UrlFilter::new(self.extensions.iter().cloned()),
            ContentValidator::new(self.filetypes.iter().copied(), self.orientation),
            self.download_options(),
            self.transient_dir.clone(),
        )
    }
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Location of `config.toml` under the XDG config dir. Nothing is created.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("redpix")?;
    Ok(xdg_dirs.get_config_file("config.toml"))
}

/// Load `path`, or fall back to defaults when it does not exist yet. Never writes.
pub fn load_or_default(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    load_from(path)
}

/// Write a default config to `path` unless one is already there.
/// Returns whether a file was created.
pub fn init_default(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let toml = toml::to_string_pretty(&FileConfig::default())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
    tracing::info!("created default config at {}", path.display());
    Ok(true)
}

pub fn load_from(path: &Path) -> Result<FileConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&data).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_subs() -> SettingsOverrides {
        SettingsOverrides {
            subreddits: Some("FractalPorn, ExposurePorn".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply() {
        let s = Settings::resolve(with_subs(), FileConfig::default()).unwrap();
        assert_eq!(s.subreddits, vec!["FractalPorn", "ExposurePorn"]);
        assert_eq!(s.count, 1);
        assert_eq!(s.to, ".");
        assert_eq!(s.botname, ".");
        assert_eq!(s.filetypes, vec![ImageKind::Jpeg, ImageKind::Png]);
        assert_eq!(s.orientation, Orientation::Both);
        assert_eq!(s.extensions, vec!["jpg", "jpeg", "png"]);
        assert_eq!(s.jobs, 1);
        assert_eq!(s.timeout, Duration::from_secs(120));
    }

    #[test]
    fn missing_subreddits_is_an_error() {
        let err = Settings::resolve(SettingsOverrides::default(), FileConfig::default()).unwrap_err();
        assert!(matches!(err, SettingsError::MissingSubreddits));
        let err = Settings::resolve(
            SettingsOverrides {
                subreddits: Some(" , ".to_string()),
                ..Default::default()
            },
            FileConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::MissingSubreddits));
    }

    #[test]
    fn invalid_orientation_is_an_error() {
        let o = SettingsOverrides {
            orientation: Some("diagonal".to_string()),
            ..with_subs()
        };
        let err = Settings::resolve(o, FileConfig::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Orientation(_)));
        assert!(err.to_string().contains("portrait, landscape, both"));
    }

    #[test]
    fn unknown_filetype_is_an_error() {
        let o = SettingsOverrides {
            filetypes: Some("jpeg, exe".to_string()),
            ..with_subs()
        };
        assert!(matches!(
            Settings::resolve(o, FileConfig::default()).unwrap_err(),
            SettingsError::FileType(_)
        ));
    }

    #[test]
    fn overrides_beat_file_values() {
        let file = FileConfig {
            subreddits: vec!["EarthPorn".to_string()],
            count: 7,
            to: "/srv/wallpapers".to_string(),
            orientation: Orientation::Portrait,
            jobs: 2,
            ..FileConfig::default()
        };
        let s = Settings::resolve(SettingsOverrides::default(), file.clone()).unwrap();
        assert_eq!(s.subreddits, vec!["EarthPorn"]);
        assert_eq!(s.count, 7);
        assert_eq!(s.to, "/srv/wallpapers");
        assert_eq!(s.orientation, Orientation::Portrait);
        assert_eq!(s.jobs, 2);

        let o = SettingsOverrides {
            count: Some(3),
            to: Some("out".to_string()),
            orientation: Some("landscape".to_string()),
            filetypes: Some("png,jpg,png".to_string()),
            extensions: Some(".png, jpg".to_string()),
            ..with_subs()
        };
        let s = Settings::resolve(o, file).unwrap();
        assert_eq!(s.subreddits, vec!["FractalPorn", "ExposurePorn"]);
        assert_eq!(s.count, 3);
        assert_eq!(s.to, "out");
        assert_eq!(s.orientation, Orientation::Landscape);
        assert_eq!(s.filetypes, vec![ImageKind::Jpeg, ImageKind::Png]);
        assert_eq!(s.extensions, vec!["png", "jpg"]);
    }

    #[test]
    fn zero_jobs_and_timeout_rejected() {
        let o = SettingsOverrides {
            jobs: Some(0),
            ..with_subs()
        };
        assert!(matches!(Settings::resolve(o, FileConfig::default()).unwrap_err(), SettingsError::ZeroJobs));
        let o = SettingsOverrides {
            timeout_secs: Some(0),
            ..with_subs()
        };
        assert!(matches!(Settings::resolve(o, FileConfig::default()).unwrap_err(), SettingsError::ZeroTimeout));
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            subreddits = ["FractalPorn"]
            count = 5
            to = "~/backgrounds"
            filetypes = ["jpg", "png", "webp"]
            orientation = "landscape"
            jobs = 4
        "#;
        let cfg: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.subreddits, vec!["FractalPorn"]);
        assert_eq!(cfg.count, 5);
        assert_eq!(cfg.filetypes, vec![ImageKind::Jpeg, ImageKind::Png, ImageKind::Webp]);
        assert_eq!(cfg.orientation, Orientation::Landscape);
        assert_eq!(cfg.jobs, 4);
        assert_eq!(cfg.botname, ".");
        assert!(cfg.transient_dir.is_none());
    }

    #[test]
    fn config_toml_bad_orientation_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "orientation = \"sideways\"\n").unwrap();
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn default_config_writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, toml::to_string_pretty(&FileConfig::default()).unwrap()).unwrap();
        assert_eq!(load_from(&path).unwrap(), FileConfig::default());
    }

    #[test]
    fn check_dirs_requires_existing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = Settings::resolve(with_subs(), FileConfig::default()).unwrap();
        s.to = dir.path().to_string_lossy().into_owned();
        s.transient_dir = dir.path().to_path_buf();
        s.check_dirs().unwrap();

        s.to = dir.path().join("missing").to_string_lossy().into_owned();
        let err = s.check_dirs().unwrap_err();
        assert!(matches!(err, SettingsError::MissingDirectory { what: "output directory", .. }));
    }

    #[test]
    fn fetcher_uses_configured_filters() {
        let o = SettingsOverrides {
            extensions: Some("gif".to_string()),
            orientation: Some("portrait".to_string()),
            ..with_subs()
        };
        let s = Settings::resolve(o, FileConfig::default()).unwrap();
        let f = s.fetcher();
        assert!(f.filter().is_image("http://example.org/a.gif"));
        assert!(!f.filter().is_image("http://example.org/a.jpg"));
        assert_eq!(f.validator().orientation(), Orientation::Portrait);
    }

    #[test]
    fn load_or_default_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redpix").join("config.toml");
        assert_eq!(load_or_default(&path).unwrap(), FileConfig::default());
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn init_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redpix").join("config.toml");
        assert!(init_default(&path).unwrap());
        assert_eq!(load_or_default(&path).unwrap(), FileConfig::default());

        fs::write(&path, "count = 9\n").unwrap();
        assert!(!init_default(&path).unwrap());
        assert_eq!(load_from(&path).unwrap().count, 9);
    }
}
