//! Target filename derivation from a source collection and URL.

use std::path::PathBuf;

/// Text after the final `/` of `url`, with at most one leading `.` removed.
///
/// Listing data sometimes carries URLs like `http://host/.image.jpeg`; only that
/// single dot is stripped, anything else is kept verbatim.
pub fn url_basename(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.strip_prefix('.').unwrap_or(last)
}

/// `<target_dir>/<collection>_<basename>` with trailing `/` removed from `target_dir`.
pub fn target_filename(target_dir: &str, collection: &str, url: &str) -> PathBuf {
    let dir = target_dir.trim_end_matches('/');
    PathBuf::from(format!("{}/{}_{}", dir, collection, url_basename(url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_single_leading_dot() {
        assert_eq!(url_basename("http://example.org/.image.jpeg"), "image.jpeg");
        assert_eq!(url_basename("http://example.org/..image.jpeg"), ".image.jpeg");
        assert_eq!(url_basename("http://example.org/a/b/c.png"), "c.png");
    }

    #[test]
    fn target_filename_layout() {
        assert_eq!(
            target_filename("target_directory", "subreddit_name", "http://example.org/.image.jpeg"),
            PathBuf::from("target_directory/subreddit_name_image.jpeg")
        );
        assert_eq!(
            target_filename("/home/u/backgrounds/", "FractalPorn", "http://x.org/b.png"),
            PathBuf::from("/home/u/backgrounds/FractalPorn_b.png")
        );
        assert_eq!(
            target_filename("out//", "EarthPorn", "https://i.redd.it/xyz.jpg"),
            PathBuf::from("out/EarthPorn_xyz.jpg")
        );
    }

    #[test]
    fn target_filename_is_deterministic() {
        let a = target_filename("/tmp/out", "pics", "https://i.redd.it/q1.png");
        let b = target_filename("/tmp/out", "pics", "https://i.redd.it/q1.png");
        assert_eq!(a, b);
    }
}
