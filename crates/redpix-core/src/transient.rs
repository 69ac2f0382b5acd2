//! Transient download files and their promotion to a final name.
//!
//! A `TransientFile` is created with a random 128-bit name in the transient
//! directory and is either promoted (renamed onto the target) or discarded
//! within one fetch. Dropping an unpromoted file deletes it, so every exit path
//! (errors, early returns, unwinding) cleans up after itself.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of every transient file name.
pub const TRANSIENT_PREFIX: &str = "redpix-";
/// Suffix of every transient file name.
pub const TRANSIENT_SUFFIX: &str = ".part";

#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    file: Option<File>,
    armed: bool,
}

impl TransientFile {
    /// Create `redpix-<uuid>.part` in `dir`. Fails rather than reuse an existing name.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let name = format!("{}{}{}", TRANSIENT_PREFIX, uuid::Uuid::new_v4(), TRANSIENT_SUFFIX);
        let path = dir.join(name);
        let file = File::options().write(true).create_new(true).open(&path)?;
        Ok(TransientFile {
            path,
            file: Some(file),
            armed: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle to write downloaded bytes into. Fails once `close` has run.
    pub fn file(&self) -> io::Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "transient file already closed"))
    }

    /// Flush to disk and close the write handle so the bytes can be inspected.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Atomically move the file onto `target`, replacing anything there.
    ///
    /// When the transient directory is on another filesystem the bytes are
    /// first copied into a sibling transient file next to `target`, which is
    /// then renamed, so `target` never exposes a partial write.
    pub fn promote(mut self, target: &Path) -> io::Result<()> {
        self.close()?;
        match std::fs::rename(&self.path, target) {
            Ok(()) => {
                self.armed = false;
                Ok(())
            }
            Err(e) if is_cross_device(&e) => {
                let dir = match target.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p,
                    _ => Path::new("."),
                };
                let mut sibling = TransientFile::create_in(dir)?;
                std::fs::copy(&self.path, &sibling.path)?;
                sibling.file = Some(File::options().write(true).open(&sibling.path)?);
                sibling.promote(target)
                // `self` is dropped here and removes the original.
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the file now, reporting failures instead of swallowing them.
    pub fn discard(mut self) -> io::Result<()> {
        self.file.take();
        self.armed = false;
        std::fs::remove_file(&self.path)
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.file.take();
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove transient file: {}", e);
            }
        }
    }
}

#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(e: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    e.raw_os_error() == Some(17)
}
