//! Short-lived storage for uploaded images.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::distr::{Alphanumeric, SampleString};
use unicode_normalization::UnicodeNormalization;
use tracing::{debug, error};

use crate::constants::{FALLBACK_UPLOAD_NAME, SCRATCH_TOKEN_LENGTH};
use crate::error::CheckgenError;

/// The directory uploads are parked in while a request runs.
#[derive(Clone, Debug)]
pub struct ScratchDir {
    dir: PathBuf,
}

impl ScratchDir {
    /// Wraps `dir`, see [`ScratchDir::ensure`] to create it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the directory if it's missing.
    pub async fn ensure(&self) -> Result<(), CheckgenError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            CheckgenError::Storage(format!(
                "Failed to create scratch dir {}: {}",
                self.dir.display(),
                err
            ))
        })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Starts tracking the files for one request.
    pub fn batch(&self) -> ScratchBatch {
        ScratchBatch {
            dir: self.dir.clone(),
            paths: Vec::new(),
        }
    }
}

/// Files written for a single request.
///
/// Every file is removed by [`ScratchBatch::cleanup`], or on drop if the
/// request never gets that far (error, panic, client hang-up).
#[derive(Debug)]
pub struct ScratchBatch {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl ScratchBatch {
    /// Writes an upload under a collision-free, sanitised name.
    pub async fn save(
        &mut self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, CheckgenError> {
        let path = self.dir.join(scratch_file_name(original_name));
        // tracked before writing so a partial file is still removed
        self.paths.push(path.clone());
        tokio::fs::write(&path, bytes).await.map_err(|err| {
            CheckgenError::Storage(format!("Failed to save upload {}: {}", path.display(), err))
        })?;
        debug!("Saved upload {:?} to {}", original_name, path.display());
        Ok(path)
    }

    /// Paths written so far, in upload order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// True when nothing has been saved
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Removes every file in the batch, logging failures.
    pub async fn cleanup(mut self) {
        for path in std::mem::take(&mut self.paths) {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                log_removal_failure(&path, &err);
            }
        }
    }
}

impl Drop for ScratchBatch {
    // fallback only, `cleanup()` has already emptied `paths` on the normal path
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(err) = std::fs::remove_file(&path) {
                log_removal_failure(&path, &err);
            }
        }
    }
}

fn log_removal_failure(path: &Path, err: &std::io::Error) {
    if err.kind() != ErrorKind::NotFound {
        error!("Error removing file {}: {}", path.display(), err);
    }
}

/// Reduces a client-supplied filename to something safe to join onto a
/// directory: accents folded away (NFKD), ASCII letters, digits, `_`, `.`
/// and `-` only, path separators and whitespace turned into `_`, no leading
/// or trailing dots/underscores.
pub fn sanitize_filename(name: &str) -> String {
    // decompose first so accented letters keep their base character
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `<random token>_<sanitised name>`
pub fn scratch_file_name(original_name: &str) -> String {
    let token = Alphanumeric.sample_string(&mut rand::rng(), SCRATCH_TOKEN_LENGTH);
    let name = sanitize_filename(original_name);
    let name = if name.is_empty() {
        FALLBACK_UPLOAD_NAME
    } else {
        name.as_str()
    };
    format!("{token}_{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_traversal_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename("my cool screenshot.png"), "my_cool_screenshot.png");
        assert_eq!(sanitize_filename("shot<1>?.png"), "shot1.png");
        assert_eq!(sanitize_filename("écran.png"), "ecran.png");
        assert_eq!(sanitize_filename("Résumé Übersicht.png"), "Resume_Ubersicht.png");
        assert_eq!(sanitize_filename("ﬁle.png"), "file.png");
        assert_eq!(sanitize_filename("截图.png"), "png");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn scratch_names_are_unique_and_never_empty() {
        let a = scratch_file_name("shot.png");
        let b = scratch_file_name("shot.png");
        assert_ne!(a, b);
        assert!(a.ends_with("_shot.png"));
        assert_eq!(a.len(), SCRATCH_TOKEN_LENGTH + "_shot.png".len());
        assert!(scratch_file_name("../..").ends_with("_upload"));
    }

    #[tokio::test]
    async fn traversal_names_stay_inside_the_scratch_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = ScratchDir::new(dir.path());
        let mut batch = scratch.batch();
        let path = batch
            .save("../../etc/passwd", b"data")
            .await
            .expect("save");
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.exists());
        batch.cleanup().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_a_batch_removes_its_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = ScratchDir::new(dir.path());
        let saved = {
            let mut batch = scratch.batch();
            let first = batch.save("a.png", b"1").await.expect("save");
            let second = batch.save("b.png", b"2").await.expect("save");
            vec![first, second]
        };
        for path in saved {
            assert!(!path.exists());
        }
        let mut entries = tokio::fs::read_dir(dir.path()).await.expect("read_dir");
        assert!(entries.next_entry().await.expect("entry").is_none());
    }

    #[tokio::test]
    async fn ensure_creates_nested_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = ScratchDir::new(dir.path().join("a").join("b"));
        scratch.ensure().await.expect("ensure");
        assert!(scratch.path().is_dir());
    }
}
