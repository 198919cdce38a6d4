//! Persistence of the latest strategy document.

use std::ffi::OsString;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::CheckgenError;

/// Handle to the single file holding the most recent strategy.
///
/// Reads and writes go through one lock, so an improvement cannot interleave
/// with another write. Writes land in a sibling temp file first and are
/// renamed over the target.
#[derive(Clone, Debug)]
pub struct StrategyStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl StrategyStore {
    /// Store backed by `path`; the file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Where the strategy lives on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a strategy has been saved
    pub async fn exists(&self) -> Result<bool, CheckgenError> {
        let _guard = self.lock.lock().await;
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    /// Returns the current strategy, or `None` if nothing has been saved.
    pub async fn load(&self) -> Result<Option<String>, CheckgenError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Replaces the strategy.
    #[instrument(skip_all, fields(path = %self.path.display(), len = text.len()))]
    pub async fn save(&self, text: &str) -> Result<(), CheckgenError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(text).await
    }

    /// Reads the strategy, hands it to `revise` and saves what comes back,
    /// holding the lock throughout. Returns `None` without calling `revise`
    /// when there is nothing to revise.
    pub async fn update<F, Fut>(&self, revise: F) -> Result<Option<String>, CheckgenError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String, CheckgenError>>,
    {
        let _guard = self.lock.lock().await;
        let Some(current) = self.read_unlocked().await? else {
            return Ok(None);
        };
        let revised = revise(current).await?;
        self.write_unlocked(&revised).await?;
        Ok(Some(revised))
    }

    async fn read_unlocked(&self) -> Result<Option<String>, CheckgenError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CheckgenError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    async fn write_unlocked(&self, text: &str) -> Result<(), CheckgenError> {
        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, text).await.map_err(|err| {
            CheckgenError::Storage(format!("Failed to write {}: {}", tmp.display(), err))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            CheckgenError::Storage(format!(
                "Failed to move strategy into {}: {}",
                self.path.display(),
                err
            ))
        })?;
        debug!("Saved strategy to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> StrategyStore {
        StrategyStore::new(dir.path().join("current_strategy.txt"))
    }

    #[tokio::test]
    async fn load_is_none_before_first_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(!store.exists().await.expect("exists"));
        assert_eq!(store.load().await.expect("load"), None);
    }

    #[tokio::test]
    async fn save_overwrites_rather_than_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save("first").await.expect("save");
        store.save("second").await.expect("save");
        assert_eq!(store.load().await.expect("load").as_deref(), Some("second"));
        assert!(!dir.path().join("current_strategy.txt.tmp").exists());
    }

    #[tokio::test]
    async fn update_skips_revise_when_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let out = store
            .update(|_| async { Err(CheckgenError::Upstream("revise must not run".into())) })
            .await
            .expect("update");
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn update_persists_the_revision() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save("v1").await.expect("save");
        let out = store
            .update(|current| async move { Ok(format!("{current}+v2")) })
            .await
            .expect("update");
        assert_eq!(out.as_deref(), Some("v1+v2"));
        assert_eq!(store.load().await.expect("load").as_deref(), Some("v1+v2"));
    }

    #[tokio::test]
    async fn failed_revision_leaves_strategy_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save("v1").await.expect("save");
        let err = store
            .update(|_| async { Err(CheckgenError::Upstream("down".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckgenError::Upstream(_)));
        assert_eq!(store.load().await.expect("load").as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn concurrent_updates_run_one_after_another() {
        use tokio::sync::{Notify, oneshot};

        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save("v1").await.expect("save");

        let (started_tx, started_rx) = oneshot::channel();
        let release = Arc::new(Notify::new());

        let first = {
            let store = store.clone();
            let release = release.clone();
            tokio::spawn(async move {
                store
                    .update(|current| async move {
                        let _ = started_tx.send(());
                        release.notified().await;
                        Ok(format!("{current}+a"))
                    })
                    .await
            })
        };
        started_rx.await.expect("first update started");

        let second = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update(|current| async move { Ok(format!("{current}+b")) })
                    .await
            })
        };
        tokio::task::yield_now().await;
        release.notify_one();

        let first = first.await.expect("join first").expect("first update");
        let second = second.await.expect("join second").expect("second update");
        assert_eq!(first.as_deref(), Some("v1+a"));
        assert_eq!(second.as_deref(), Some("v1+a+b"));
        assert_eq!(store.load().await.expect("load").as_deref(), Some("v1+a+b"));
    }
}
