//! Creating, opening and saving series stores.

use std::path::{Path, PathBuf};

use super::SeriesStore;
use crate::error::{Result, SimlogError};
use crate::io::SnapshotCodec;
use crate::merge::Series;
use crate::types::SnapshotConfig;

impl<S: Series> SeriesStore<S> {
    /// Start an empty, unsaved series stamped with the configured tag.
    #[must_use]
    pub fn create(config: SnapshotConfig) -> Self {
        let series = S::with_version(&config.version_tag);
        tracing::debug!(
            target = "simlog::snapshot",
            kind = %S::KIND,
            version = %config.version_tag,
            "created series"
        );
        Self {
            series,
            path: None,
            codec: SnapshotCodec::new(config),
        }
    }

    /// Load a snapshot. A tag other than the configured one fails with
    /// [`SimlogError::VersionMismatch`]; the snapshot has to be deleted and rebuilt.
    pub fn open<P: AsRef<Path>>(path: P, config: SnapshotConfig) -> Result<Self> {
        let path = path.as_ref();
        let codec = SnapshotCodec::new(config);
        let series = codec.load(path)?;
        Ok(Self {
            series,
            path: Some(path.to_path_buf()),
            codec,
        })
    }

    /// Load `path` if it exists, otherwise start a fresh series that saves there.
    pub fn open_or_create<P: AsRef<Path>>(path: P, config: SnapshotConfig) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::open(path, config);
        }
        let mut store = Self::create(config);
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Wrap an in-memory series. Its tag is checked on the next append, not here.
    #[must_use]
    pub fn from_series(series: S, config: SnapshotConfig) -> Self {
        Self {
            series,
            path: None,
            codec: SnapshotCodec::new(config),
        }
    }

    /// Persist to the path this store was opened from or last saved to.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(|| SimlogError::InvalidConfig {
            reason: "series store has no snapshot path; use save_to".into(),
        })?;
        self.codec.store(&self.series, path)
    }

    pub fn save_to<P: Into<PathBuf>>(&mut self, path: P) -> Result<()> {
        let path = path.into();
        self.codec.store(&self.series, &path)?;
        self.path = Some(path);
        Ok(())
    }

    /// Fail unless the series was built by this engine version.
    pub(crate) fn ensure_version(&self) -> Result<()> {
        let found = &self.series.manifest().version;
        let expected = &self.codec.config().version_tag;
        if found == expected {
            return Ok(());
        }
        tracing::error!(
            target = "simlog::snapshot",
            found = %found,
            expected = %expected,
            "series version mismatch"
        );
        Err(SimlogError::VersionMismatch {
            found: Some(found.clone()).filter(|tag| !tag.is_empty()),
            expected: expected.clone(),
        })
    }
}
