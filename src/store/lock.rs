use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{PassrotError, Result};

/// Exclusive advisory lock on the rotation job.
///
/// Held for a whole load → mutate → save cycle so two processes never write
/// the catalog concurrently. Released on drop.
#[derive(Debug)]
pub struct JobLock {
    file: File,
}

impl JobLock {
    /// Block until the lock is ours.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = open(path)?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| PassrotError::Lock(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "rotation lock acquired");
        Ok(Self { file })
    }

    /// Take the lock only if nobody else holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = open(path)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(PassrotError::Lock(format!("{}: {}", path.display(), e))),
        }
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?)
}
