//! Scoped temporary storage for extraction output.
//!
//! Every extraction gets its own directory from a [`ScratchSpace`]. The
//! directory is handed out wrapped in a [`ScratchDir`], which deletes it when
//! dropped unless the caller explicitly keeps it.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// Allocates and reclaims unique scratch directories.
pub trait ScratchSpace: Send + Sync + fmt::Debug {
    /// Creates a fresh, empty, uniquely named directory and returns its
    /// canonical path.
    fn allocate(&self) -> io::Result<PathBuf>;

    /// Recursively deletes a directory previously returned by
    /// [`allocate`](Self::allocate). Releasing a directory that no longer
    /// exists succeeds.
    fn release(&self, path: &Path) -> io::Result<()>;
}

/// [`ScratchSpace`] backed by `tempfile` under a fixed root directory.
#[derive(Debug, Clone)]
pub struct TempScratch {
    root: PathBuf,
    prefix: String,
}

impl TempScratch {
    /// Default directory name prefix.
    pub const DEFAULT_PREFIX: &'static str = "proto-";

    /// Creates scratch storage under `root`. The root is created on first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    /// Creates scratch storage under the system temporary directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Sets the directory name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Root under which directories are allocated.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ScratchSpace for TempScratch {
    fn allocate(&self) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&self.root)?
            .keep();
        dir.canonicalize()
    }

    fn release(&self, path: &Path) -> io::Result<()> {
        let root = self.root.canonicalize()?;
        let target = match path.canonicalize() {
            Ok(target) => target,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if target == root || !target.starts_with(&root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "refusing to delete {} outside scratch root {}",
                    target.display(),
                    root.display()
                ),
            ));
        }

        match fs::remove_dir_all(&target) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// A scratch directory that is released when dropped.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use protolane_core::{ScratchDir, ScratchSpace, TempScratch};
///
/// # fn main() -> std::io::Result<()> {
/// let root = tempfile::tempdir()?;
/// let space: Arc<dyn ScratchSpace> = Arc::new(TempScratch::new(root.path()));
///
/// let dir = ScratchDir::allocate(&space)?;
/// let path = dir.path().to_path_buf();
/// assert!(path.is_dir());
///
/// drop(dir);
/// assert!(!path.exists());
/// # Ok(())
/// # }
/// ```
pub struct ScratchDir {
    path: PathBuf,
    space: Arc<dyn ScratchSpace>,
    released: bool,
}

impl ScratchDir {
    /// Allocates a new directory from `space`.
    pub fn allocate(space: &Arc<dyn ScratchSpace>) -> io::Result<Self> {
        let path = space.allocate()?;
        tracing::debug!(path = %path.display(), "allocated scratch directory");
        Ok(Self {
            path,
            space: Arc::clone(space),
            released: false,
        })
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the directory now, reporting any deletion error.
    pub fn close(mut self) -> io::Result<()> {
        self.released = true;
        self.space.release(&self.path)
    }

    /// Detaches the directory so it survives this handle.
    pub fn keep(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }
}

impl fmt::Debug for ScratchDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchDir")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.space.release(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to release scratch directory"
            );
        }
    }
}
