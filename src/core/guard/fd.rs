/*!
 * File Resources
 *
 * File descriptor acquisition with sync-on-release
 */

use super::traits::Resource;
use std::fs::{File, OpenOptions};
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Existing file, read only
    Read,
    /// Existing file, read and write
    Write,
    /// Create or truncate
    Create,
    /// Create if missing, append
    Append,
}

impl FileMode {
    #[inline]
    pub fn is_writable(self) -> bool {
        !matches!(self, FileMode::Read)
    }

    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            FileMode::Read => options.read(true),
            FileMode::Write => options.read(true).write(true),
            FileMode::Create => options.write(true).create(true).truncate(true),
            FileMode::Append => options.append(true).create(true),
        };
        options
    }
}

/// Parameters for opening one file
#[derive(Debug, Clone)]
pub struct FileParams {
    pub path: PathBuf,
    pub mode: FileMode,
}

impl FileParams {
    pub fn new(path: impl Into<PathBuf>, mode: FileMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn read(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileMode::Read)
    }

    pub fn write(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileMode::Write)
    }

    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileMode::Create)
    }

    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileMode::Append)
    }
}

/// Open file handle owned by a guard
#[derive(Debug)]
pub struct OpenFile {
    file: File,
    path: PathBuf,
    mode: FileMode,
}

impl OpenFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }
}

impl Deref for OpenFile {
    type Target = File;

    fn deref(&self) -> &File {
        &self.file
    }
}

impl DerefMut for OpenFile {
    fn deref_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

/// File descriptor with automatic close
///
/// Writable files are flushed to disk with `sync_all` before close unless
/// syncing is disabled; a failed sync is reported as a release error.
///
/// # Example
///
/// ```ignore
/// let files = Arc::new(FileResource::new());
/// let mut guard = ScopedGuard::acquire(&files, FileParams::create("/tmp/out"))?;
/// guard.with(|f| f.write_all(b"data"))??;
/// // Synced and closed on drop
/// ```
#[derive(Debug, Clone)]
pub struct FileResource {
    sync_on_release: bool,
}

impl FileResource {
    pub fn new() -> Self {
        Self {
            sync_on_release: true,
        }
    }

    /// Skip `sync_all` on release
    pub fn without_sync(mut self) -> Self {
        self.sync_on_release = false;
        self
    }
}

impl Default for FileResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for FileResource {
    type Params = FileParams;
    type Handle = OpenFile;
    type Error = io::Error;

    fn kind(&self) -> &'static str {
        "file"
    }

    fn acquire(&self, params: FileParams) -> io::Result<OpenFile> {
        let file = params.mode.options().open(&params.path)?;
        debug!(path = %params.path.display(), mode = ?params.mode, "file opened");

        Ok(OpenFile {
            file,
            path: params.path,
            mode: params.mode,
        })
    }

    fn release(&self, handle: OpenFile) -> io::Result<()> {
        if self.sync_on_release && handle.mode.is_writable() {
            handle.file.sync_all()?;
        }
        debug!(path = %handle.path.display(), "file closed");
        Ok(())
    }
}
