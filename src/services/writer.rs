use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("disk full: {path}")]
    DiskFull { path: PathBuf },

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("I/O error writing {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl WriteError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => WriteError::PermissionDenied { path },
            io::ErrorKind::StorageFull => WriteError::DiskFull { path },
            io::ErrorKind::InvalidInput | io::ErrorKind::NotADirectory => {
                WriteError::InvalidPath {
                    path,
                    reason: err.to_string(),
                }
            }
            _ => WriteError::Io { path, source: err },
        }
    }

    /// Stable short code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::PermissionDenied { .. } => "permission-denied",
            WriteError::DiskFull { .. } => "disk-full",
            WriteError::InvalidPath { .. } => "invalid-path",
            WriteError::Io { .. } => "io-error",
        }
    }
}

/// Materializes one file. Implementations create missing parent directories
/// and overwrite whatever already sits at `destination`. Nothing is retried.
pub trait FileWriter: Send + Sync {
    /// Returns the number of bytes written.
    fn write(&self, destination: &Path, content: &mut dyn Read) -> Result<u64, WriteError>;
}

fn parent_dir(destination: &Path) -> Result<&Path, WriteError> {
    if destination.file_name().is_none() {
        return Err(WriteError::InvalidPath {
            path: destination.to_path_buf(),
            reason: "destination has no file name".to_string(),
        });
    }
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
        _ => Err(WriteError::InvalidPath {
            path: destination.to_path_buf(),
            reason: "destination has no parent directory".to_string(),
        }),
    }
}

/// Streams straight into the final path. A crash mid-write can leave a
/// truncated file behind.
#[derive(Debug, Clone, Default)]
pub struct LocalFsWriter;

impl FileWriter for LocalFsWriter {
    fn write(&self, destination: &Path, content: &mut dyn Read) -> Result<u64, WriteError> {
        let parent = parent_dir(destination)?;
        fs::create_dir_all(parent).map_err(|e| WriteError::from_io(parent, e))?;

        let mut file =
            File::create(destination).map_err(|e| WriteError::from_io(destination, e))?;
        let written =
            io::copy(content, &mut file).map_err(|e| WriteError::from_io(destination, e))?;
        file.sync_all()
            .map_err(|e| WriteError::from_io(destination, e))?;
        Ok(written)
    }
}

/// Writes to a temp file next to the destination and renames it into place,
/// so readers only ever see a complete file.
#[derive(Debug, Clone, Default)]
pub struct AtomicFsWriter;

impl FileWriter for AtomicFsWriter {
    fn write(&self, destination: &Path, content: &mut dyn Read) -> Result<u64, WriteError> {
        let parent = parent_dir(destination)?;
        fs::create_dir_all(parent).map_err(|e| WriteError::from_io(parent, e))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(parent)
            .map_err(|e| WriteError::from_io(parent, e))?;
        let written = io::copy(content, staged.as_file_mut())
            .map_err(|e| WriteError::from_io(destination, e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| WriteError::from_io(destination, e))?;
        staged
            .persist(destination)
            .map_err(|e| WriteError::from_io(destination, e.error))?;
        Ok(written)
    }
}
