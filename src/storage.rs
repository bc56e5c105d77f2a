//! Persistence of decoded files.
//!
//! The connection driver hands every completed [`FileFrame`] to a
//! [`FileSink`]. The server uses [`DiskStore`], which writes each file into
//! a configured output directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::frame::FileFrame;

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Destination for decoded files.
pub trait FileSink {
    /// Persists `frame` and returns the number of bytes written.
    fn store(&self, frame: &FileFrame) -> impl Future<Output = Result<u64, StorageError>> + Send;
}

/// Writes files under a fixed output directory.
///
/// The filename is joined verbatim; it is not checked for path separators.
#[derive(Debug, Clone)]
pub struct DiskStore {
    output_dir: Arc<PathBuf>,
}

impl DiskStore {
    /// Creates the output directory if needed and returns a store rooted there.
    pub async fn open(output_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| StorageError {
                path: output_dir.clone(),
                source,
            })?;

        Ok(Self {
            output_dir: Arc::new(output_dir),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

impl FileSink for DiskStore {
    async fn store(&self, frame: &FileFrame) -> Result<u64, StorageError> {
        let path = self.path_for(&frame.file_name);
        match tokio::fs::write(&path, &frame.content).await {
            Ok(()) => Ok(frame.content.len() as u64),
            Err(source) => Err(StorageError { path, source }),
        }
    }
}
