//! Per-request temporary file lifecycle.
//!
//! Every upload owns exactly two paths under the data directory: the staged
//! copy of the raw upload and the encrypted output produced by the external
//! tool. [`TempFiles`] allocates both paths up front (before any fallible
//! I/O) and removes whichever exist when dropped, so no exit path — staging
//! failure, encryption failure, response success, client disconnect — can
//! leak them. Deletion failures are logged and swallowed; they must never
//! mask the response already being sent.

use crate::errors::{Error, Result};
use futures::Stream;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use uuid::Uuid;

/// Scoped guard owning one request's staged and encrypted temp paths.
///
/// The paths are derived from a fresh UUID v4, so concurrent requests never
/// collide without any coordination.
#[derive(Debug)]
pub struct TempFiles {
    staged: PathBuf,
    encrypted: PathBuf,
}

impl TempFiles {
    /// Allocate a unique path pair under `data_dir` without touching the filesystem.
    pub fn allocate(data_dir: &Path) -> Self {
        let id = Uuid::new_v4();
        Self {
            staged: data_dir.join(format!("{id}.pdf")),
            encrypted: data_dir.join(format!("{id}.encrypted.pdf")),
        }
    }

    /// Allocate a path pair and persist the upload bytes to the staged path.
    ///
    /// The guard exists before the write starts, so a partial write is still
    /// cleaned up.
    pub async fn stage(data_dir: &Path, bytes: &[u8]) -> Result<Self> {
        let files = Self::allocate(data_dir);
        tokio::fs::write(&files.staged, bytes)
            .await
            .map_err(|source| Error::Staging { source })?;
        Ok(files)
    }

    /// Path of the staged (raw) upload
    pub fn staged(&self) -> &Path {
        &self.staged
    }

    /// Path the external tool writes the encrypted output to
    pub fn encrypted(&self) -> &Path {
        &self.encrypted
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in [&self.staged, &self.encrypted] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                }
            }
        }
    }
}

/// Byte stream that keeps a [`TempFiles`] guard alive until the transfer ends.
///
/// Used for download responses: the guard is moved into the response body so
/// the temp files are removed when the body is fully sent, the transfer
/// fails, or the client disconnects.
pub struct TempFileStream<S> {
    inner: S,
    _files: TempFiles,
}

impl<S> TempFileStream<S> {
    pub fn new(inner: S, files: TempFiles) -> Self {
        Self { inner, _files: files }
    }
}

impl<S> Stream for TempFileStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn allocated_paths_are_unique_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempFiles::allocate(dir.path());
        let b = TempFiles::allocate(dir.path());
        assert_ne!(a.staged(), b.staged());
        assert_ne!(a.encrypted(), b.encrypted());
    }

    #[test]
    fn paths_carry_expected_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::allocate(dir.path());
        assert!(files.staged().to_str().unwrap().ends_with(".pdf"));
        assert!(files.encrypted().to_str().unwrap().ends_with(".encrypted.pdf"));
        assert!(!files.staged().to_str().unwrap().ends_with(".encrypted.pdf"));
    }

    #[tokio::test]
    async fn stage_writes_upload_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::stage(dir.path(), b"%PDF-1.4 content").await.unwrap();
        let written = tokio::fs::read(files.staged()).await.unwrap();
        assert_eq!(written, b"%PDF-1.4 content");
    }

    #[tokio::test]
    async fn drop_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::stage(dir.path(), b"data").await.unwrap();
        tokio::fs::write(files.encrypted(), b"encrypted").await.unwrap();

        drop(files);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn drop_tolerates_missing_encrypted_output() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::stage(dir.path(), b"data").await.unwrap();
        // Encryption never ran; only the staged file exists
        drop(files);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn stream_cleans_up_after_consumption() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::stage(dir.path(), b"data").await.unwrap();
        tokio::fs::write(files.encrypted(), b"encrypted bytes").await.unwrap();

        let file = tokio::fs::File::open(files.encrypted()).await.unwrap();
        let stream = TempFileStream::new(tokio_util::io::ReaderStream::new(file), files);

        let chunks: Vec<_> = stream.collect().await;
        let body: Vec<u8> = chunks.into_iter().flat_map(|c| c.unwrap().to_vec()).collect();
        assert_eq!(body, b"encrypted bytes");

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn stream_cleans_up_when_dropped_mid_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let files = TempFiles::stage(dir.path(), b"data").await.unwrap();
        tokio::fs::write(files.encrypted(), vec![0u8; 64 * 1024]).await.unwrap();

        let file = tokio::fs::File::open(files.encrypted()).await.unwrap();
        let mut stream = TempFileStream::new(tokio_util::io::ReaderStream::new(file), files);

        // Read a single chunk, then abandon the transfer (client disconnect)
        let _first = stream.next().await;
        drop(stream);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
