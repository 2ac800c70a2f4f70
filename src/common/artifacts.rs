use bytes::Bytes;
use futures_util::Stream;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;
use tracing::warn;
use uuid::Uuid;

/// One temporary file under the system temp directory. The path embeds the
/// job id plus a role tag, never anything derived from user input, so
/// concurrent jobs cannot collide and traversal is impossible by
/// construction.
///
/// Release happens exactly once: explicitly via [`release`](Self::release) or
/// implicitly on drop, whichever comes first. A missing file counts as
/// released; any other deletion failure is logged and swallowed so it can
/// never mask the result already sent to the caller.
#[derive(Debug)]
pub struct ArtifactHandle {
    path: PathBuf,
    released: bool,
}

impl ArtifactHandle {
    pub fn allocate(job_id: Uuid, role: &str, extension: &str) -> Self {
        let ext = sanitize_extension(extension);
        Self {
            path: std::env::temp_dir().join(format!("{}_{}.{}", job_id, role, ext)),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temp artifact {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Extensions come from plans (static) or from a declared filename; either
/// way only a short alphanumeric tail is ever trusted.
fn sanitize_extension(extension: &str) -> String {
    let ext: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    if ext.is_empty() { "bin".to_string() } else { ext }
}

/// Streams the output artifact to the response body while keeping its handle
/// alive. When the stream is dropped -- end of body, encoder output fully
/// sent, or the client hanging up mid-transfer -- the handle drops with it
/// and the file is released.
pub struct ArtifactStream {
    inner: ReaderStream<tokio::fs::File>,
    _artifact: ArtifactHandle,
}

impl ArtifactStream {
    pub async fn open(artifact: ArtifactHandle) -> io::Result<Self> {
        let file = tokio::fs::File::open(artifact.path()).await?;
        Ok(Self {
            inner: ReaderStream::new(file),
            _artifact: artifact,
        })
    }
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_under_temp_dir_with_safe_extension() {
        let id = Uuid::new_v4();
        let handle = ArtifactHandle::allocate(id, "input", "../../etc");
        assert!(handle.path().starts_with(std::env::temp_dir()));
        let name = handle.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("{}_input.etc", id));
    }

    #[test]
    fn empty_extension_defaults_to_bin() {
        let handle = ArtifactHandle::allocate(Uuid::new_v4(), "input", "///");
        assert!(handle.path().to_string_lossy().ends_with(".bin"));
    }

    #[test]
    fn release_is_idempotent_and_tolerates_missing_file() {
        let mut handle = ArtifactHandle::allocate(Uuid::new_v4(), "output", "mp4");
        // Never created on disk; both calls must be no-ops.
        handle.release();
        handle.release();
    }

    #[test]
    fn drop_removes_the_file() {
        let handle = ArtifactHandle::allocate(Uuid::new_v4(), "output", "tmp");
        let path = handle.path().to_path_buf();
        std::fs::write(&path, b"bytes").unwrap();
        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn explicit_release_removes_the_file_once() {
        let mut handle = ArtifactHandle::allocate(Uuid::new_v4(), "input", "tmp");
        let path = handle.path().to_path_buf();
        std::fs::write(&path, b"bytes").unwrap();
        handle.release();
        assert!(!path.exists());
        // Second release after the file is gone must stay silent.
        handle.release();
    }

    #[tokio::test]
    async fn stream_drop_releases_the_artifact() {
        let handle = ArtifactHandle::allocate(Uuid::new_v4(), "output", "mp3");
        let path = handle.path().to_path_buf();
        tokio::fs::write(&path, b"encoded").await.unwrap();

        let stream = ArtifactStream::open(handle).await.unwrap();
        assert!(path.exists());
        drop(stream);
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_jobs_get_distinct_paths() {
        let a = ArtifactHandle::allocate(Uuid::new_v4(), "input", "mp4");
        let b = ArtifactHandle::allocate(Uuid::new_v4(), "input", "mp4");
        assert_ne!(a.path(), b.path());
    }
}
