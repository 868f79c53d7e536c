//! Ownership of the runtime's unix-domain socket.

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tokio::net::UnixListener;

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("'{0}' exists and is not a socket; refusing to remove it")]
    NotASocket(PathBuf),

    #[error("failed to remove stale socket '{path}': {source}")]
    RemoveStale { path: PathBuf, source: io::Error },

    #[error("failed to bind '{path}': {source}")]
    Bind { path: PathBuf, source: io::Error },
}

/// A bound listener that owns its socket file.
///
/// Binding replaces a socket file left behind by a previous run. Dropping the
/// guard unlinks the file.
#[derive(Debug)]
pub struct SocketGuard {
    path: PathBuf,
    listener: Option<UnixListener>,
}

impl SocketGuard {
    /// Bind `path`, removing a stale socket first.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`SocketError::NotASocket`] if something other than a socket sits at `path`
    /// - I/O failures while removing or binding
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, SocketError> {
        let path = path.into();
        remove_stale(&path)?;

        let listener = UnixListener::bind(&path).map_err(|source| SocketError::Bind {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(socket = %path.display(), "Socket bound");

        Ok(Self {
            path,
            listener: Some(listener),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand the listener to the server. The guard keeps owning the file.
    pub fn take_listener(&mut self) -> Option<UnixListener> {
        self.listener.take()
    }
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        drop(self.listener.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(socket = %self.path.display(), "Socket removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(socket = %self.path.display(), error = %e, "Failed to remove socket"),
        }
    }
}

fn remove_stale(path: &Path) -> Result<(), SocketError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(SocketError::RemoveStale {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !meta.file_type().is_socket() {
        return Err(SocketError::NotASocket(path.to_path_buf()));
    }

    tracing::info!(socket = %path.display(), "Removing stale socket");
    std::fs::remove_file(path).map_err(|source| SocketError::RemoveStale {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_creates_and_drop_removes_the_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.sock");

        let guard = SocketGuard::bind(&path).unwrap();
        assert!(path.exists());

        drop(guard);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stale_socket_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.sock");

        // Leave a socket file behind without cleaning it up.
        let stale = std::os::unix::net::UnixListener::bind(&path).unwrap();
        drop(stale);
        assert!(path.exists());

        let guard = SocketGuard::bind(&path).unwrap();
        assert_eq!(guard.path(), path.as_path());
    }

    #[tokio::test]
    async fn regular_file_is_never_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.sock");
        std::fs::write(&path, b"important").unwrap();

        let err = SocketGuard::bind(&path).unwrap_err();

        assert!(matches!(err, SocketError::NotASocket(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"important");
    }
}
