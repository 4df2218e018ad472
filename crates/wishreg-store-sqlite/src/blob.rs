//! Filesystem-backed [`BlobStore`].
//!
//! Objects live under a root directory at their relative path; the server
//! mounts that directory read-only at `{base_url}`.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use wishreg_core::store::BlobStore;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root:     PathBuf,
  base_url: String,
}

impl FsBlobStore {
  /// `base_url` is the public prefix objects are served under, e.g.
  /// `http://localhost:8080/blobs`.
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_owned();
    Self { root: root.into(), base_url }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `path` inside the root. Only plain relative segments are allowed.
  fn resolve(&self, path: &str) -> Result<PathBuf> {
    let rel = Path::new(path);
    let plain = path.split('/').all(|seg| !matches!(seg, "" | "." | ".."))
      && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
      return Err(Error::InvalidBlobPath(path.to_owned()));
    }
    Ok(self.root.join(rel))
  }
}

impl BlobStore for FsBlobStore {
  type Error = Error;

  async fn put(&self, path: String, bytes: Bytes, media_type: String) -> Result<()> {
    let target = self.resolve(&path)?;
    if let Some(parent) = target.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, &bytes).await?;
    tracing::debug!(%path, %media_type, size = bytes.len(), "blob written");
    Ok(())
  }

  fn public_url(&self, path: &str) -> String { format!("{}/{path}", self.base_url) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn put_writes_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://host/blobs/");

    blobs
      .put("gifts/u1/abc.png".into(), Bytes::from_static(b"png!"), "image/png".into())
      .await
      .unwrap();

    let written = std::fs::read(dir.path().join("gifts/u1/abc.png")).unwrap();
    assert_eq!(written, b"png!");
    assert_eq!(blobs.public_url("gifts/u1/abc.png"), "http://host/blobs/gifts/u1/abc.png");
  }

  #[tokio::test]
  async fn put_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://host/blobs");
    for body in [&b"one"[..], &b"two"[..]] {
      blobs
        .put("a.bin".into(), Bytes::copy_from_slice(body), "application/octet-stream".into())
        .await
        .unwrap();
    }
    assert_eq!(std::fs::read(dir.path().join("a.bin")).unwrap(), b"two");
  }

  #[tokio::test]
  async fn rejects_escaping_paths() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FsBlobStore::new(dir.path(), "http://host/blobs");
    for bad in ["", "../etc/passwd", "/abs.png", "a//b.png", "a/./b.png"] {
      let err = blobs
        .put(bad.into(), Bytes::from_static(b"x"), "image/png".into())
        .await
        .unwrap_err();
      assert!(matches!(err, Error::InvalidBlobPath(_)), "{bad:?} accepted");
    }
  }
}
