//! [`FsObjectStore`], a directory-backed [`ObjectStore`].
//!
//! Objects live at `{root}/{bucket}/{path}` and are served by the HTTP layer
//! under `{public_base}/{bucket}/{path}`.

use std::path::{Path, PathBuf};

use panchayat_core::store::ObjectStore;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FsObjectStore {
  root:        PathBuf,
  public_base: String,
}

impl FsObjectStore {
  pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
    let public_base = public_base.into().trim_end_matches('/').to_owned();
    Self { root: root.into(), public_base }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `bucket/path` below the root, refusing anything that could
  /// escape it.
  fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf> {
    check_segments(bucket, false)?;
    check_segments(path, true)?;
    let mut full = self.root.join(bucket);
    for segment in path.split('/') {
      full.push(segment);
    }
    Ok(full)
  }

  fn public_url(&self, bucket: &str, path: &str) -> String {
    format!("{}/{bucket}/{path}", self.public_base)
  }
}

/// Every `/`-separated segment must be non-empty and not `.` or `..`. A
/// bucket is a single segment.
fn check_segments(s: &str, nested: bool) -> Result<()> {
  if !nested && s.contains('/') {
    return Err(Error::InvalidPath(s.to_owned()));
  }
  let bad = s
    .split('/')
    .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\'));
  if bad {
    return Err(Error::InvalidPath(s.to_owned()));
  }
  Ok(())
}

impl ObjectStore for FsObjectStore {
  type Error = Error;

  async fn upload<'a>(&'a self, bucket: &'a str, path: &'a str, bytes: Vec<u8>) -> Result<String> {
    let full = self.resolve(bucket, path)?;
    if let Some(parent) = full.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, bytes).await?;
    tracing::debug!(bucket, path, "object stored");
    Ok(self.public_url(bucket, path))
  }

  async fn delete<'a>(&'a self, bucket: &'a str, path: &'a str) -> Result<()> {
    let full = self.resolve(bucket, path)?;
    match tokio::fs::remove_file(&full).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        Err(Error::ObjectNotFound(format!("{bucket}/{path}")))
      }
      Err(e) => Err(e.into()),
    }
  }
}
