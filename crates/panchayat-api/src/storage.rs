//! File uploads to the object store.

use std::sync::Arc;

use futures::future::join_all;
use panchayat_core::store::ObjectStore;
use uuid::Uuid;

use crate::{
  PortalError, Result,
  notify::{Notice, Notifier, report},
};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct FileUpload {
  pub name:  String,
  pub bytes: Vec<u8>,
}

impl FileUpload {
  pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self { name: name.into(), bytes: bytes.into() }
  }
}

/// `{folder}/{uuid}-{name}`, or `{uuid}-{name}` without a folder. Separators
/// inside `name` are replaced so a file name is always one path segment.
pub fn object_path(folder: Option<&str>, name: &str) -> String {
  let name: String = name.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }).collect();
  let file = format!("{}-{name}", Uuid::new_v4());
  match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
    Some(folder) => format!("{folder}/{file}"),
    None => file,
  }
}

pub struct StorageController<O> {
  objects:  Arc<O>,
  notifier: Arc<dyn Notifier>,
}

impl<O> Clone for StorageController<O> {
  fn clone(&self) -> Self { Self { objects: self.objects.clone(), notifier: self.notifier.clone() } }
}

impl<O: ObjectStore> StorageController<O> {
  pub fn new(objects: Arc<O>, notifier: Arc<dyn Notifier>) -> Self { Self { objects, notifier } }

  /// Store one file and return its public URL.
  pub async fn upload_file(
    &self,
    bucket: &str,
    file: FileUpload,
    folder: Option<&str>,
  ) -> Result<String> {
    if file.name.trim().is_empty() {
      return report(
        &*self.notifier,
        "Failed to upload file",
        Err(PortalError::Validation("file name is required".into())),
      );
    }
    let path = object_path(folder, &file.name);
    let result = self.objects.upload(bucket, &path, file.bytes).await.map_err(PortalError::storage);
    let url = report(&*self.notifier, &format!("Failed to upload {}", file.name), result)?;
    tracing::debug!(bucket, %path, "uploaded");
    Ok(url)
  }

  /// Store several files concurrently. The URLs of the uploads that
  /// succeeded are returned in input order; failures are notified and left
  /// out. No files means no object-store call at all.
  pub async fn upload_files(
    &self,
    bucket: &str,
    files: Vec<FileUpload>,
    folder: Option<&str>,
  ) -> Vec<String> {
    if files.is_empty() {
      return Vec::new();
    }
    let uploads = files.into_iter().map(|file| self.upload_file(bucket, file, folder));
    join_all(uploads).await.into_iter().filter_map(Result::ok).collect()
  }

  pub async fn delete_file(&self, bucket: &str, path: &str) -> Result<()> {
    let result = self.objects.delete(bucket, path).await.map_err(PortalError::storage);
    report(&*self.notifier, "Failed to delete file", result)?;
    self.notifier.notify(Notice::success("File deleted", path.to_owned()));
    Ok(())
  }
}
