//! src/services/file_selection.rs
//!
//! FileSelection is the in-memory set of files in an upload batch together
//! with their per-file metadata. Enforces the configured maximum and keeps
//! exactly one metadata entry per selected file. Performs no I/O.

use crate::models::{
    metadata::{FileMetadata, MetadataMap, MetadataUpdate},
    uploaded_file::{FileId, SelectedFile, UploadedFile},
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("You can upload a maximum of {max} files")]
    TooManyFiles { max: usize },
}

#[derive(Debug, Clone)]
pub struct FileSelection {
    max_files: usize,
    preview_prefix: String,
    files: Vec<UploadedFile>,
    metadata: MetadataMap,
}

impl FileSelection {
    /// Create an empty selection. Preview URLs are built as
    /// `{preview_prefix}/{file_id}/preview`.
    pub fn new(max_files: usize, preview_prefix: impl Into<String>) -> Self {
        Self {
            max_files,
            preview_prefix: preview_prefix.into().trim_end_matches('/').to_string(),
            files: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    /// Append a batch of newly chosen files.
    ///
    /// The batch is all-or-nothing: when it would push the selection past
    /// `max_files` nothing is added. Accepted files each get a fresh id, an
    /// etag, a preview URL and an empty metadata entry.
    pub fn add_batch(&mut self, batch: Vec<SelectedFile>) -> Result<&[UploadedFile], SelectionError> {
        if self.files.len() + batch.len() > self.max_files {
            return Err(SelectionError::TooManyFiles {
                max: self.max_files,
            });
        }

        let start = self.files.len();
        for selected in batch.into_iter().take(self.remaining()) {
            let id = Uuid::new_v4();
            let uploaded = UploadedFile {
                id,
                etag: format!("{:x}", md5::compute(&selected.data)),
                size_bytes: selected.data.len() as u64,
                preview_url: self.preview_url(id),
                file_name: selected.file_name,
                content_type: selected.content_type,
                data: selected.data,
            };
            debug!("selected file {} ({} bytes) as {}", uploaded.file_name, uploaded.size_bytes, id);
            self.metadata.insert(id, FileMetadata::default());
            self.files.push(uploaded);
        }

        Ok(&self.files[start..])
    }

    /// Remove a file by identity, dropping its payload, preview and metadata.
    pub fn remove(&mut self, id: FileId) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.id == id)?;
        self.metadata.remove(&id);
        Some(self.files.remove(index))
    }

    /// Merge a partial update into one file's metadata. Returns false for
    /// unknown ids.
    pub fn update_metadata(&mut self, id: FileId, update: MetadataUpdate) -> bool {
        match self.metadata.get_mut(&id) {
            Some(entry) => {
                entry.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn remaining(&self) -> usize {
        self.max_files.saturating_sub(self.files.len())
    }

    fn preview_url(&self, id: FileId) -> String {
        format!("{}/{}/preview", self.preview_prefix, id)
    }
}
