//! Represents a file selected into an upload batch.

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

/// Stable identity of a selected file. Generated on selection, never reused.
pub type FileId = Uuid;

/// A file as handed over by the client before it joins a batch.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    /// Original filename reported by the client.
    pub file_name: String,

    /// Content type (MIME type), if the client sent one.
    pub content_type: Option<String>,

    /// Raw payload.
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }
}

/// A file that has been accepted into the batch.
///
/// The payload is held in memory until the batch is submitted or the file is
/// removed. `preview_url` is served only while the file stays selected.
#[derive(Serialize, Clone, Debug)]
pub struct UploadedFile {
    /// Generated identifier; metadata is keyed by this, never by position.
    pub id: FileId,

    /// Original filename of the selected file.
    pub file_name: String,

    /// Content type (MIME type).
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: u64,

    /// Hex MD5 of the payload.
    pub etag: String,

    /// URL the client can fetch the selected file from.
    pub preview_url: String,

    #[serde(skip)]
    pub data: Bytes,
}
