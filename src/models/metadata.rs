//! Per-file title/description pairs attached to an upload batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::uploaded_file::FileId;

/// Title and description for a single selected file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub title: String,
    pub description: String,
}

/// Metadata for every file in a batch, keyed by file identity.
pub type MetadataMap = BTreeMap<FileId, FileMetadata>;

/// Partial update merged into one file's metadata. Absent fields are left alone.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl FileMetadata {
    pub fn apply(&mut self, update: MetadataUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}
