//! Batch-level submission record and the configured video type list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{metadata::MetadataMap, uploaded_file::UploadedFile};

/// Video types offered when none are configured. Kept sorted.
pub const DEFAULT_VIDEO_TYPES: [&str; 6] = [
    "Dialogue",
    "Evergreen Content",
    "Exercises",
    "Huge Client Win",
    "Partnership/Sponsorship",
    "Testimonial",
];

/// Maximum number of files in a batch when none is configured.
pub const DEFAULT_MAX_FILES: usize = 5;

pub fn default_video_types() -> Vec<String> {
    let mut types: Vec<String> = DEFAULT_VIDEO_TYPES.iter().map(|t| t.to_string()).collect();
    types.sort();
    types
}

/// The record accompanying an upload batch.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionData {
    pub title: String,
    pub description: String,
    pub video_type: String,
    pub target_date: Option<NaiveDate>,
}

/// Everything handed to the submission sink once validation passes.
#[derive(Clone, Debug)]
pub struct SubmissionBatch {
    pub files: Vec<UploadedFile>,
    pub metadata: MetadataMap,
    pub submission: SubmissionData,
}

/// A recorded submission, as listed in the task history.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_type: String,
    pub target_date: NaiveDate,
    pub file_count: i64,
    pub total_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// One persisted file of a recorded submission.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct SubmittedFile {
    pub id: Uuid,
    pub submission_id: Uuid,

    /// Position of the file in the submitted batch (0-based).
    pub position: i64,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub etag: String,
    pub title: String,
    pub description: String,
}

/// What the sink reports back after recording a batch.
#[derive(Serialize, Clone, Debug)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub file_count: usize,
    pub total_bytes: u64,
    pub recorded_at: DateTime<Utc>,
}
