//! Editable submission fields for one upload batch plus a single error slot.

use crate::models::submission::SubmissionData;
use chrono::NaiveDate;

pub const MISSING_TITLE: &str = "Please enter a title for this submission";
pub const MISSING_DESCRIPTION: &str = "Please enter a description for this submission";
pub const MISSING_TARGET_DATE: &str = "Please select a target date for this submission";

#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    data: SubmissionData,
    error: Option<String>,
}

impl SubmissionForm {
    pub fn new(default_video_type: impl Into<String>) -> Self {
        Self {
            data: SubmissionData {
                video_type: default_video_type.into(),
                ..SubmissionData::default()
            },
            error: None,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.data.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.data.description = description.into();
    }

    pub fn set_video_type(&mut self, video_type: impl Into<String>) {
        self.data.video_type = video_type.into();
    }

    pub fn set_target_date(&mut self, target_date: Option<NaiveDate>) {
        self.data.target_date = target_date;
    }

    pub fn data(&self) -> &SubmissionData {
        &self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Check the required fields in order: title, description, target date.
    ///
    /// On failure the first missing field's message lands in the error slot.
    /// On success the slot is cleared.
    pub fn validate_submission(&mut self) -> bool {
        let failure = if self.data.title.is_empty() {
            Some(MISSING_TITLE)
        } else if self.data.description.is_empty() {
            Some(MISSING_DESCRIPTION)
        } else if self.data.target_date.is_none() {
            Some(MISSING_TARGET_DATE)
        } else {
            None
        };

        match failure {
            Some(message) => {
                self.error = Some(message.to_string());
                false
            }
            None => {
                self.error = None;
                true
            }
        }
    }
}
