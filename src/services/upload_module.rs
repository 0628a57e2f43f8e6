//! src/services/upload_module.rs
//!
//! UploadModule: one upload session's complete state. Wires the file
//! selection, the submission form and the configured video types behind a
//! single error banner and a processing gate, and produces the batch handed
//! to the submission sink.

use crate::{
    models::{
        metadata::{MetadataMap, MetadataUpdate},
        submission::{SubmissionBatch, SubmissionData},
        uploaded_file::{FileId, SelectedFile, UploadedFile},
    },
    services::{
        file_selection::{FileSelection, SelectionError},
        submission_form::SubmissionForm,
    },
};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

pub const NO_FILES_SELECTED: &str = "Please add at least one video before submitting";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// A file-level failure; the message is also in the file error slot.
    #[error("{0}")]
    Files(String),
    /// A submission-level failure; the message is also in the submission error slot.
    #[error("{0}")]
    Submission(String),
    #[error("file `{0}` is not part of this upload")]
    FileNotFound(FileId),
    #[error("video type `{0}` is not one of the configured types")]
    UnknownVideoType(String),
    #[error("upload is being processed")]
    Processing,
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Clone)]
pub struct UploadModule {
    selection: FileSelection,
    form: SubmissionForm,
    video_types: Vec<String>,
    file_error: Option<String>,
    is_processing: bool,
}

impl UploadModule {
    pub fn new(max_files: usize, video_types: Vec<String>, preview_prefix: impl Into<String>) -> Self {
        let default_type = video_types.first().cloned().unwrap_or_default();
        Self {
            selection: FileSelection::new(max_files, preview_prefix),
            form: SubmissionForm::new(default_type),
            video_types,
            file_error: None,
            is_processing: false,
        }
    }

    /// The message shown in the banner. File errors win over submission errors.
    pub fn error(&self) -> Option<&str> {
        self.file_error.as_deref().or(self.form.error())
    }

    pub fn dismiss_error(&mut self) {
        self.file_error = None;
        self.form.clear_error();
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Toggle the processing gate. Never touches selected files or form fields.
    pub fn set_processing(&mut self, processing: bool) {
        self.is_processing = processing;
    }

    pub fn files(&self) -> &[UploadedFile] {
        self.selection.files()
    }

    pub fn metadata(&self) -> &MetadataMap {
        self.selection.metadata()
    }

    pub fn file(&self, id: FileId) -> Option<&UploadedFile> {
        self.selection.get(id)
    }

    pub fn submission(&self) -> &SubmissionData {
        self.form.data()
    }

    pub fn video_types(&self) -> &[String] {
        &self.video_types
    }

    pub fn max_files(&self) -> usize {
        self.selection.max_files()
    }

    /// How many more files fit, or `Processing` while the gate is closed.
    pub fn capacity(&self) -> UploadResult<usize> {
        self.ensure_idle()?;
        Ok(self.selection.remaining())
    }

    pub fn handle_files(&mut self, batch: Vec<SelectedFile>) -> UploadResult<&[UploadedFile]> {
        self.ensure_idle()?;
        let requested = batch.len();
        match self.selection.add_batch(batch).map(|added| added.len()) {
            Ok(added) => {
                self.file_error = None;
                let files = self.selection.files();
                Ok(&files[files.len() - added..])
            }
            Err(err) => Err(self.record_file_error(requested, err)),
        }
    }

    /// Reject a batch of `requested` files known to overflow the selection
    /// before it has been read.
    pub fn reject_overflow(&mut self, requested: usize) -> UploadError {
        let err = SelectionError::TooManyFiles {
            max: self.selection.max_files(),
        };
        self.record_file_error(requested, err)
    }

    fn record_file_error(&mut self, requested: usize, err: SelectionError) -> UploadError {
        warn!("rejected batch of {} files: {}", requested, err);
        let message = err.to_string();
        self.file_error = Some(message.clone());
        UploadError::Files(message)
    }

    pub fn remove_file(&mut self, id: FileId) -> UploadResult<UploadedFile> {
        self.ensure_idle()?;
        self.selection.remove(id).ok_or(UploadError::FileNotFound(id))
    }

    /// Metadata edits stay open while processing; only the batch shape and the
    /// submission record are frozen.
    pub fn update_metadata(&mut self, id: FileId, update: MetadataUpdate) -> UploadResult<()> {
        if self.selection.update_metadata(id, update) {
            Ok(())
        } else {
            Err(UploadError::FileNotFound(id))
        }
    }

    pub fn set_video_type(&mut self, video_type: &str) -> UploadResult<()> {
        self.ensure_idle()?;
        if !self.video_types.iter().any(|t| t == video_type) {
            return Err(UploadError::UnknownVideoType(video_type.to_string()));
        }
        self.form.set_video_type(video_type);
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> UploadResult<()> {
        self.ensure_idle()?;
        self.form.set_title(title);
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> UploadResult<()> {
        self.ensure_idle()?;
        self.form.set_description(description);
        Ok(())
    }

    pub fn set_target_date(&mut self, target_date: Option<NaiveDate>) -> UploadResult<()> {
        self.ensure_idle()?;
        self.form.set_target_date(target_date);
        Ok(())
    }

    /// Run the validation gate and snapshot the batch.
    ///
    /// File-level checks run first, then `validate_submission`. Failures land
    /// in the matching error slot and no batch is produced.
    pub fn prepare_submission(&mut self) -> UploadResult<SubmissionBatch> {
        self.ensure_idle()?;
        if self.selection.is_empty() {
            self.file_error = Some(NO_FILES_SELECTED.to_string());
            return Err(UploadError::Files(NO_FILES_SELECTED.to_string()));
        }
        self.file_error = None;

        if !self.form.validate_submission() {
            let message = self.form.error().unwrap_or_default().to_string();
            return Err(UploadError::Submission(message));
        }

        Ok(SubmissionBatch {
            files: self.selection.files().to_vec(),
            metadata: self.selection.metadata().clone(),
            submission: self.form.data().clone(),
        })
    }

    /// Hand the files, their metadata and the submission record to
    /// `on_files_selected`, but only when validation passes.
    pub fn submit<F, R>(&mut self, on_files_selected: F) -> UploadResult<R>
    where
        F: FnOnce(Vec<UploadedFile>, MetadataMap, SubmissionData) -> R,
    {
        let batch = self.prepare_submission()?;
        Ok(on_files_selected(batch.files, batch.metadata, batch.submission))
    }

    fn ensure_idle(&self) -> UploadResult<()> {
        if self.is_processing {
            Err(UploadError::Processing)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::default_video_types;
    use crate::services::submission_form::MISSING_TITLE;
    use bytes::Bytes;

    fn video(name: &str) -> SelectedFile {
        SelectedFile::new(name, Some("video/mp4".into()), Bytes::from_static(b"frames"))
    }

    fn module(max: usize) -> UploadModule {
        UploadModule::new(max, default_video_types(), "/previews")
    }

    fn ready(max: usize) -> UploadModule {
        let mut m = module(max);
        m.handle_files(vec![video("a.mp4")]).unwrap();
        m.set_title("Launch").unwrap();
        m.set_description("Launch week cuts").unwrap();
        m.set_target_date(NaiveDate::from_ymd_opt(2026, 11, 2)).unwrap();
        m
    }

    #[test]
    fn video_type_defaults_to_first_configured() {
        let m = module(5);
        assert_eq!(m.submission().video_type, "Dialogue");
        let empty = UploadModule::new(5, Vec::new(), "/previews");
        assert_eq!(empty.submission().video_type, "");
    }

    #[test]
    fn two_file_limit_scenario() {
        let mut m = module(2);
        m.handle_files(vec![video("a.mp4")]).unwrap();
        assert_eq!(m.files().len(), 1);
        assert!(m.error().is_none());

        m.handle_files(vec![video("b.mp4")]).unwrap();
        assert_eq!(m.files().len(), 2);

        let err = m.handle_files(vec![video("c.mp4")]).unwrap_err();
        assert!(matches!(err, UploadError::Files(_)));
        assert_eq!(m.error(), Some("You can upload a maximum of 2 files"));
        assert_eq!(m.files().len(), 2);
        assert_eq!(m.metadata().len(), 2);
    }

    #[test]
    fn accepted_batch_clears_previous_file_error() {
        let mut m = module(1);
        let _ = m.handle_files(vec![video("a.mp4"), video("b.mp4")]);
        assert!(m.error().is_some());
        m.handle_files(vec![video("a.mp4")]).unwrap();
        assert!(m.error().is_none());
    }

    #[test]
    fn capacity_tracks_selection_and_gate() {
        let mut m = module(2);
        assert_eq!(m.capacity(), Ok(2));
        m.handle_files(vec![video("a.mp4")]).unwrap();
        assert_eq!(m.capacity(), Ok(1));

        let err = m.reject_overflow(2);
        assert_eq!(err, UploadError::Files("You can upload a maximum of 2 files".into()));
        assert_eq!(m.error(), Some("You can upload a maximum of 2 files"));
        assert_eq!(m.files().len(), 1);

        m.set_processing(true);
        assert_eq!(m.capacity(), Err(UploadError::Processing));
    }

    #[test]
    fn file_error_takes_precedence_over_submission_error() {
        let mut m = module(1);
        m.handle_files(vec![video("a.mp4")]).unwrap();
        assert!(m.prepare_submission().is_err());
        assert_eq!(m.error(), Some(MISSING_TITLE));

        let _ = m.handle_files(vec![video("b.mp4")]);
        assert_eq!(m.error(), Some("You can upload a maximum of 1 files"));

        m.dismiss_error();
        assert!(m.error().is_none());
    }

    #[test]
    fn invalid_submission_never_calls_back() {
        let mut m = ready(3);
        m.set_title("").unwrap();
        let mut called = false;
        let result = m.submit(|_, _, _| called = true);
        assert!(matches!(result, Err(UploadError::Submission(_))));
        assert!(!called);
    }

    #[test]
    fn empty_batch_never_calls_back() {
        let mut m = module(3);
        m.set_title("Launch").unwrap();
        m.set_description("x").unwrap();
        m.set_target_date(NaiveDate::from_ymd_opt(2026, 11, 2)).unwrap();
        let mut called = false;
        let result = m.submit(|_, _, _| called = true);
        assert_eq!(result, Err(UploadError::Files(NO_FILES_SELECTED.to_string())));
        assert!(!called);
    }

    #[test]
    fn valid_submission_hands_over_files_metadata_and_record() {
        let mut m = ready(3);
        let id = m.files()[0].id;
        m.update_metadata(
            id,
            MetadataUpdate {
                title: Some("Cut A".into()),
                description: None,
            },
        )
        .unwrap();
        m.set_video_type("Testimonial").unwrap();

        let (files, metadata, data) = m.submit(|f, md, d| (f, md, d)).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(metadata[&id].title, "Cut A");
        assert_eq!(data.title, "Launch");
        assert_eq!(data.video_type, "Testimonial");
        assert!(m.error().is_none());
        assert_eq!(m.files().len(), 1);
    }

    #[test]
    fn processing_gate_freezes_mutations_without_clearing_state() {
        let mut m = ready(3);
        let id = m.files()[0].id;
        m.set_processing(true);

        assert_eq!(m.handle_files(vec![video("b.mp4")]).unwrap_err(), UploadError::Processing);
        assert_eq!(m.remove_file(id).unwrap_err(), UploadError::Processing);
        assert_eq!(m.set_video_type("Exercises").unwrap_err(), UploadError::Processing);
        assert_eq!(m.set_title("x").unwrap_err(), UploadError::Processing);
        assert!(m.update_metadata(id, MetadataUpdate::default()).is_ok());

        assert_eq!(m.files().len(), 1);
        assert_eq!(m.submission().title, "Launch");
        assert_eq!(m.submission().video_type, "Dialogue");

        m.set_processing(false);
        assert!(m.remove_file(id).is_ok());
    }

    #[test]
    fn unknown_video_type_is_rejected() {
        let mut m = module(3);
        assert_eq!(
            m.set_video_type("Bloopers"),
            Err(UploadError::UnknownVideoType("Bloopers".into()))
        );
        assert_eq!(m.submission().video_type, "Dialogue");
    }
}
