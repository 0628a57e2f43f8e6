//! Core data models for the content-operations service.
//!
//! Upload-side entities (files, per-file metadata, submission records) are
//! plain values owned by the upload services. Script, notification and page
//! models back the script workflow and the dashboard route table. Everything
//! serializes as JSON via `serde`.

pub mod metadata;
pub mod notification;
pub mod page;
pub mod script;
pub mod submission;
pub mod uploaded_file;
