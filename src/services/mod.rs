//! Upload sessions, the submission sink, script workflows and the auth gate.

pub mod auth_service;
pub mod file_selection;
pub mod script_generator;
pub mod script_service;
pub mod script_workflow;
pub mod submission_form;
pub mod submission_store;
pub mod upload_module;
pub mod upload_service;
