//! HTTP handlers for upload sessions and recorded submissions.
//! Multipart batches are buffered into `SelectedFile`s and handed to
//! `UploadService`; stored payloads stream back from disk.

use crate::{
    errors::AppError,
    models::{
        metadata::MetadataUpdate,
        submission::{SubmissionReceipt, SubmissionRecord, SubmittedFile},
        uploaded_file::{FileId, SelectedFile, UploadedFile},
    },
    services::{
        auth_service::AuthSession,
        upload_service::{SessionId, SessionView, SubmissionUpdate},
    },
    state::AppState,
};
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSessionQuery {
    pub max_files: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionDetail {
    pub submission: SubmissionRecord,
    pub files: Vec<SubmittedFile>,
}

/// POST `/api/uploads`: open a session.
pub async fn create_session(
    State(state): State<AppState>,
    Query(q): Query<CreateSessionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.uploads.create_session(q.max_files).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET `/api/uploads/{session_id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.uploads.view(session_id).await?))
}

/// DELETE `/api/uploads/{session_id}`: tear down, revoking every preview.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, AppError> {
    state.uploads.close_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/uploads/{session_id}/files`: add a multipart batch.
///
/// Every part carrying a filename is one file; other parts are ignored.
/// A batch is refused at the first part that does not fit, before that
/// part is read.
pub async fn add_files(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedFile>>, AppError> {
    let capacity = state.uploads.capacity(session_id).await?;

    let mut batch = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("skipping non-file multipart field {:?}", field.name());
            continue;
        };
        if batch.len() == capacity {
            let err = state
                .uploads
                .reject_overflow(session_id, batch.len() + 1)
                .await;
            return Err(err.into());
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        batch.push(SelectedFile::new(file_name, content_type, data));
    }

    if batch.is_empty() {
        return Err(AppError::bad_request("no files in request"));
    }

    Ok(Json(state.uploads.add_files(session_id, batch).await?))
}

/// DELETE `/api/uploads/{session_id}/files/{file_id}`
pub async fn remove_file(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(SessionId, FileId)>,
) -> Result<StatusCode, AppError> {
    state.uploads.remove_file(session_id, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/uploads/{session_id}/files/{file_id}/preview`: serves the
/// selected file for as long as it stays in the batch.
pub async fn preview_file(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(SessionId, FileId)>,
) -> Result<Response, AppError> {
    let file = state.uploads.preview(session_id, file_id).await?;

    let mut response = Response::new(Body::empty());
    set_file_headers(
        response.headers_mut(),
        file.content_type.as_deref(),
        file.size_bytes,
        &file.etag,
    );
    *response.body_mut() = Body::from(file.data);
    Ok(response)
}

/// PATCH `/api/uploads/{session_id}/files/{file_id}/metadata`
pub async fn update_metadata(
    State(state): State<AppState>,
    Path((session_id, file_id)): Path<(SessionId, FileId)>,
    Json(update): Json<MetadataUpdate>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(
        state
            .uploads
            .update_metadata(session_id, file_id, update)
            .await?,
    ))
}

/// PATCH `/api/uploads/{session_id}/submission`
pub async fn update_submission(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(update): Json<SubmissionUpdate>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(
        state.uploads.update_submission(session_id, update).await?,
    ))
}

/// DELETE `/api/uploads/{session_id}/error`: dismiss the banner.
pub async fn dismiss_error(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.uploads.dismiss_error(session_id).await?))
}

/// POST `/api/uploads/{session_id}/submit`
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Path(session_id): Path<SessionId>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let receipt = state.uploads.submit(session_id, &auth.username).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET `/api/submissions?limit=`: most recent first.
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<SubmissionRecord>>, AppError> {
    let limit = q.limit.unwrap_or(50);
    Ok(Json(state.submissions.list_recent(limit).await?))
}

/// GET `/api/submissions/{submission_id}`
pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<SubmissionDetail>, AppError> {
    let submission = state.submissions.get(submission_id).await?;
    let files = state.submissions.list_files(submission_id).await?;
    Ok(Json(SubmissionDetail { submission, files }))
}

/// GET `/api/submissions/{submission_id}/files/{file_id}`: streamed from disk.
pub async fn download_submitted_file(
    State(state): State<AppState>,
    Path((submission_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let (meta, file) = state.submissions.open_file(submission_id, file_id).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    set_file_headers(
        response.headers_mut(),
        meta.content_type.as_deref(),
        meta.size_bytes.max(0) as u64,
        &meta.etag,
    );
    if let Ok(value) = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        meta.file_name.replace('"', "")
    )) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

fn set_file_headers(headers: &mut HeaderMap, content_type: Option<&str>, size: u64, etag: &str) {
    let content_type = content_type.unwrap_or("application/octet-stream");
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
        headers.insert(header::ETAG, value);
    }
}
