//! HTTP handlers for the script generation workflow.

use crate::{
    errors::AppError,
    models::script::{GeneratedScript, ScriptInput},
    services::script_workflow::{WorkflowHandle, WorkflowView},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct WorkflowResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub view: WorkflowView,
}

async fn workflow(state: &AppState, id: Uuid) -> Result<WorkflowHandle, AppError> {
    state
        .scripts
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("script workflow `{}` not found", id)))
}

async fn respond(id: Uuid, handle: &WorkflowHandle) -> Json<WorkflowResponse> {
    Json(WorkflowResponse {
        id,
        view: handle.view().await,
    })
}

/// POST `/api/scripts`
pub async fn create_workflow(State(state): State<AppState>) -> impl IntoResponse {
    let (id, view) = state.scripts.create().await;
    (StatusCode::CREATED, Json(WorkflowResponse { id, view }))
}

/// GET `/api/scripts/{id}`: drains pending notifications.
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let handle = workflow(&state, id).await?;
    Ok(respond(id, &handle).await)
}

/// DELETE `/api/scripts/{id}`
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.scripts.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("script workflow `{}` not found", id)))
    }
}

/// POST `/api/scripts/{id}/generate`: resolves after the simulated delay.
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ScriptInput>,
) -> Result<Json<GeneratedScript>, AppError> {
    let handle = workflow(&state, id).await?;
    Ok(Json(handle.generate(input).await?))
}

/// PUT `/api/scripts/{id}/script`
pub async fn save_script(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(script): Json<GeneratedScript>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let handle = workflow(&state, id).await?;
    handle.save(script).await?;
    Ok(respond(id, &handle).await)
}

/// POST `/api/scripts/{id}/final`
pub async fn view_final(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let handle = workflow(&state, id).await?;
    handle.view_final().await?;
    Ok(respond(id, &handle).await)
}

/// POST `/api/scripts/{id}/back`
pub async fn back_to_editor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let handle = workflow(&state, id).await?;
    handle.back().await?;
    Ok(respond(id, &handle).await)
}

/// POST `/api/scripts/{id}/new`
pub async fn new_script(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let handle = workflow(&state, id).await?;
    handle.new_script().await;
    Ok(respond(id, &handle).await)
}
