use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use taskdeck_core::{CreateTaskRequest, TaskPatch};
use taskdeck_service::ServiceError;

use super::AppState;
use crate::auth::Subject;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/attachment", post(generate_upload_url))
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(Subject(owner)): Extension<Subject>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .list_tasks(&owner)
        .await
        .map(|tasks| Json(json!({ "items": tasks })))
        .map_err(to_error)
}

async fn create_task(
    State(state): State<AppState>,
    Extension(Subject(owner)): Extension<Subject>,
    Json(input): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .create_task(&owner, &input)
        .await
        .map(|task| (StatusCode::CREATED, Json(json!({ "item": task }))))
        .map_err(to_error)
}

async fn update_task(
    State(state): State<AppState>,
    Extension(Subject(owner)): Extension<Subject>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let claim = state.service.claim(&owner, &id).await.map_err(to_error)?;
    state
        .service
        .update_task(&claim, &patch)
        .await
        .map(|task| Json(json!({ "item": task })))
        .map_err(to_error)
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(Subject(owner)): Extension<Subject>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let claim = state.service.claim(&owner, &id).await.map_err(to_error)?;
    state
        .service
        .delete_task(&claim)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn generate_upload_url(
    State(state): State<AppState>,
    Extension(Subject(owner)): Extension<Subject>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let claim = state.service.claim(&owner, &id).await.map_err(to_error)?;
    state
        .service
        .attach_image(&claim)
        .await
        .map(|url| (StatusCode::CREATED, Json(json!({ "uploadUrl": url }))))
        .map_err(to_error)
}

fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}
