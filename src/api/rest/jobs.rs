use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::job::JobRecord;
use crate::state::AppState;
use crate::store::JobStore;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:id", get(get_job))
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<JobRecord>,
) -> Result<Json<JobRecord>, AppError> {
    if payload.property_id.trim().is_empty() {
        return Err(AppError::BadRequest("propertyId cannot be empty".to_string()));
    }

    if payload.id.trim().is_empty() {
        payload.id = Uuid::new_v4().to_string();
    }

    state.store.insert_job(payload.clone());
    Ok(Json(payload))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    let job = state
        .store
        .job(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {id} not found")))?;

    Ok(Json(job))
}
