use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::operator::{Operator, OperatorStatus};
use crate::state::AppState;
use crate::store::OperatorDirectory;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/operators", post(create_operator).get(list_operators))
}

#[derive(Deserialize)]
pub struct CreateOperatorRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: OperatorStatus,
    #[serde(default)]
    pub rating: Option<f64>,
}

async fn create_operator(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOperatorRequest>,
) -> Result<Json<Operator>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.rating.is_some_and(|rating| !rating.is_finite()) {
        return Err(AppError::BadRequest("rating must be a number".to_string()));
    }

    let id = payload
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let operator = Operator {
        id,
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        status: payload.status,
        rating: payload.rating.map(|rating| rating.clamp(1.0, 5.0)),
    };

    state.store.insert_operator(operator.clone());
    Ok(Json(operator))
}

async fn list_operators(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Operator>>, AppError> {
    Ok(Json(state.store.operators().await?))
}
