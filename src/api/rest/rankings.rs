use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::ranking::{JobSuggestion, rank_operators_for_job, suggest_for_day};
use crate::error::AppError;
use crate::models::assignment::AssignmentScore;
use crate::state::AppState;
use crate::store::{JobStore, OperatorDirectory};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/:id/candidates", get(job_candidates))
        .route("/days/:date/suggestions", get(day_suggestions))
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn resolve(&self, state: &AppState) -> Result<usize, AppError> {
        match self.limit {
            Some(0) => Err(AppError::BadRequest("limit must be > 0".to_string())),
            Some(limit) => Ok(limit),
            None => Ok(state.default_rank_limit),
        }
    }
}

async fn job_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<AssignmentScore>>, AppError> {
    let limit = query.resolve(&state)?;

    let record = state
        .store
        .job(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {id} not found")))?;
    let job = record
        .to_cleaning_job(&state.scoring.settings.day_offset)
        .ok_or_else(|| AppError::BadRequest(format!("job {id} has no scheduled date")))?;
    let operators = state.store.operators().await?;

    let start = Instant::now();
    let ranked = rank_operators_for_job(&state.scoring, &job, &operators, limit).await;
    state
        .metrics
        .observe_ranking("job", start.elapsed().as_secs_f64(), &ranked);

    Ok(Json(ranked))
}

async fn day_suggestions(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<JobSuggestion>>, AppError> {
    let limit = query.resolve(&state)?;
    let operators = state.store.operators().await?;

    let start = Instant::now();
    let suggestions = suggest_for_day(&state.scoring, date, &operators, limit).await;
    state.metrics.observe_ranking(
        "day",
        start.elapsed().as_secs_f64(),
        suggestions.iter().flat_map(|suggestion| &suggestion.candidates),
    );

    Ok(Json(suggestions))
}
