use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{MatchReport, ScheduledMatch};

pub async fn past_matches(
    State(state): State<AppState>,
) -> Result<Json<Vec<MatchReport>>, ApiError> {
    Ok(Json(state.repository.past_matches().await?))
}

pub async fn scheduled_matches(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduledMatch>>, ApiError> {
    Ok(Json(state.repository.upcoming_matches().await?))
}
