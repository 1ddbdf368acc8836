use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::{ApiError, AppQuery};
use crate::calculate::calculate_star_shares;
use crate::models::{PlayerDetail, PlayerId, PlayerSummary, TimeWindow, YearMonth};

/// Attacks listed on the player detail view.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl WindowParams {
    fn window(&self) -> Result<TimeWindow, ApiError> {
        Ok(TimeWindow::from_parts(self.year, self.month)?)
    }
}

fn custom_month(window: TimeWindow) -> Option<YearMonth> {
    match window {
        TimeWindow::Month(ym) => Some(ym),
        TimeWindow::CurrentMonth | TimeWindow::AllTime => None,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsResponse {
    pub current_month: YearMonth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_month: Option<YearMonth>,
    pub players: Vec<PlayerSummary>,
}

pub async fn player_stats(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<WindowParams>,
) -> Result<Json<PlayerStatsResponse>, ApiError> {
    let window = params.window()?;
    let players = state.repository.players_with_records().await?;
    let summaries = state.aggregator.summarize_per_player(&players, window);

    debug!("Summarized {} players over {:?}", summaries.len(), window);

    Ok(Json(PlayerStatsResponse {
        current_month: YearMonth::of(state.aggregator.today()),
        custom_month: custom_month(window),
        players: summaries,
    }))
}

pub async fn player_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<WindowParams>,
) -> Result<Json<PlayerDetail>, ApiError> {
    let window = params.window()?;
    let id = PlayerId::from(id);

    let history = state
        .repository
        .player_history(&id, RECENT_LIMIT)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Player '{}' not found", id)))?;

    let summary = state.aggregator.summarize_player(&history.records, window);

    Ok(Json(PlayerDetail {
        rating: summary.overall.rating(),
        star_shares: calculate_star_shares(&summary.overall),
        custom_month: custom_month(window),
        recent_performances: history.recent,
        summary,
    }))
}
