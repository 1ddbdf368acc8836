//! Admin endpoints. Every write requires an [`AdminSession`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{ApiError, AppJson};
use crate::auth::{AdminSession, IssuedToken};
use crate::models::{
    EntityId, MatchResult, MatchResultId, Player, PlayerId, PlayerPerformance, ScheduledMatch,
    ScheduledMatchId,
};
use crate::storage::EntityType;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub player_tag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatchResult {
    pub opponent_clan_name: String,
    #[serde(default)]
    pub clan_stars: u32,
    #[serde(default)]
    pub clan_percentage: f64,
    #[serde(default)]
    pub enemy_stars: u32,
    #[serde(default)]
    pub enemy_percentage: f64,
    /// Defaults to today
    pub match_date: Option<NaiveDate>,
    pub scheduled_match_id: Option<ScheduledMatchId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerformance {
    pub player_id: PlayerId,
    pub match_result_id: MatchResultId,
    pub stars: u8,
    pub destruction_percentage: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduledMatch {
    pub opponent_clan_name: String,
    pub match_time_utc: DateTime<Utc>,
    pub notes: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<IssuedToken>, ApiError> {
    let issued = state.sessions.login(&req.username, &req.password).await?;
    Ok(Json(issued))
}

pub async fn logout(State(state): State<AppState>, session: AdminSession) -> StatusCode {
    state.sessions.revoke(&session).await;
    StatusCode::NO_CONTENT
}

pub async fn create_player(
    State(state): State<AppState>,
    session: AdminSession,
    AppJson(req): AppJson<NewPlayer>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let player = Player::new(req.name.trim().to_string(), req.player_tag.trim().to_string());
    let player = state.repository.insert_player(player).await?;

    info!("{} created player {}", session.username, player.id);
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn create_match_result(
    State(state): State<AppState>,
    session: AdminSession,
    AppJson(req): AppJson<NewMatchResult>,
) -> Result<(StatusCode, Json<MatchResult>), ApiError> {
    let match_date = req.match_date.unwrap_or_else(|| state.aggregator.today());
    let mut result = MatchResult::new(req.opponent_clan_name.trim().to_string(), match_date)
        .with_score(
            req.clan_stars,
            req.clan_percentage,
            req.enemy_stars,
            req.enemy_percentage,
        );
    if let Some(scheduled_id) = req.scheduled_match_id {
        result = result.with_scheduled_match(scheduled_id);
    }

    let result = state.repository.insert_match_result(result).await?;

    info!("{} recorded match result {}", session.username, result.id);
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn create_performance(
    State(state): State<AppState>,
    session: AdminSession,
    AppJson(req): AppJson<NewPerformance>,
) -> Result<(StatusCode, Json<PlayerPerformance>), ApiError> {
    let performance = PlayerPerformance::new(
        req.player_id,
        req.match_result_id,
        req.stars,
        req.destruction_percentage,
    );
    let performance = state.repository.insert_performance(performance).await?;

    info!(
        "{} recorded {} stars for {} in {}",
        session.username, performance.stars, performance.player_id, performance.match_result_id
    );
    Ok((StatusCode::CREATED, Json(performance)))
}

pub async fn create_scheduled_match(
    State(state): State<AppState>,
    session: AdminSession,
    AppJson(req): AppJson<NewScheduledMatch>,
) -> Result<(StatusCode, Json<ScheduledMatch>), ApiError> {
    let mut scheduled =
        ScheduledMatch::new(req.opponent_clan_name.trim().to_string(), req.match_time_utc);
    if let Some(notes) = req.notes.filter(|n| !n.trim().is_empty()) {
        scheduled = scheduled.with_notes(notes);
    }

    let scheduled = state.repository.insert_scheduled_match(scheduled).await?;

    info!("{} scheduled match {}", session.username, scheduled.id);
    Ok((StatusCode::CREATED, Json(scheduled)))
}

async fn delete_entity(
    state: &AppState,
    session: &AdminSession,
    entity: EntityType,
    id: String,
) -> Result<StatusCode, ApiError> {
    let id = EntityId::from(id);
    state.repository.delete(entity, &id).await?;

    info!("{} deleted {} {}", session.username, entity.label(), id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_player(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_entity(&state, &session, EntityType::Player, id).await
}

pub async fn delete_match_result(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_entity(&state, &session, EntityType::MatchResult, id).await
}

pub async fn delete_performance(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_entity(&state, &session, EntityType::PlayerPerformance, id).await
}

pub async fn delete_scheduled_match(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_entity(&state, &session, EntityType::ScheduledMatch, id).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::api::routes::test_support::{get_json, login, send, test_repository, test_state};
    use crate::api::state::AppState;
    use crate::auth::SessionStore;
    use crate::calculate::Aggregator;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "username": "admin", "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_login_disabled_without_password() {
        let temp_dir = TempDir::new().unwrap();
        let state = AppState::new(
            Arc::new(test_repository(temp_dir.path())),
            Arc::new(SessionStore::new("admin".into(), None, Duration::from_secs(60))),
            Aggregator::default(),
        );

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "username": "admin", "password": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_writes_require_session() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let body = json!({ "name": "Ada", "playerTag": "#ADA" });

        let (status, _) = send(&state, "POST", "/api/admin/players", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &state,
            "POST",
            "/api/admin/players",
            Some("forged-token"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, "DELETE", "/api/admin/players/ada", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, json) = get_json(&state, "/api/players/stats").await;
        assert_eq!(json["players"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, _) = send(&state, "POST", "/api/admin/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, "POST", "/api/admin/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_flow_feeds_stats() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, player) = send(
            &state,
            "POST",
            "/api/admin/players",
            Some(&token),
            Some(json!({ "name": " Ada ", "playerTag": "#ADA" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(player["name"], "Ada");
        let player_id = player["id"].as_str().unwrap().to_string();

        let (status, result) = send(
            &state,
            "POST",
            "/api/admin/match-results",
            Some(&token),
            Some(json!({
                "opponentClanName": "Raiders",
                "clanStars": 30,
                "clanPercentage": 92.5,
                "enemyStars": 27,
                "enemyPercentage": 88.0,
                "matchDate": "2024-06-03"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let match_id = result["id"].as_str().unwrap().to_string();

        let (status, perf) = send(
            &state,
            "POST",
            "/api/admin/performances",
            Some(&token),
            Some(json!({
                "playerId": player_id,
                "matchResultId": match_id,
                "stars": 3,
                "destructionPercentage": 100.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(perf["stars"], 3);

        let (_, stats) = get_json(&state, "/api/players/stats?year=2024&month=6").await;
        let ada = &stats["players"][0];
        assert_eq!(ada["custom"]["totalMatches"], 1);
        assert_eq!(ada["custom"]["threeStarCount"], 1);
        assert_eq!(ada["overall"]["averageDestruction"].as_f64(), Some(100.0));

        let (_, past) = get_json(&state, "/api/matches/past").await;
        assert_eq!(past[0]["outcome"], "victory");
        assert_eq!(past[0]["performances"][0]["playerName"], "Ada");
    }

    #[tokio::test]
    async fn test_create_performance_validation() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/performances",
            Some(&token),
            Some(json!({
                "playerId": "ghost",
                "matchResultId": "m-1",
                "stars": 4,
                "destructionPercentage": 50.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/performances",
            Some(&token),
            Some(json!({
                "playerId": "ghost",
                "matchResultId": "m-1",
                "stars": 2,
                "destructionPercentage": 50.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_body() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/performances",
            Some(&token),
            Some(json!({ "playerId": "p-1", "stars": "three" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, json) = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "username": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_player_requires_name() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, _) = send(
            &state,
            "POST",
            "/api/admin/players",
            Some(&token),
            Some(json!({ "name": "   ", "playerTag": "#X" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schedule_and_cancel_match() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (status, scheduled) = send(
            &state,
            "POST",
            "/api/admin/scheduled-matches",
            Some(&token),
            Some(json!({
                "opponentClanName": "Goblins",
                "matchTimeUtc": "2030-01-15T18:00:00Z",
                "notes": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(scheduled.get("notes").map_or(true, |n| n.is_null()));
        let id = scheduled["id"].as_str().unwrap().to_string();

        let (_, upcoming) = get_json(&state, "/api/matches/scheduled").await;
        assert_eq!(upcoming.as_array().unwrap().len(), 1);

        let uri = format!("/api/admin/scheduled-matches/{}", id);
        let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");

        let (_, upcoming) = get_json(&state, "/api/matches/scheduled").await;
        assert_eq!(upcoming.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_delete_player_cascades() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(temp_dir.path());
        let token = login(&state).await;

        let (_, player) = send(
            &state,
            "POST",
            "/api/admin/players",
            Some(&token),
            Some(json!({ "name": "Ada", "playerTag": "#ADA" })),
        )
        .await;
        let player_id = player["id"].as_str().unwrap().to_string();

        let (_, result) = send(
            &state,
            "POST",
            "/api/admin/match-results",
            Some(&token),
            Some(json!({ "opponentClanName": "Raiders", "matchDate": "2024-06-03" })),
        )
        .await;
        let match_id = result["id"].as_str().unwrap().to_string();

        send(
            &state,
            "POST",
            "/api/admin/performances",
            Some(&token),
            Some(json!({
                "playerId": player_id,
                "matchResultId": match_id,
                "stars": 1,
                "destructionPercentage": 40.0
            })),
        )
        .await;

        let uri = format!("/api/admin/players/{}", player_id);
        let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, past) = get_json(&state, "/api/matches/past").await;
        assert_eq!(past[0]["performances"].as_array().unwrap().len(), 0);
    }
}
