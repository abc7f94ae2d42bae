use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    gateway::teams,
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTeamRequest {
    pub team_id: Uuid,
}

pub async fn list_teams(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    Ok(Json(teams::list_for_user(&mut conn, user.user_id)?))
}

pub async fn create_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut conn = state.db()?;
    let team = teams::create_team(&mut conn, user.user_id, &payload.name)?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn current_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;
    teams::current_team(&mut conn, user.user_id)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn switch_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SwitchTeamRequest>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;
    let team = teams::switch_team(&mut conn, user.user_id, payload.team_id)?
        .ok_or_else(AppError::not_found)?;
    tracing::info!(user_id = %user.user_id, team_id = %payload.team_id, "active team switched");
    Ok(Json(team))
}
