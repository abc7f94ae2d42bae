use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use super::resources;
use crate::{
    auth::TeamScope,
    error::{AppError, AppResult},
    gateway::{
        shoot_links::{self, LinkedKind},
        ShootGateway,
    },
    state::AppState,
};

/// Marker types selecting which join table a linked-resource route uses.
pub trait LinkedRoute: Send + Sync + 'static {
    const KIND: LinkedKind;
}

pub struct EquipmentLinks;
pub struct PropLinks;
pub struct CostumeLinks;

impl LinkedRoute for EquipmentLinks {
    const KIND: LinkedKind = LinkedKind::Equipment;
}

impl LinkedRoute for PropLinks {
    const KIND: LinkedKind = LinkedKind::Props;
}

impl LinkedRoute for CostumeLinks {
    const KIND: LinkedKind = LinkedKind::Costumes;
}

pub async fn list_participants(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    shoot_links::list_participants(&mut conn, scope.team_id, shoot_id)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn add_participant(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut conn = state.db()?;
    let participant = shoot_links::add_participant(&mut conn, scope.team_id, shoot_id, payload)?
        .ok_or_else(AppError::not_found)?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn update_participant(
    State(state): State<AppState>,
    scope: TeamScope,
    Path((shoot_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<Value>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;
    shoot_links::update_participant(&mut conn, scope.team_id, shoot_id, participant_id, patch)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn remove_participant(
    State(state): State<AppState>,
    scope: TeamScope,
    Path((shoot_id, participant_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    if !shoot_links::remove_participant(&mut conn, scope.team_id, shoot_id, participant_id)? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_linked<L: LinkedRoute>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    shoot_links::list_linked(&mut conn, scope.team_id, shoot_id, L::KIND)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn link<L: LinkedRoute>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut conn = state.db()?;
    let linked = shoot_links::link(&mut conn, scope.team_id, shoot_id, L::KIND, payload)?
        .ok_or_else(AppError::not_found)?;
    Ok((StatusCode::CREATED, Json(linked)))
}

pub async fn unlink<L: LinkedRoute>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path((shoot_id, resource_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    if !shoot_links::unlink(&mut conn, scope.team_id, shoot_id, L::KIND, resource_id)? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_references(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    shoot_links::list_references(&mut conn, scope.team_id, shoot_id)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn add_reference(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(shoot_id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut conn = state.db()?;
    let reference = shoot_links::add_reference(&mut conn, scope.team_id, shoot_id, payload)?
        .ok_or_else(AppError::not_found)?;
    Ok((StatusCode::CREATED, Json(reference)))
}

pub async fn delete_reference(
    State(state): State<AppState>,
    scope: TeamScope,
    Path((shoot_id, reference_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    if !shoot_links::delete_reference(&mut conn, scope.team_id, shoot_id, reference_id)? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn shoot_routes() -> Router<AppState> {
    resources::resource_routes::<ShootGateway>()
        .route(
            "/:id/participants",
            get(list_participants).post(add_participant),
        )
        .route(
            "/:id/participants/:participant_id",
            patch(update_participant).delete(remove_participant),
        )
        .route(
            "/:id/equipment",
            get(list_linked::<EquipmentLinks>).post(link::<EquipmentLinks>),
        )
        .route("/:id/equipment/:resource_id", delete(unlink::<EquipmentLinks>))
        .route(
            "/:id/props",
            get(list_linked::<PropLinks>).post(link::<PropLinks>),
        )
        .route("/:id/props/:resource_id", delete(unlink::<PropLinks>))
        .route(
            "/:id/costumes",
            get(list_linked::<CostumeLinks>).post(link::<CostumeLinks>),
        )
        .route("/:id/costumes/:resource_id", delete(unlink::<CostumeLinks>))
        .route(
            "/:id/references",
            get(list_references).post(add_reference),
        )
        .route("/:id/references/:reference_id", delete(delete_reference))
}
