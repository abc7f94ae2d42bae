//! Team-scoped data access for shoots and team resources.
//!
//! Every gateway takes client-shape JSON in and hands client-shape JSON back;
//! the snake_case storage shape never leaves this module. Reads and writes are
//! always filtered by `team_id`, so a row owned by another team behaves
//! exactly like a missing one.

use diesel::PgConnection;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::case::{to_client_shape, to_storage_shape};
use crate::utils::json::{non_empty, patch_field, Patch};

pub mod costumes;
pub mod equipment;
pub mod files;
pub mod locations;
pub mod personnel;
pub mod props;
pub mod shoot_links;
pub mod shoots;
pub mod teams;

pub use costumes::CostumeGateway;
pub use equipment::EquipmentGateway;
pub use locations::LocationGateway;
pub use personnel::PersonnelGateway;
pub use props::PropGateway;
pub use shoots::ShootGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("failed to encode row: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }
}

/// CRUD surface shared by every top-level collection under `/api`.
pub trait ResourceGateway: Send + Sync + 'static {
    /// Collection name, used for routes, storage folders and logs.
    const NAME: &'static str;
    /// Client-shape key that receives an uploaded image URL.
    const IMAGE_FIELD: Option<&'static str> = None;

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>>;

    fn get_by_id(conn: &mut PgConnection, team_id: Uuid, id: Uuid)
        -> GatewayResult<Option<Value>>;

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value>;

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>>;

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool>;
}

pub(crate) fn client_row<T: Serialize>(row: &T) -> GatewayResult<Value> {
    Ok(to_client_shape(serde_json::to_value(row)?))
}

pub(crate) fn client_rows<T: Serialize>(rows: &[T]) -> GatewayResult<Vec<Value>> {
    rows.iter().map(client_row).collect()
}

pub(crate) fn decode_payload<T: DeserializeOwned>(payload: Value) -> GatewayResult<T> {
    let storage = to_storage_shape(payload);
    if !storage.is_object() {
        return Err(GatewayError::validation("payload must be a JSON object"));
    }
    serde_json::from_value(storage)
        .map_err(|err| GatewayError::validation(format!("invalid payload: {err}")))
}

pub(crate) fn patch_body(patch: Value) -> GatewayResult<Map<String, Value>> {
    match to_storage_shape(patch) {
        Value::Object(body) => Ok(body),
        _ => Err(GatewayError::validation("patch must be a JSON object")),
    }
}

pub(crate) fn required_text(value: Option<String>, field: &str) -> GatewayResult<String> {
    non_empty(value).ok_or_else(|| GatewayError::validation(format!("{field} is required")))
}

/// `None` leaves the column untouched.
pub(crate) fn patch_required_text(
    body: &Map<String, Value>,
    field: &str,
) -> GatewayResult<Option<String>> {
    match patch_field::<String>(body, field).map_err(GatewayError::Validation)? {
        Patch::Omitted => Ok(None),
        Patch::Null => Err(GatewayError::validation(format!(
            "{field} cannot be null"
        ))),
        Patch::Value(value) => required_text(Some(value), field).map(Some),
    }
}

/// `Some(None)` clears the column; blank strings clear it too.
pub(crate) fn patch_optional_text(
    body: &Map<String, Value>,
    field: &str,
) -> GatewayResult<Option<Option<String>>> {
    match patch_field::<String>(body, field).map_err(GatewayError::Validation)? {
        Patch::Omitted => Ok(None),
        Patch::Null => Ok(Some(None)),
        Patch::Value(value) => Ok(Some(non_empty(Some(value)))),
    }
}

pub(crate) fn patch_value<T: DeserializeOwned>(
    body: &Map<String, Value>,
    field: &str,
) -> GatewayResult<Option<T>> {
    match patch_field::<T>(body, field).map_err(GatewayError::Validation)? {
        Patch::Omitted => Ok(None),
        Patch::Null => Err(GatewayError::validation(format!(
            "{field} cannot be null"
        ))),
        Patch::Value(value) => Ok(Some(value)),
    }
}

pub(crate) fn patch_nullable<T: DeserializeOwned>(
    body: &Map<String, Value>,
    field: &str,
) -> GatewayResult<Option<Option<T>>> {
    match patch_field::<T>(body, field).map_err(GatewayError::Validation)? {
        Patch::Omitted => Ok(None),
        Patch::Null => Ok(Some(None)),
        Patch::Value(value) => Ok(Some(Some(value))),
    }
}
