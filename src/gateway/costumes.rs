use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{
    client_row, client_rows, decode_payload, patch_body, patch_optional_text,
    patch_required_text, patch_value, required_text, GatewayError, GatewayResult,
    ResourceGateway,
};
use crate::domain::{CostumeStatus, ResourceKind};
use crate::models::{CostumeProgress, NewCostumeProgress};
use crate::schema::costume_progress;
use crate::utils::json::{lenient_i32, non_empty};

pub struct CostumeGateway;

#[derive(Deserialize)]
struct CostumeInput {
    character_name: Option<String>,
    series_name: Option<String>,
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    completion_percentage: Option<i32>,
    notes: Option<String>,
    #[serde(default)]
    todos: Option<Vec<String>>,
    image_url: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = costume_progress)]
struct CostumeChangeset {
    character_name: Option<String>,
    series_name: Option<Option<String>>,
    status: Option<String>,
    completion_percentage: Option<i32>,
    notes: Option<Option<String>>,
    todos: Option<Vec<String>>,
    image_url: Option<Option<String>>,
}

fn parse_status(raw: &str) -> GatewayResult<String> {
    raw.parse::<CostumeStatus>()
        .map(|status| status.as_str().to_string())
        .map_err(GatewayError::Validation)
}

fn validate_percentage(value: i32) -> GatewayResult<()> {
    if !(0..=100).contains(&value) {
        return Err(GatewayError::validation(
            "completion percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

/// Todo items keep their order; blank entries are dropped.
fn clean_todos(todos: Vec<String>) -> Vec<String> {
    todos
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl ResourceGateway for CostumeGateway {
    const NAME: &'static str = ResourceKind::Costumes.path();
    const IMAGE_FIELD: Option<&'static str> = ResourceKind::Costumes.image_field();

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<CostumeProgress> = costume_progress::table
            .filter(costume_progress::team_id.eq(team_id))
            .order((
                costume_progress::character_name.asc(),
                costume_progress::created_at.asc(),
            ))
            .load(conn)?;
        client_rows(&rows)
    }

    fn get_by_id(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
    ) -> GatewayResult<Option<Value>> {
        let row = costume_progress::table
            .filter(costume_progress::id.eq(id))
            .filter(costume_progress::team_id.eq(team_id))
            .first::<CostumeProgress>(conn)
            .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value> {
        let input: CostumeInput = decode_payload(payload)?;
        let status = match non_empty(input.status) {
            Some(raw) => parse_status(&raw)?,
            None => CostumeStatus::Planning.as_str().to_string(),
        };
        let completion_percentage = input.completion_percentage.unwrap_or(0);
        validate_percentage(completion_percentage)?;

        let now = Utc::now();
        let new_row = NewCostumeProgress {
            id: Uuid::new_v4(),
            team_id,
            character_name: required_text(input.character_name, "character name")?,
            series_name: non_empty(input.series_name),
            status,
            completion_percentage,
            notes: non_empty(input.notes),
            todos: clean_todos(input.todos.unwrap_or_default()),
            image_url: non_empty(input.image_url),
            created_at: now,
            updated_at: now,
        };

        let row: CostumeProgress = diesel::insert_into(costume_progress::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::debug!(%team_id, costume_id = %row.id, "costume created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let status = match patch_value::<String>(&body, "status")? {
            Some(raw) => Some(parse_status(&raw)?),
            None => None,
        };
        let completion_percentage = patch_value::<i32>(&body, "completion_percentage")?;
        if let Some(value) = completion_percentage {
            validate_percentage(value)?;
        }

        let changeset = CostumeChangeset {
            character_name: patch_required_text(&body, "character_name")?,
            series_name: patch_optional_text(&body, "series_name")?,
            status,
            completion_percentage,
            notes: patch_optional_text(&body, "notes")?,
            todos: patch_value::<Vec<String>>(&body, "todos")?.map(clean_todos),
            image_url: patch_optional_text(&body, "image_url")?,
        };

        let row = diesel::update(
            costume_progress::table
                .filter(costume_progress::id.eq(id))
                .filter(costume_progress::team_id.eq(team_id)),
        )
        .set((&changeset, costume_progress::updated_at.eq(Utc::now())))
        .get_result::<CostumeProgress>(conn)
        .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            costume_progress::table
                .filter(costume_progress::id.eq(id))
                .filter(costume_progress::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
