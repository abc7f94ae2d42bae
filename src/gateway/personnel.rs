use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{
    client_row, client_rows, decode_payload, patch_body, patch_optional_text,
    patch_required_text, required_text, GatewayError, GatewayResult, ResourceGateway,
};
use crate::domain::ResourceKind;
use crate::models::{NewPersonnel, Personnel};
use crate::schema::personnel;
use crate::utils::json::non_empty;

pub struct PersonnelGateway;

#[derive(Deserialize)]
struct PersonnelInput {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    avatar_url: Option<String>,
    notes: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = personnel)]
struct PersonnelChangeset {
    name: Option<String>,
    email: Option<Option<String>>,
    phone: Option<Option<String>>,
    avatar_url: Option<Option<String>>,
    notes: Option<Option<String>>,
}

fn validate_email(email: Option<&str>) -> GatewayResult<()> {
    match email {
        Some(value) if !looks_like_email(value) => Err(GatewayError::validation(format!(
            "{value} is not a valid email address"
        ))),
        _ => Ok(()),
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Loads a personnel row for snapshotting into a shoot participant.
pub(crate) fn find_for_team(
    conn: &mut PgConnection,
    team_id: Uuid,
    id: Uuid,
) -> GatewayResult<Option<Personnel>> {
    Ok(personnel::table
        .filter(personnel::id.eq(id))
        .filter(personnel::team_id.eq(team_id))
        .first::<Personnel>(conn)
        .optional()?)
}

impl ResourceGateway for PersonnelGateway {
    const NAME: &'static str = ResourceKind::Personnel.path();
    const IMAGE_FIELD: Option<&'static str> = ResourceKind::Personnel.image_field();

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<Personnel> = personnel::table
            .filter(personnel::team_id.eq(team_id))
            .order((personnel::name.asc(), personnel::created_at.asc()))
            .load(conn)?;
        client_rows(&rows)
    }

    fn get_by_id(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
    ) -> GatewayResult<Option<Value>> {
        find_for_team(conn, team_id, id)?
            .as_ref()
            .map(client_row)
            .transpose()
    }

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value> {
        let input: PersonnelInput = decode_payload(payload)?;
        let email = non_empty(input.email);
        validate_email(email.as_deref())?;

        let now = Utc::now();
        let new_row = NewPersonnel {
            id: Uuid::new_v4(),
            team_id,
            name: required_text(input.name, "name")?,
            email,
            phone: non_empty(input.phone),
            avatar_url: non_empty(input.avatar_url),
            notes: non_empty(input.notes),
            created_at: now,
            updated_at: now,
        };

        let row: Personnel = diesel::insert_into(personnel::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::debug!(%team_id, personnel_id = %row.id, "personnel created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let changeset = PersonnelChangeset {
            name: patch_required_text(&body, "name")?,
            email: patch_optional_text(&body, "email")?,
            phone: patch_optional_text(&body, "phone")?,
            avatar_url: patch_optional_text(&body, "avatar_url")?,
            notes: patch_optional_text(&body, "notes")?,
        };
        if let Some(Some(email)) = &changeset.email {
            validate_email(Some(email))?;
        }

        let row = diesel::update(
            personnel::table
                .filter(personnel::id.eq(id))
                .filter(personnel::team_id.eq(team_id)),
        )
        .set((&changeset, personnel::updated_at.eq(Utc::now())))
        .get_result::<Personnel>(conn)
        .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            personnel::table
                .filter(personnel::id.eq(id))
                .filter(personnel::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
