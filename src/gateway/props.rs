use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{
    client_row, client_rows, decode_payload, patch_body, patch_optional_text,
    patch_required_text, patch_value, required_text, GatewayResult, ResourceGateway,
};
use crate::domain::ResourceKind;
use crate::models::{NewProp, Prop};
use crate::schema::props;
use crate::utils::json::{lenient_bool, non_empty};

pub struct PropGateway;

#[derive(Deserialize)]
struct PropInput {
    name: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    available: Option<bool>,
    image_url: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = props)]
struct PropChangeset {
    name: Option<String>,
    description: Option<Option<String>>,
    available: Option<bool>,
    image_url: Option<Option<String>>,
}

impl ResourceGateway for PropGateway {
    const NAME: &'static str = ResourceKind::Props.path();
    const IMAGE_FIELD: Option<&'static str> = ResourceKind::Props.image_field();

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<Prop> = props::table
            .filter(props::team_id.eq(team_id))
            .order((props::name.asc(), props::created_at.asc()))
            .load(conn)?;
        client_rows(&rows)
    }

    fn get_by_id(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
    ) -> GatewayResult<Option<Value>> {
        let row = props::table
            .filter(props::id.eq(id))
            .filter(props::team_id.eq(team_id))
            .first::<Prop>(conn)
            .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value> {
        let input: PropInput = decode_payload(payload)?;
        let now = Utc::now();
        let new_row = NewProp {
            id: Uuid::new_v4(),
            team_id,
            name: required_text(input.name, "name")?,
            description: non_empty(input.description),
            available: input.available.unwrap_or(true),
            image_url: non_empty(input.image_url),
            created_at: now,
            updated_at: now,
        };

        let row: Prop = diesel::insert_into(props::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::debug!(%team_id, prop_id = %row.id, "prop created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let changeset = PropChangeset {
            name: patch_required_text(&body, "name")?,
            description: patch_optional_text(&body, "description")?,
            available: patch_value(&body, "available")?,
            image_url: patch_optional_text(&body, "image_url")?,
        };

        let row = diesel::update(
            props::table
                .filter(props::id.eq(id))
                .filter(props::team_id.eq(team_id)),
        )
        .set((&changeset, props::updated_at.eq(Utc::now())))
        .get_result::<Prop>(conn)
        .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            props::table
                .filter(props::id.eq(id))
                .filter(props::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
