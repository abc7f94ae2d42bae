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
use crate::domain::ResourceKind;
use crate::models::{Equipment, NewEquipment};
use crate::schema::equipment;
use crate::utils::json::{lenient_bool, lenient_i32, non_empty};

pub struct EquipmentGateway;

#[derive(Deserialize)]
struct EquipmentInput {
    name: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    quantity: Option<i32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    available: Option<bool>,
    image_url: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = equipment)]
struct EquipmentChangeset {
    name: Option<String>,
    category: Option<String>,
    description: Option<Option<String>>,
    quantity: Option<i32>,
    available: Option<bool>,
    image_url: Option<Option<String>>,
}

fn validate_quantity(quantity: i32) -> GatewayResult<()> {
    if quantity < 1 {
        return Err(GatewayError::validation("quantity must be at least 1"));
    }
    Ok(())
}

impl ResourceGateway for EquipmentGateway {
    const NAME: &'static str = ResourceKind::Equipment.path();
    const IMAGE_FIELD: Option<&'static str> = ResourceKind::Equipment.image_field();

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<Equipment> = equipment::table
            .filter(equipment::team_id.eq(team_id))
            .order((equipment::name.asc(), equipment::created_at.asc()))
            .load(conn)?;
        client_rows(&rows)
    }

    fn get_by_id(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
    ) -> GatewayResult<Option<Value>> {
        let row = equipment::table
            .filter(equipment::id.eq(id))
            .filter(equipment::team_id.eq(team_id))
            .first::<Equipment>(conn)
            .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value> {
        let input: EquipmentInput = decode_payload(payload)?;
        let name = required_text(input.name, "name")?;
        let category = required_text(input.category, "category")?;
        let quantity = input.quantity.unwrap_or(1);
        validate_quantity(quantity)?;

        let now = Utc::now();
        let new_row = NewEquipment {
            id: Uuid::new_v4(),
            team_id,
            name,
            category,
            description: non_empty(input.description),
            quantity,
            available: input.available.unwrap_or(true),
            image_url: non_empty(input.image_url),
            created_at: now,
            updated_at: now,
        };

        let row: Equipment = diesel::insert_into(equipment::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::debug!(%team_id, equipment_id = %row.id, "equipment created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let changeset = EquipmentChangeset {
            name: patch_required_text(&body, "name")?,
            category: patch_required_text(&body, "category")?,
            description: patch_optional_text(&body, "description")?,
            quantity: patch_value(&body, "quantity")?,
            available: patch_value(&body, "available")?,
            image_url: patch_optional_text(&body, "image_url")?,
        };
        if let Some(quantity) = changeset.quantity {
            validate_quantity(quantity)?;
        }

        let row = diesel::update(
            equipment::table
                .filter(equipment::id.eq(id))
                .filter(equipment::team_id.eq(team_id)),
        )
        .set((&changeset, equipment::updated_at.eq(Utc::now())))
        .get_result::<Equipment>(conn)
        .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            equipment::table
                .filter(equipment::id.eq(id))
                .filter(equipment::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
