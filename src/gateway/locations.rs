use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{
    client_row, client_rows, decode_payload, patch_body, patch_nullable, patch_optional_text,
    patch_required_text, required_text, GatewayError, GatewayResult, ResourceGateway,
};
use crate::domain::ResourceKind;
use crate::models::{Location, NewLocation};
use crate::schema::locations;
use crate::utils::json::{lenient_f64, non_empty};

pub struct LocationGateway;

#[derive(Deserialize)]
struct LocationInput {
    name: Option<String>,
    address: Option<String>,
    place_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    notes: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = locations)]
struct LocationChangeset {
    name: Option<String>,
    address: Option<Option<String>>,
    place_id: Option<Option<String>>,
    latitude: Option<Option<f64>>,
    longitude: Option<Option<f64>>,
    notes: Option<Option<String>>,
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> GatewayResult<()> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(GatewayError::validation(
                    "latitude must be between -90 and 90",
                ));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(GatewayError::validation(
                    "longitude must be between -180 and 180",
                ));
            }
            Ok(())
        }
        _ => Err(GatewayError::validation(
            "latitude and longitude must be provided together",
        )),
    }
}

/// Confirms a location id belongs to the team before a shoot points at it.
pub(crate) fn exists_for_team(
    conn: &mut PgConnection,
    team_id: Uuid,
    id: Uuid,
) -> GatewayResult<bool> {
    let found = locations::table
        .filter(locations::id.eq(id))
        .filter(locations::team_id.eq(team_id))
        .select(locations::id)
        .first::<Uuid>(conn)
        .optional()?;
    Ok(found.is_some())
}

impl ResourceGateway for LocationGateway {
    const NAME: &'static str = ResourceKind::Locations.path();

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<Location> = locations::table
            .filter(locations::team_id.eq(team_id))
            .order((locations::name.asc(), locations::created_at.asc()))
            .load(conn)?;
        client_rows(&rows)
    }

    fn get_by_id(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
    ) -> GatewayResult<Option<Value>> {
        let row = locations::table
            .filter(locations::id.eq(id))
            .filter(locations::team_id.eq(team_id))
            .first::<Location>(conn)
            .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn create(conn: &mut PgConnection, team_id: Uuid, payload: Value) -> GatewayResult<Value> {
        let input: LocationInput = decode_payload(payload)?;
        validate_coordinates(input.latitude, input.longitude)?;

        let now = Utc::now();
        let new_row = NewLocation {
            id: Uuid::new_v4(),
            team_id,
            name: required_text(input.name, "name")?,
            address: non_empty(input.address),
            place_id: non_empty(input.place_id),
            latitude: input.latitude,
            longitude: input.longitude,
            notes: non_empty(input.notes),
            created_at: now,
            updated_at: now,
        };

        let row: Location = diesel::insert_into(locations::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::debug!(%team_id, location_id = %row.id, "location created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let existing = match locations::table
            .filter(locations::id.eq(id))
            .filter(locations::team_id.eq(team_id))
            .first::<Location>(conn)
            .optional()?
        {
            Some(location) => location,
            None => return Ok(None),
        };

        let changeset = LocationChangeset {
            name: patch_required_text(&body, "name")?,
            address: patch_optional_text(&body, "address")?,
            place_id: patch_optional_text(&body, "place_id")?,
            latitude: patch_nullable(&body, "latitude")?,
            longitude: patch_nullable(&body, "longitude")?,
            notes: patch_optional_text(&body, "notes")?,
        };
        validate_coordinates(
            changeset.latitude.unwrap_or(existing.latitude),
            changeset.longitude.unwrap_or(existing.longitude),
        )?;

        let row = diesel::update(
            locations::table
                .filter(locations::id.eq(id))
                .filter(locations::team_id.eq(team_id)),
        )
        .set((&changeset, locations::updated_at.eq(Utc::now())))
        .get_result::<Location>(conn)
        .optional()?;
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            locations::table
                .filter(locations::id.eq(id))
                .filter(locations::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
