use chrono::{NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::locations::exists_for_team;
use super::{
    client_row, client_rows, decode_payload, patch_body, patch_nullable, patch_optional_text,
    patch_required_text, patch_value, required_text, GatewayError, GatewayResult,
    ResourceGateway,
};
use crate::domain::ShootStatus;
use crate::models::{NewShoot, Shoot};
use crate::schema::shoots;
use crate::utils::json::{lenient_bool, lenient_i32, non_empty};

pub struct ShootGateway;

#[derive(Deserialize)]
struct ShootInput {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    date: Option<String>,
    time: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    duration_minutes: Option<i32>,
    location_id: Option<String>,
    location_notes: Option<String>,
    color: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    instagram_links: Option<Vec<String>>,
    calendar_event_url: Option<String>,
    docs_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_public: Option<bool>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = shoots)]
struct ShootChangeset {
    title: Option<String>,
    description: Option<Option<String>>,
    status: Option<String>,
    date: Option<Option<NaiveDate>>,
    time: Option<Option<String>>,
    duration_minutes: Option<Option<i32>>,
    location_id: Option<Option<Uuid>>,
    location_notes: Option<Option<String>>,
    color: Option<Option<String>>,
    notes: Option<Option<String>>,
    instagram_links: Option<Vec<String>>,
    calendar_event_url: Option<Option<String>>,
    docs_url: Option<Option<String>>,
    is_public: Option<bool>,
}

fn parse_status(raw: &str) -> GatewayResult<ShootStatus> {
    raw.parse::<ShootStatus>().map_err(GatewayError::Validation)
}

/// Accepts `YYYY-MM-DD` or a full ISO timestamp, keeping only the day.
fn parse_date(raw: &str) -> GatewayResult<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| GatewayError::validation(format!("invalid date: {raw}")))
}

/// Normalises `H:MM`, `HH:MM` and `HH:MM:SS` to `HH:MM`.
fn parse_time(raw: &str) -> GatewayResult<String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| GatewayError::validation(format!("invalid time: {raw}")))
}

fn parse_color(raw: &str) -> GatewayResult<String> {
    let trimmed = raw.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if !valid {
        return Err(GatewayError::validation(format!(
            "color must be a #RRGGBB hex value, got {raw}"
        )));
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn parse_location_id(raw: &str) -> GatewayResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| GatewayError::validation(format!("invalid location id: {raw}")))
}

fn validate_duration(minutes: Option<i32>) -> GatewayResult<()> {
    match minutes {
        Some(value) if value <= 0 => Err(GatewayError::validation(
            "duration must be a positive number of minutes",
        )),
        _ => Ok(()),
    }
}

fn clean_links(links: Vec<String>) -> Vec<String> {
    links
        .into_iter()
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
        .collect()
}

fn ensure_dated(status: ShootStatus, date: Option<NaiveDate>) -> GatewayResult<()> {
    if date.is_none() && !status.allows_missing_date() {
        return Err(GatewayError::validation(format!(
            "a {status} shoot needs a date"
        )));
    }
    Ok(())
}

fn ensure_location(
    conn: &mut PgConnection,
    team_id: Uuid,
    location_id: Option<Uuid>,
) -> GatewayResult<()> {
    if let Some(location_id) = location_id {
        if !exists_for_team(conn, team_id, location_id)? {
            return Err(GatewayError::validation("location does not exist"));
        }
    }
    Ok(())
}

fn find_for_team(
    conn: &mut PgConnection,
    team_id: Uuid,
    id: Uuid,
) -> GatewayResult<Option<Shoot>> {
    Ok(shoots::table
        .filter(shoots::id.eq(id))
        .filter(shoots::team_id.eq(team_id))
        .first::<Shoot>(conn)
        .optional()?)
}

/// True when the shoot exists and belongs to the team.
pub(crate) fn owned_by_team(
    conn: &mut PgConnection,
    team_id: Uuid,
    id: Uuid,
) -> GatewayResult<bool> {
    let found = shoots::table
        .filter(shoots::id.eq(id))
        .filter(shoots::team_id.eq(team_id))
        .select(shoots::id)
        .first::<Uuid>(conn)
        .optional()?;
    Ok(found.is_some())
}

impl ResourceGateway for ShootGateway {
    const NAME: &'static str = "shoots";

    fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
        let rows: Vec<Shoot> = shoots::table
            .filter(shoots::team_id.eq(team_id))
            .order((
                shoots::date.asc().nulls_last(),
                shoots::time.asc().nulls_last(),
                shoots::created_at.asc(),
            ))
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
        let input: ShootInput = decode_payload(payload)?;
        let title = required_text(input.title, "title")?;
        let status = match non_empty(input.status) {
            Some(raw) => parse_status(&raw)?,
            None => ShootStatus::Idea,
        };
        let date = non_empty(input.date)
            .map(|raw| parse_date(&raw))
            .transpose()?;
        ensure_dated(status, date)?;
        let time = non_empty(input.time)
            .map(|raw| parse_time(&raw))
            .transpose()?;
        let color = non_empty(input.color)
            .map(|raw| parse_color(&raw))
            .transpose()?;
        validate_duration(input.duration_minutes)?;
        let location_id = non_empty(input.location_id)
            .map(|raw| parse_location_id(&raw))
            .transpose()?;
        ensure_location(conn, team_id, location_id)?;

        let now = Utc::now();
        let new_row = NewShoot {
            id: Uuid::new_v4(),
            team_id,
            title,
            description: non_empty(input.description),
            status: status.as_str().to_string(),
            date,
            time,
            duration_minutes: input.duration_minutes,
            location_id,
            location_notes: non_empty(input.location_notes),
            color,
            notes: non_empty(input.notes),
            instagram_links: clean_links(input.instagram_links.unwrap_or_default()),
            calendar_event_url: non_empty(input.calendar_event_url),
            docs_url: non_empty(input.docs_url),
            is_public: input.is_public.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };

        let row: Shoot = diesel::insert_into(shoots::table)
            .values(&new_row)
            .get_result(conn)?;
        tracing::info!(%team_id, shoot_id = %row.id, status = %row.status, "shoot created");
        client_row(&row)
    }

    fn update(
        conn: &mut PgConnection,
        team_id: Uuid,
        id: Uuid,
        patch: Value,
    ) -> GatewayResult<Option<Value>> {
        let body = patch_body(patch)?;
        let Some(existing) = find_for_team(conn, team_id, id)? else {
            return Ok(None);
        };

        let status = patch_value::<String>(&body, "status")?
            .map(|raw| parse_status(&raw))
            .transpose()?;
        let date = match patch_optional_text(&body, "date")? {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_date(&raw)?)),
        };
        let time = match patch_optional_text(&body, "time")? {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_time(&raw)?)),
        };
        let color = match patch_optional_text(&body, "color")? {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(Some(parse_color(&raw)?)),
        };
        let duration_minutes = patch_nullable::<i32>(&body, "duration_minutes")?;
        if let Some(minutes) = duration_minutes {
            validate_duration(minutes)?;
        }
        let location_id = patch_nullable::<Uuid>(&body, "location_id")?;
        if let Some(location) = location_id {
            ensure_location(conn, team_id, location)?;
        }

        let effective_status = match status {
            Some(status) => status,
            None => parse_status(&existing.status)?,
        };
        let effective_date = date.unwrap_or(existing.date);
        ensure_dated(effective_status, effective_date)?;

        let changeset = ShootChangeset {
            title: patch_required_text(&body, "title")?,
            description: patch_optional_text(&body, "description")?,
            status: status.map(|status| status.as_str().to_string()),
            date,
            time,
            duration_minutes,
            location_id,
            location_notes: patch_optional_text(&body, "location_notes")?,
            color,
            notes: patch_optional_text(&body, "notes")?,
            instagram_links: patch_value::<Vec<String>>(&body, "instagram_links")?
                .map(clean_links),
            calendar_event_url: patch_optional_text(&body, "calendar_event_url")?,
            docs_url: patch_optional_text(&body, "docs_url")?,
            is_public: patch_value(&body, "is_public")?,
        };

        let row = diesel::update(
            shoots::table
                .filter(shoots::id.eq(id))
                .filter(shoots::team_id.eq(team_id)),
        )
        .set((&changeset, shoots::updated_at.eq(Utc::now())))
        .get_result::<Shoot>(conn)
        .optional()?;
        if let Some(row) = &row {
            if row.status != existing.status {
                tracing::info!(
                    %team_id,
                    shoot_id = %row.id,
                    from = %existing.status,
                    to = %row.status,
                    "shoot status changed"
                );
            }
        }
        row.as_ref().map(client_row).transpose()
    }

    fn delete(conn: &mut PgConnection, team_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let deleted = diesel::delete(
            shoots::table
                .filter(shoots::id.eq(id))
                .filter(shoots::team_id.eq(team_id)),
        )
        .execute(conn)?;
        Ok(deleted > 0)
    }
}
