//! Everything hanging off a single shoot: participants, linked team
//! resources and reference material.
//!
//! Each function first confirms the shoot belongs to the caller's team and
//! returns `None` (or `false`) when it does not, so the routes can answer 404
//! without leaking other teams' ids.

use diesel::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::shoots::owned_by_team;
use super::{
    client_row, client_rows, decode_payload, patch_body, patch_optional_text, GatewayError,
    GatewayResult,
};
use crate::domain::{ReferenceType, ResourceKind};
use crate::models::{
    CostumeProgress, Equipment, NewShootCostume, NewShootEquipment, NewShootParticipant,
    NewShootProp, NewShootReference, Prop, ShootParticipant, ShootReference,
};
use crate::schema::{
    costume_progress, equipment, props, shoot_costumes, shoot_equipment, shoot_participants,
    shoot_props, shoot_references,
};
use crate::utils::json::non_empty;

use super::personnel::find_for_team as find_personnel;

/// Team resources that attach to a shoot through a plain join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedKind {
    Equipment,
    Props,
    Costumes,
}

impl LinkedKind {
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            LinkedKind::Equipment => ResourceKind::Equipment,
            LinkedKind::Props => ResourceKind::Props,
            LinkedKind::Costumes => ResourceKind::Costumes,
        }
    }
}

#[derive(Deserialize)]
struct ParticipantInput {
    personnel_id: Option<Uuid>,
    role: Option<String>,
}

#[derive(Deserialize)]
struct LinkInput {
    id: Option<Uuid>,
    equipment_id: Option<Uuid>,
    prop_id: Option<Uuid>,
    costume_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ReferenceInput {
    #[serde(rename = "type")]
    reference_type: Option<String>,
    url: Option<String>,
    notes: Option<String>,
}

pub fn list_participants(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
) -> GatewayResult<Option<Vec<Value>>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let rows: Vec<ShootParticipant> = shoot_participants::table
        .filter(shoot_participants::shoot_id.eq(shoot_id))
        .order((shoot_participants::created_at.asc(), shoot_participants::name.asc()))
        .load(conn)?;
    client_rows(&rows).map(Some)
}

/// Adds a crew member to the shoot, copying their current name and email.
pub fn add_participant(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    payload: Value,
) -> GatewayResult<Option<Value>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let input: ParticipantInput = decode_payload(payload)?;
    let personnel_id = input
        .personnel_id
        .ok_or_else(|| GatewayError::validation("personnel id is required"))?;
    let person = find_personnel(conn, team_id, personnel_id)?
        .ok_or_else(|| GatewayError::validation("personnel does not exist"))?;

    let already = shoot_participants::table
        .filter(shoot_participants::shoot_id.eq(shoot_id))
        .filter(shoot_participants::personnel_id.eq(personnel_id))
        .select(shoot_participants::id)
        .first::<Uuid>(conn)
        .optional()?;
    if already.is_some() {
        return Err(GatewayError::validation(format!(
            "{} is already on this shoot",
            person.name
        )));
    }

    let row: ShootParticipant = diesel::insert_into(shoot_participants::table)
        .values(&NewShootParticipant {
            id: Uuid::new_v4(),
            shoot_id,
            personnel_id,
            role: non_empty(input.role),
            name: person.name,
            email: person.email,
        })
        .get_result(conn)?;
    tracing::debug!(%shoot_id, %personnel_id, "participant added");
    client_row(&row).map(Some)
}

/// Only the role is editable; the name and email snapshot stays as captured.
pub fn update_participant(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    participant_id: Uuid,
    patch: Value,
) -> GatewayResult<Option<Value>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let body = patch_body(patch)?;
    let target = shoot_participants::table
        .filter(shoot_participants::id.eq(participant_id))
        .filter(shoot_participants::shoot_id.eq(shoot_id));

    let row = match patch_optional_text(&body, "role")? {
        Some(role) => diesel::update(target)
            .set(shoot_participants::role.eq(role))
            .get_result::<ShootParticipant>(conn)
            .optional()?,
        None => target.first::<ShootParticipant>(conn).optional()?,
    };
    row.as_ref().map(client_row).transpose()
}

pub fn remove_participant(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    participant_id: Uuid,
) -> GatewayResult<bool> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(false);
    }
    let deleted = diesel::delete(
        shoot_participants::table
            .filter(shoot_participants::id.eq(participant_id))
            .filter(shoot_participants::shoot_id.eq(shoot_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

pub fn list_linked(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    kind: LinkedKind,
) -> GatewayResult<Option<Vec<Value>>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let rows = match kind {
        LinkedKind::Equipment => {
            let rows: Vec<Equipment> = equipment::table
                .inner_join(shoot_equipment::table)
                .filter(shoot_equipment::shoot_id.eq(shoot_id))
                .select(equipment::all_columns)
                .order(equipment::name.asc())
                .load(conn)?;
            client_rows(&rows)?
        }
        LinkedKind::Props => {
            let rows: Vec<Prop> = props::table
                .inner_join(shoot_props::table)
                .filter(shoot_props::shoot_id.eq(shoot_id))
                .select(props::all_columns)
                .order(props::name.asc())
                .load(conn)?;
            client_rows(&rows)?
        }
        LinkedKind::Costumes => {
            let rows: Vec<CostumeProgress> = costume_progress::table
                .inner_join(shoot_costumes::table)
                .filter(shoot_costumes::shoot_id.eq(shoot_id))
                .select(costume_progress::all_columns)
                .order(costume_progress::character_name.asc())
                .load(conn)?;
            client_rows(&rows)?
        }
    };
    Ok(Some(rows))
}

/// Links a team resource to the shoot and returns the resource. Linking the
/// same resource twice leaves a single association.
pub fn link(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    kind: LinkedKind,
    payload: Value,
) -> GatewayResult<Option<Value>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let input: LinkInput = decode_payload(payload)?;
    let specific = match kind {
        LinkedKind::Equipment => input.equipment_id,
        LinkedKind::Props => input.prop_id,
        LinkedKind::Costumes => input.costume_id,
    };
    let resource_id = specific
        .or(input.id)
        .ok_or_else(|| GatewayError::validation(format!("{} id is required", kind.resource_kind())))?;

    let missing = || GatewayError::validation(format!("{} does not exist", kind.resource_kind()));
    let resource = match kind {
        LinkedKind::Equipment => {
            let row = equipment::table
                .filter(equipment::id.eq(resource_id))
                .filter(equipment::team_id.eq(team_id))
                .first::<Equipment>(conn)
                .optional()?
                .ok_or_else(missing)?;
            diesel::insert_into(shoot_equipment::table)
                .values(&NewShootEquipment {
                    shoot_id,
                    equipment_id: resource_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            client_row(&row)?
        }
        LinkedKind::Props => {
            let row = props::table
                .filter(props::id.eq(resource_id))
                .filter(props::team_id.eq(team_id))
                .first::<Prop>(conn)
                .optional()?
                .ok_or_else(missing)?;
            diesel::insert_into(shoot_props::table)
                .values(&NewShootProp {
                    shoot_id,
                    prop_id: resource_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            client_row(&row)?
        }
        LinkedKind::Costumes => {
            let row = costume_progress::table
                .filter(costume_progress::id.eq(resource_id))
                .filter(costume_progress::team_id.eq(team_id))
                .first::<CostumeProgress>(conn)
                .optional()?
                .ok_or_else(missing)?;
            diesel::insert_into(shoot_costumes::table)
                .values(&NewShootCostume {
                    shoot_id,
                    costume_id: resource_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            client_row(&row)?
        }
    };
    tracing::debug!(%shoot_id, %resource_id, kind = %kind.resource_kind(), "resource linked");
    Ok(Some(resource))
}

pub fn unlink(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    kind: LinkedKind,
    resource_id: Uuid,
) -> GatewayResult<bool> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(false);
    }
    let deleted = match kind {
        LinkedKind::Equipment => diesel::delete(
            shoot_equipment::table
                .filter(shoot_equipment::shoot_id.eq(shoot_id))
                .filter(shoot_equipment::equipment_id.eq(resource_id)),
        )
        .execute(conn)?,
        LinkedKind::Props => diesel::delete(
            shoot_props::table
                .filter(shoot_props::shoot_id.eq(shoot_id))
                .filter(shoot_props::prop_id.eq(resource_id)),
        )
        .execute(conn)?,
        LinkedKind::Costumes => diesel::delete(
            shoot_costumes::table
                .filter(shoot_costumes::shoot_id.eq(shoot_id))
                .filter(shoot_costumes::costume_id.eq(resource_id)),
        )
        .execute(conn)?,
    };
    Ok(deleted > 0)
}

pub fn list_references(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
) -> GatewayResult<Option<Vec<Value>>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let rows: Vec<ShootReference> = shoot_references::table
        .filter(shoot_references::shoot_id.eq(shoot_id))
        .order(shoot_references::created_at.asc())
        .load(conn)?;
    client_rows(&rows).map(Some)
}

pub fn add_reference(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    payload: Value,
) -> GatewayResult<Option<Value>> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(None);
    }
    let input: ReferenceInput = decode_payload(payload)?;
    let reference_type = match non_empty(input.reference_type) {
        Some(raw) => raw
            .parse::<ReferenceType>()
            .map_err(GatewayError::Validation)?,
        None => ReferenceType::Image,
    };
    let url = non_empty(input.url).ok_or_else(|| GatewayError::validation("url is required"))?;

    let row: ShootReference = diesel::insert_into(shoot_references::table)
        .values(&NewShootReference {
            id: Uuid::new_v4(),
            shoot_id,
            reference_type: reference_type.as_str().to_string(),
            url,
            notes: non_empty(input.notes),
        })
        .get_result(conn)?;
    client_row(&row).map(Some)
}

pub fn delete_reference(
    conn: &mut PgConnection,
    team_id: Uuid,
    shoot_id: Uuid,
    reference_id: Uuid,
) -> GatewayResult<bool> {
    if !owned_by_team(conn, team_id, shoot_id)? {
        return Ok(false);
    }
    let deleted = diesel::delete(
        shoot_references::table
            .filter(shoot_references::id.eq(reference_id))
            .filter(shoot_references::shoot_id.eq(shoot_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_rows_expose_type_key() {
        let row = ShootReference {
            id: Uuid::nil(),
            shoot_id: Uuid::nil(),
            reference_type: "instagram".into(),
            url: "https://instagram.com/p/abc".into(),
            notes: None,
            created_at: chrono::Utc::now(),
        };
        let value = client_row(&row).unwrap();
        assert_eq!(value["type"], json!("instagram"));
        assert_eq!(value["shootId"], json!(Uuid::nil()));
    }

    #[test]
    fn link_input_accepts_generic_or_specific_id() {
        let id = Uuid::new_v4();
        let input: LinkInput = decode_payload(json!({ "propId": id })).unwrap();
        assert_eq!(input.prop_id, Some(id));
        let input: LinkInput = decode_payload(json!({ "id": id })).unwrap();
        assert_eq!(input.id, Some(id));
    }

    #[test]
    fn linked_kinds_map_to_resource_kinds() {
        assert_eq!(LinkedKind::Costumes.resource_kind(), ResourceKind::Costumes);
        assert_eq!(LinkedKind::Props.resource_kind().path(), "props");
    }
}
