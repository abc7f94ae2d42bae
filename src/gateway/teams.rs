//! Team membership lookups. A user works inside exactly one active team at a
//! time; every resource query is scoped by that team's id.

use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{client_row, GatewayError, GatewayResult};
use crate::models::{NewTeam, NewTeamMember, Team, TeamMember};
use crate::schema::{team_members, teams};

pub const OWNER_ROLE: &str = "owner";

#[derive(Debug, Serialize)]
struct Membership<'a> {
    id: Uuid,
    name: &'a str,
    role: &'a str,
    is_active: bool,
    joined_at: chrono::DateTime<Utc>,
    created_at: chrono::DateTime<Utc>,
}

fn membership_row(team: &Team, member: &TeamMember) -> GatewayResult<Value> {
    client_row(&Membership {
        id: team.id,
        name: &team.name,
        role: &member.role,
        is_active: member.is_active,
        joined_at: member.joined_at,
        created_at: team.created_at,
    })
}

/// The caller's active membership, if any.
pub fn active_membership(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> GatewayResult<Option<TeamMember>> {
    Ok(team_members::table
        .filter(team_members::user_id.eq(user_id))
        .filter(team_members::is_active.eq(true))
        .first::<TeamMember>(conn)
        .optional()?)
}

pub fn current_team(conn: &mut PgConnection, user_id: Uuid) -> GatewayResult<Option<Value>> {
    let found = teams::table
        .inner_join(team_members::table)
        .filter(team_members::user_id.eq(user_id))
        .filter(team_members::is_active.eq(true))
        .select((teams::all_columns, team_members::all_columns))
        .first::<(Team, TeamMember)>(conn)
        .optional()?;
    found
        .map(|(team, member)| membership_row(&team, &member))
        .transpose()
}

pub fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> GatewayResult<Vec<Value>> {
    let rows: Vec<(Team, TeamMember)> = teams::table
        .inner_join(team_members::table)
        .filter(team_members::user_id.eq(user_id))
        .select((teams::all_columns, team_members::all_columns))
        .order(teams::name.asc())
        .load(conn)?;
    rows.iter()
        .map(|(team, member)| membership_row(team, member))
        .collect()
}

/// Creates a team owned by the user and makes it their active team.
pub fn create_team(conn: &mut PgConnection, user_id: Uuid, name: &str) -> GatewayResult<Value> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GatewayError::validation("team name is required"));
    }

    conn.transaction::<_, GatewayError, _>(|conn| {
        diesel::update(team_members::table.filter(team_members::user_id.eq(user_id)))
            .set(team_members::is_active.eq(false))
            .execute(conn)?;

        let team: Team = diesel::insert_into(teams::table)
            .values(&NewTeam {
                id: Uuid::new_v4(),
                name: name.to_string(),
            })
            .get_result(conn)?;
        let member: TeamMember = diesel::insert_into(team_members::table)
            .values(&NewTeamMember {
                team_id: team.id,
                user_id,
                role: OWNER_ROLE.to_string(),
                is_active: true,
            })
            .get_result(conn)?;

        tracing::info!(%user_id, team_id = %team.id, "team created");
        membership_row(&team, &member)
    })
}

/// Switches the user's active team. `None` when they are not a member.
pub fn switch_team(
    conn: &mut PgConnection,
    user_id: Uuid,
    team_id: Uuid,
) -> GatewayResult<Option<Value>> {
    conn.transaction::<_, GatewayError, _>(|conn| {
        let membership = team_members::table
            .filter(team_members::user_id.eq(user_id))
            .filter(team_members::team_id.eq(team_id))
            .first::<TeamMember>(conn)
            .optional()?;
        if membership.is_none() {
            return Ok(None);
        }

        diesel::update(team_members::table.filter(team_members::user_id.eq(user_id)))
            .set(team_members::is_active.eq(false))
            .execute(conn)?;
        diesel::update(
            team_members::table
                .filter(team_members::user_id.eq(user_id))
                .filter(team_members::team_id.eq(team_id)),
        )
        .set(team_members::is_active.eq(true))
        .execute(conn)?;

        current_team(conn, user_id)
    })
}
