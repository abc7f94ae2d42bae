use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = teams)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = team_members)]
#[diesel(belongs_to(Team))]
#[diesel(belongs_to(User))]
#[diesel(primary_key(team_id, user_id))]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = shoots)]
pub struct Shoot {
    pub id: Uuid,
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub location_id: Option<Uuid>,
    pub location_notes: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub instagram_links: Vec<String>,
    pub calendar_event_url: Option<String>,
    pub docs_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoots)]
pub struct NewShoot {
    pub id: Uuid,
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub location_id: Option<Uuid>,
    pub location_notes: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub instagram_links: Vec<String>,
    pub calendar_event_url: Option<String>,
    pub docs_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = personnel)]
pub struct Personnel {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = personnel)]
pub struct NewPersonnel {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = equipment)]
pub struct Equipment {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = equipment)]
pub struct NewEquipment {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = props)]
pub struct Prop {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = props)]
pub struct NewProp {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = costume_progress)]
pub struct CostumeProgress {
    pub id: Uuid,
    pub team_id: Uuid,
    pub character_name: String,
    pub series_name: Option<String>,
    pub status: String,
    pub completion_percentage: i32,
    pub notes: Option<String>,
    pub todos: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = costume_progress)]
pub struct NewCostumeProgress {
    pub id: Uuid,
    pub team_id: Uuid,
    pub character_name: String,
    pub series_name: Option<String>,
    pub status: String,
    pub completion_percentage: i32,
    pub notes: Option<String>,
    pub todos: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = locations)]
pub struct Location {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub place_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = locations)]
pub struct NewLocation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub place_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = shoot_participants)]
#[diesel(belongs_to(Shoot))]
#[diesel(belongs_to(Personnel))]
pub struct ShootParticipant {
    pub id: Uuid,
    pub shoot_id: Uuid,
    pub personnel_id: Uuid,
    pub role: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoot_participants)]
pub struct NewShootParticipant {
    pub id: Uuid,
    pub shoot_id: Uuid,
    pub personnel_id: Uuid,
    pub role: Option<String>,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoot_equipment)]
pub struct NewShootEquipment {
    pub shoot_id: Uuid,
    pub equipment_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoot_props)]
pub struct NewShootProp {
    pub shoot_id: Uuid,
    pub prop_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoot_costumes)]
pub struct NewShootCostume {
    pub shoot_id: Uuid,
    pub costume_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = shoot_references)]
#[diesel(belongs_to(Shoot))]
pub struct ShootReference {
    pub id: Uuid,
    pub shoot_id: Uuid,
    #[serde(rename = "type")]
    pub reference_type: String,
    pub url: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shoot_references)]
pub struct NewShootReference {
    pub id: Uuid,
    pub shoot_id: Uuid,
    pub reference_type: String,
    pub url: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = files)]
pub struct FileRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = files)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub uploaded_by: Option<Uuid>,
}
