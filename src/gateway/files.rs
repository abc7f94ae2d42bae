use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::{client_row, client_rows, GatewayResult};
use crate::models::{FileRecord, NewFileRecord};
use crate::schema::files;

/// Metadata for an object that has already been written to storage.
pub struct StoredObject {
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: usize,
}

pub fn record(
    conn: &mut PgConnection,
    team_id: Uuid,
    uploaded_by: Option<Uuid>,
    object: StoredObject,
) -> GatewayResult<Value> {
    let row: FileRecord = diesel::insert_into(files::table)
        .values(&NewFileRecord {
            id: Uuid::new_v4(),
            team_id,
            filename: object.filename,
            storage_path: object.storage_path,
            url: object.url,
            content_type: object.content_type,
            size: i64::try_from(object.size).unwrap_or(i64::MAX),
            uploaded_by,
        })
        .get_result(conn)?;
    tracing::debug!(%team_id, file_id = %row.id, size = row.size, "file recorded");
    client_row(&row)
}

pub fn list(conn: &mut PgConnection, team_id: Uuid) -> GatewayResult<Vec<Value>> {
    let rows: Vec<FileRecord> = files::table
        .filter(files::team_id.eq(team_id))
        .order(files::created_at.desc())
        .load(conn)?;
    client_rows(&rows)
}

/// Removes the row and hands it back so the caller can drop the stored object.
pub fn delete(
    conn: &mut PgConnection,
    team_id: Uuid,
    id: Uuid,
) -> GatewayResult<Option<FileRecord>> {
    Ok(diesel::delete(
        files::table
            .filter(files::id.eq(id))
            .filter(files::team_id.eq(team_id)),
    )
    .get_result::<FileRecord>(conn)
    .optional()?)
}

/// Drops the row for an object that is being discarded. Returns whether a row
/// existed.
pub fn delete_by_path(
    conn: &mut PgConnection,
    team_id: Uuid,
    storage_path: &str,
) -> GatewayResult<bool> {
    let removed = diesel::delete(
        files::table
            .filter(files::team_id.eq(team_id))
            .filter(files::storage_path.eq(storage_path)),
    )
    .execute(conn)?;
    Ok(removed > 0)
}
