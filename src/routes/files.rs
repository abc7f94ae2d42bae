use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::TeamScope,
    error::{AppError, AppResult},
    gateway::files::{self, StoredObject},
    state::AppState,
    storage::object_key,
};

const DEFAULT_FOLDER: &str = "files";

/// A file part lifted out of a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// The declared content type, or one guessed from the file extension.
    pub fn effective_content_type(&self) -> Option<String> {
        self.content_type
            .clone()
            .filter(|value| !value.is_empty() && value != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&self.filename)
                    .first()
                    .map(|mime| mime.essence_str().to_string())
            })
    }

    pub fn is_image(&self) -> bool {
        self.effective_content_type()
            .map(|value| value.starts_with("image/"))
            .unwrap_or(false)
    }
}

pub struct StoredUpload {
    pub key: String,
    pub url: String,
    pub record: Value,
}

/// Writes the file under `{team}/{folder}/` and records it in `files`.
pub(crate) async fn store_upload(
    state: &AppState,
    scope: &TeamScope,
    folder: &str,
    file: UploadedFile,
) -> AppResult<StoredUpload> {
    if file.bytes.is_empty() {
        return Err(AppError::bad_request("uploaded file is empty"));
    }
    if file.bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::payload_too_large(state.config.max_upload_bytes));
    }

    let content_type = file.effective_content_type();
    let key = object_key(scope.team_id, folder, &file.filename);
    let size = file.bytes.len();
    state
        .storage
        .put_object(&key, file.bytes, content_type.clone())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, %key, "failed to store upload");
            AppError::internal("failed to store uploaded file")
        })?;
    let url = state.storage.public_url(&key);

    let object = StoredObject {
        filename: file.filename,
        storage_path: key.clone(),
        url: url.clone(),
        content_type,
        size,
    };
    let recorded = state.db().and_then(|mut conn| {
        files::record(&mut conn, scope.team_id, Some(scope.user_id), object)
            .map_err(AppError::from)
    });
    let record = match recorded {
        Ok(record) => record,
        Err(err) => {
            discard_object(state, &key).await;
            return Err(err);
        }
    };
    tracing::info!(team_id = %scope.team_id, %key, size, "upload stored");

    Ok(StoredUpload { key, url, record })
}

/// Removes an upload whose owning write failed: its `files` row first, then
/// the stored object. Failures are only logged.
pub(crate) async fn discard_upload(state: &AppState, scope: &TeamScope, key: &str) {
    let removed = state.db().and_then(|mut conn| {
        files::delete_by_path(&mut conn, scope.team_id, key).map_err(AppError::from)
    });
    if let Err(err) = removed {
        tracing::warn!(error = err.message(), %key, "failed to remove orphaned file record");
    }
    discard_object(state, key).await;
}

async fn discard_object(state: &AppState, key: &str) {
    if let Err(err) = state.storage.delete_object(key).await {
        tracing::warn!(error = ?err, %key, "failed to remove orphaned upload");
    }
}

pub async fn upload_file(
    State(state): State<AppState>,
    scope: TeamScope,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut upload: Option<UploadedFile> = None;
    let mut folder = DEFAULT_FOLDER.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        match field.name() {
            Some("file") | Some("image") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::bad_request("filename is required"))?;
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|err| {
                    AppError::bad_request(format!("failed to read file bytes: {err}"))
                })?;
                upload = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("folder") => {
                let value = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("invalid folder: {err}"))
                })?;
                let cleaned: String = value
                    .trim()
                    .chars()
                    .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
                    .collect();
                if !cleaned.is_empty() {
                    folder = cleaned;
                }
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::bad_request("file field is required"))?;
    let stored = store_upload(&state, &scope, &folder, upload).await?;
    Ok((StatusCode::CREATED, Json(stored.record)))
}

pub async fn list_files(
    State(state): State<AppState>,
    scope: TeamScope,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    Ok(Json(files::list(&mut conn, scope.team_id)?))
}

pub async fn delete_file(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let record = files::delete(&mut conn, scope.team_id, id)?.ok_or_else(AppError::not_found)?;
    drop(conn);
    discard_object(&state, &record.storage_path).await;
    Ok(StatusCode::NO_CONTENT)
}
