//! Generic CRUD handlers shared by every team resource collection.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::files::{discard_upload, store_upload, UploadedFile};
use crate::{
    auth::TeamScope,
    error::{AppError, AppResult},
    gateway::ResourceGateway,
    state::AppState,
    utils::json::multipart_text_value,
};

const DATA_FIELD: &str = "data";
const IMAGE_FIELD: &str = "image";

/// A create/update body sent either as JSON or as multipart form data.
///
/// Multipart bodies may carry the whole payload as JSON in a `data` field,
/// one text field per key, or both (text fields win). An `image` file part
/// is returned separately.
pub struct ResourcePayload {
    pub body: Value,
    pub image: Option<UploadedFile>,
}

#[async_trait]
impl FromRequest<AppState> for ResourcePayload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|err| AppError::bad_request(err.body_text()))?;
            read_multipart(multipart).await
        } else {
            let Json(body) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|err| AppError::bad_request(err.body_text()))?;
            Ok(ResourcePayload { body, image: None })
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<ResourcePayload> {
    let mut data = Map::new();
    let mut fields = Map::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart data: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            let filename = field.file_name().unwrap_or("image").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|err| {
                AppError::bad_request(format!("failed to read image bytes: {err}"))
            })?;
            if !bytes.is_empty() {
                image = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|err| AppError::bad_request(format!("invalid field {name}: {err}")))?;
        if name == DATA_FIELD {
            match serde_json::from_str::<Value>(&text)? {
                Value::Object(object) => data.extend(object),
                _ => return Err(AppError::bad_request("data field must be a JSON object")),
            }
        } else {
            fields.insert(name, multipart_text_value(&text));
        }
    }

    data.extend(fields);
    Ok(ResourcePayload {
        body: Value::Object(data),
        image,
    })
}

/// Stores the image (if any) and writes its URL into the payload under the
/// kind's image key. Returns the object key so a failed write can discard it.
async fn attach_image<G: ResourceGateway>(
    state: &AppState,
    scope: &TeamScope,
    payload: ResourcePayload,
) -> AppResult<(Value, Option<String>)> {
    let ResourcePayload { mut body, image } = payload;
    let Some(image) = image else {
        return Ok((body, None));
    };

    let field = G::IMAGE_FIELD
        .ok_or_else(|| AppError::bad_request(format!("{} do not accept images", G::NAME)))?;
    if !image.is_image() {
        return Err(AppError::bad_request("image must be an image file"));
    }
    let object = body
        .as_object_mut()
        .ok_or_else(|| AppError::bad_request("payload must be a JSON object"))?;

    let stored = store_upload(state, scope, G::NAME, image).await?;
    object.insert(field.to_string(), Value::String(stored.url));
    Ok((body, Some(stored.key)))
}

pub async fn list<G: ResourceGateway>(
    State(state): State<AppState>,
    scope: TeamScope,
) -> AppResult<Json<Vec<Value>>> {
    let mut conn = state.db()?;
    Ok(Json(G::list(&mut conn, scope.team_id)?))
}

pub async fn get_one<G: ResourceGateway>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;
    G::get_by_id(&mut conn, scope.team_id, id)?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn create<G: ResourceGateway>(
    State(state): State<AppState>,
    scope: TeamScope,
    payload: ResourcePayload,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (body, stored_key) = attach_image::<G>(&state, &scope, payload).await?;

    let result = state
        .db()
        .and_then(|mut conn| G::create(&mut conn, scope.team_id, body).map_err(AppError::from));
    match result {
        Ok(created) => {
            tracing::info!(kind = G::NAME, team_id = %scope.team_id, "resource created");
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(err) => {
            if let Some(key) = stored_key {
                discard_upload(&state, &scope, &key).await;
            }
            Err(err)
        }
    }
}

pub async fn update<G: ResourceGateway>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(id): Path<Uuid>,
    payload: ResourcePayload,
) -> AppResult<Json<Value>> {
    let (body, stored_key) = attach_image::<G>(&state, &scope, payload).await?;

    let result = state.db().and_then(|mut conn| {
        G::update(&mut conn, scope.team_id, id, body)?.ok_or_else(AppError::not_found)
    });
    match result {
        Ok(updated) => Ok(Json(updated)),
        Err(err) => {
            if let Some(key) = stored_key {
                discard_upload(&state, &scope, &key).await;
            }
            Err(err)
        }
    }
}

pub async fn delete<G: ResourceGateway>(
    State(state): State<AppState>,
    scope: TeamScope,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    if !G::delete(&mut conn, scope.team_id, id)? {
        return Err(AppError::not_found());
    }
    tracing::info!(kind = G::NAME, team_id = %scope.team_id, %id, "resource deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn resource_routes<G: ResourceGateway>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<G>).post(create::<G>))
        .route(
            "/:id",
            get(get_one::<G>).patch(update::<G>).delete(delete::<G>),
        )
}
