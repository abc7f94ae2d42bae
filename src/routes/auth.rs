use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    gateway::teams,
    models::{NewRefreshToken, RefreshToken, User},
    schema::{refresh_tokens, users},
    state::AppState,
};

const REFRESH_COOKIE_NAME: &str = "refresh_token";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub team: Option<Value>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let mut conn = state.db()?;

    let user = users::table
        .filter(users::username.eq(payload.username.trim()))
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        tracing::info!(username = %user.username, "rejected login");
        return Err(AppError::unauthorized());
    }

    let headers = issue_refresh_token(&state, &mut conn, user.id, Utc::now())?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok((headers, Json(access_response(&state, &user)?)))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let cookies = jar.ok_or_else(AppError::unauthorized)?;
    let refresh_value = cookies
        .get(REFRESH_COOKIE_NAME)
        .ok_or_else(AppError::unauthorized)?;

    let hashed = hash_refresh_token(refresh_value);
    let mut conn = state.db()?;
    let now = Utc::now();

    let token = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&hashed))
        .filter(refresh_tokens::revoked_at.is_null())
        .filter(refresh_tokens::expires_at.gt(now))
        .first::<RefreshToken>(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    diesel::update(refresh_tokens::table.filter(refresh_tokens::id.eq(token.id)))
        .set((
            refresh_tokens::revoked_at.eq(now),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let user: User = users::table.find(token.user_id).first(&mut conn)?;
    let headers = issue_refresh_token(&state, &mut conn, user.id, now)?;
    Ok((headers, Json(access_response(&state, &user)?)))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, StatusCode)> {
    let mut conn = state.db()?;
    let now = Utc::now();
    let mut rows_affected = 0;

    if let Some(value) = jar.as_ref().and_then(|cookies| cookies.get(REFRESH_COOKIE_NAME)) {
        rows_affected = diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::token_hash.eq(hash_refresh_token(value)))
                .filter(refresh_tokens::user_id.eq(user.user_id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set((
            refresh_tokens::revoked_at.eq(now),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(&mut conn)?;
    }

    if rows_affected == 0 {
        diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user.user_id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set((
            refresh_tokens::revoked_at.eq(now),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(&mut conn)?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_refresh_cookie(&state)?);
    Ok((headers, StatusCode::NO_CONTENT))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<MeResponse>> {
    let mut conn = state.db()?;
    let team = teams::current_team(&mut conn, user.user_id)?;
    Ok(Json(MeResponse {
        user_id: user.user_id,
        username: user.username,
        role: user.role,
        team,
    }))
}

fn access_response(state: &AppState, user: &User) -> AppResult<LoginResponse> {
    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, &user.role)?;
    Ok(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expiry_seconds(),
    })
}

fn issue_refresh_token(
    state: &AppState,
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<HeaderMap> {
    let value = generate_refresh_token();
    let expires_at = now + ChronoDuration::days(state.config.refresh_token_expiry_days);

    diesel::insert_into(refresh_tokens::table)
        .values(&NewRefreshToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_refresh_token(&value),
            issued_at: now,
            expires_at,
        })
        .execute(conn)?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, refresh_cookie(state, &value, expires_at)?);
    Ok(headers)
}

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn cookie_attributes(state: &AppState, mut parts: Vec<String>) -> AppResult<HeaderValue> {
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    if state.config.refresh_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.refresh_cookie_domain {
        parts.push(format!("Domain={domain}"));
    }
    HeaderValue::from_str(&parts.join("; ")).map_err(AppError::internal)
}

fn refresh_cookie(
    state: &AppState,
    token: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<HeaderValue> {
    let max_age = ChronoDuration::days(state.config.refresh_token_expiry_days).num_seconds();
    cookie_attributes(
        state,
        vec![
            format!("{REFRESH_COOKIE_NAME}={token}"),
            format!("Max-Age={max_age}"),
            format!("Expires={}", expires_at.to_rfc2822()),
        ],
    )
}

fn clear_refresh_cookie(state: &AppState) -> AppResult<HeaderValue> {
    cookie_attributes(
        state,
        vec![
            format!("{REFRESH_COOKIE_NAME}="),
            "Max-Age=0".into(),
            "Expires=Thu, 01 Jan 1970 00:00:00 GMT".into(),
        ],
    )
}
