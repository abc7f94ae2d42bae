pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, gateway::teams, state::AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        let user = AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// The authenticated caller together with their active team. Every
/// team-owned row is read and written through this scope.
#[derive(Debug, Clone)]
pub struct TeamScope {
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub role: String,
}

#[async_trait]
impl FromRequestParts<AppState> for TeamScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        let mut conn = state.db()?;
        let membership = teams::active_membership(&mut conn, user.user_id)?
            .ok_or_else(|| AppError::forbidden("join or create a team first"))?;

        Ok(TeamScope {
            user_id: user.user_id,
            team_id: membership.team_id,
            role: membership.role,
        })
    }
}
