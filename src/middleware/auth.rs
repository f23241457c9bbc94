use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{access::Actor, error::AppError, models::Role, state::AppState};

/// Authenticated principal extracted from the Authorization header.
/// Resolution (token validation, profile fetch, claims fallback) is done
/// by the engine; this extractor is only the HTTP glue.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        match state.engine.authenticate(token).await? {
            Some(actor) => Ok(AuthUser {
                user_id: actor.id,
                role: actor.role,
            }),
            None => Err(AppError::Unauthorized),
        }
    }
}
