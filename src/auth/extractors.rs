use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use tracing::warn;

use super::{
    jwt::{JwtKeys, Session},
    repo_types::Role,
};
use crate::error::AppError;

/// Extracts and validates the bearer JWT, yielding the caller's session.
pub struct AuthUser(pub Session);

impl AuthUser {
    /// 403 unless the token was issued for `role`.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.0.role == role {
            Ok(())
        } else {
            warn!(user_id = %self.0.user_id, has = %self.0.role, needs = %role, "role check failed");
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthenticated)?;

        match keys.verify(token.trim()) {
            Ok(session) => Ok(AuthUser(session)),
            Err(e) => {
                warn!(reason = %e, "rejected bearer token");
                Err(AppError::Unauthenticated)
            }
        }
    }
}

/// `Json` whose rejections render as `AppError` bodies.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                warn!(status = %rejection.status(), reason = %rejection.body_text(), "rejected request body");
                Err(AppError::from(rejection))
            }
        }
    }
}
