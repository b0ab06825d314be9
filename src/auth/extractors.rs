use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::AppError, state::AppState, users::repo_types::User};

/// The authenticated user, placed in request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Token from the `Authorization` header. Both the raw token and the
/// `Bearer <token>` form are accepted.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim_start();
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the session token in `headers` to an existing user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = session_token(headers).ok_or(AppError::InvalidToken)?;

    let claims = state.jwt.verify(token).map_err(|e| {
        warn!(error = %e, "session token rejected");
        AppError::InvalidToken
    })?;

    state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        warn!(user_id = claims.sub, "session token for unknown user");
        AppError::InvalidUser
    })
}

/// Guard for protected routes. Runs before handler dispatch.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
