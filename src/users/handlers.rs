use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{
        AdditionalInfoRequest, MessageResponse, ProfileResponse, SignInRequest, SignInResponse,
        SignUpRequest, TokenResponse,
    },
    services,
};
use crate::{
    auth::extractors::{require_session, session_token, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(sign_up))
        .route("/users/signin", post(sign_in))
        .route("/users/kakao/oauth", get(kakao_oauth))
}

pub fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/additional-info", patch(additional_info))
        .route("/users/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "rejected json body");
        AppError::InvalidBody
    })
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let fields = body(payload)?.into_fields()?;
    services::sign_up(&state, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "USER_CREATED",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>, AppError> {
    let (email, password) = body(payload)?.into_fields()?;
    let (token, name) = services::sign_in(&state, &email, &password).await?;
    Ok(Json(SignInResponse {
        message: "SUCCESS",
        token,
        name,
    }))
}

/// GET /users/kakao/oauth
/// The provider access token travels in `Authorization`.
#[instrument(skip(state, headers))]
pub async fn kakao_oauth(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let provider_token = session_token(&headers).ok_or(AppError::InvalidToken)?;
    let (token, created) = services::exchange_oauth(&state, provider_token).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(TokenResponse {
            message: "SUCCESS",
            token,
        }),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = user.id))]
pub async fn additional_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AdditionalInfoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let fields = body(payload)?.into_fields()?;
    services::complete_profile(&state, &user, fields).await?;
    Ok(Json(MessageResponse {
        message: "USER_INFO_UPDATED",
    }))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let is_host = services::is_host(&state, &user).await?;
    Ok(Json(ProfileResponse::new(user, is_host)))
}
