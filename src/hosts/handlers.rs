use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{Envelope, HostName, RoomForm, RoomInfo, UploadItem},
    services,
};
use crate::{
    auth::extractors::{require_session, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn host_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/hosts", post(register_host))
        .route(
            "/hosts/rooms",
            post(register_room).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn register_host(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<Envelope<HostName>>), AppError> {
    let (_host, created) = services::register_host(&state, &user).await?;
    let (status, message) = if created {
        (StatusCode::CREATED, "SUCCESS")
    } else {
        (StatusCode::OK, "ALREADY_REGISTERED")
    };
    Ok((
        status,
        Json(Envelope {
            message,
            data: HostName {
                host_name: user.display_name(),
            },
        }),
    ))
}

/// POST /hosts/rooms (multipart)
/// Text fields per room attribute, repeated `facility_ids`, repeated `files`.
#[instrument(skip(state, user, mp), fields(user_id = user.id))]
pub async fn register_room(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<Envelope<RoomInfo>>), AppError> {
    let mut form = RoomForm::default();
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::InvalidBody);
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if RoomForm::is_file_field(&name) {
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field.bytes().await.map_err(|_| AppError::InvalidBody)?;
            form.push_file(UploadItem { body, content_type });
        } else {
            let value = field.text().await.map_err(|_| AppError::InvalidBody)?;
            form.push_text(&name, value);
        }
    }

    let summary = services::register_room(&state, &user, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            message: "SUCCESS",
            data: RoomInfo {
                room_info: summary,
            },
        }),
    ))
}
