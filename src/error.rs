use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::{oauth::IdentityError, password::PasswordError, validators::ValidationError};
use crate::db::{RepoError, UniqueField};

/// Uniqueness conflicts surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Email,
    PhoneNumber,
    RoomName,
}

/// Catalog entities a registration may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Category,
    RoomType,
    Facility,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid session token")]
    InvalidToken,

    #[error("session token does not resolve to a user")]
    InvalidUser,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("missing required field `{0}`")]
    KeyError(&'static str),

    #[error("malformed value for field `{0}`")]
    InvalidField(&'static str),

    #[error("malformed request body")]
    InvalidBody,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("conflict: {0:?}")]
    Conflict(Conflict),

    #[error("{0:?} not found")]
    NotFound(Missing),

    #[error("caller is not a host")]
    HostNotFound,

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidToken
            | AppError::InvalidUser
            | AppError::KeyError(_)
            | AppError::InvalidField(_)
            | AppError::InvalidBody
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::HostNotFound => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::InvalidUser | AppError::InvalidCredentials => "INVALID_USER",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::KeyError(_) => "KEY_ERROR",
            AppError::InvalidField(_) => "INVALID_FIELD",
            AppError::InvalidBody => "INVALID_BODY",
            AppError::Validation(v) => v.code(),
            AppError::Conflict(Conflict::Email) => "EMAIL_ALREADY_EXIST",
            AppError::Conflict(Conflict::PhoneNumber) => "PHONE_ALREADY_EXIST",
            AppError::Conflict(Conflict::RoomName) => "ROOM_NAME_ALREADY_EXIST",
            AppError::NotFound(Missing::Category) => "CATEGORY_DOES_NOT_EXIST",
            AppError::NotFound(Missing::RoomType) => "ROOM_TYPE_DOES_NOT_EXIST",
            AppError::NotFound(Missing::Facility) => "FACILITY_DOES_NOT_EXIST",
            AppError::HostNotFound => "ONLY_HOST_CAN_REGISTER_HOUSE",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let field = match &self {
            AppError::KeyError(f) | AppError::InvalidField(f) => Some(*f),
            _ => None,
        };
        let body = ErrorBody {
            message: self.code(),
            field,
        };
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(UniqueField::Email) => AppError::Conflict(Conflict::Email),
            RepoError::Duplicate(UniqueField::PhoneNumber) => {
                AppError::Conflict(Conflict::PhoneNumber)
            }
            RepoError::Duplicate(UniqueField::RoomName) => AppError::Conflict(Conflict::RoomName),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected => AppError::InvalidToken,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}
