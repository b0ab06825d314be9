use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo_types::User;
use crate::error::AppError;

fn required(value: Option<String>, key: &'static str) -> Result<String, AppError> {
    value.ok_or(AppError::KeyError(key))
}

/// Request body for signup. Every field is required; presence is checked in
/// declaration order by [`SignUpRequest::into_fields`].
#[derive(Debug, Default, Deserialize)]
pub struct SignUpRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug)]
pub struct SignUpFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

impl SignUpRequest {
    pub fn into_fields(self) -> Result<SignUpFields, AppError> {
        Ok(SignUpFields {
            first_name: required(self.first_name, "first_name")?,
            last_name: required(self.last_name, "last_name")?,
            email: required(self.email, "email")?,
            password: required(self.password, "password")?,
            phone_number: required(self.phone_number, "phone_number")?,
        })
    }
}

/// Request body for sign-in.
#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignInRequest {
    pub fn into_fields(self) -> Result<(String, String), AppError> {
        Ok((
            required(self.email, "email")?,
            required(self.password, "password")?,
        ))
    }
}

/// Request body for profile completion.
#[derive(Debug, Default, Deserialize)]
pub struct AdditionalInfoRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub birth_day: Option<String>,
}

#[derive(Debug)]
pub struct AdditionalInfoFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub birth_day: String,
}

impl AdditionalInfoRequest {
    pub fn into_fields(self) -> Result<AdditionalInfoFields, AppError> {
        Ok(AdditionalInfoFields {
            first_name: required(self.first_name, "first_name")?,
            last_name: required(self.last_name, "last_name")?,
            phone_number: required(self.phone_number, "phone_number")?,
            birth_day: required(self.birth_day, "birth_day")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Returned by sign-in.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub message: &'static str,
    pub token: String,
    pub name: String,
}

/// Returned by the OAuth exchange.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: &'static str,
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub birth_day: Option<String>,
    pub point: Decimal,
    pub profile_image: Option<String>,
    pub is_host: bool,
}

impl ProfileResponse {
    pub fn new(user: User, is_host: bool) -> Self {
        Self {
            id: user.id,
            name: user.display_name(),
            birth_day: user.birth_day.map(|d| d.to_string()),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            point: user.point,
            profile_image: user.external_profile_img,
            is_host,
        }
    }
}
