use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Columns with a uniqueness constraint that callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PhoneNumber,
    ExternalId,
    HostUser,
    RoomName,
}

impl UniqueField {
    fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(Self::Email),
            "users_phone_number_key" => Some(Self::PhoneNumber),
            "users_external_id_key" => Some(Self::ExternalId),
            "hosts_user_id_key" => Some(Self::HostUser),
            "rooms_name_key" => Some(Self::RoomName),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("duplicate value for {0:?}")]
    Duplicate(UniqueField),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Turns known unique-constraint violations into [`RepoError::Duplicate`].
pub fn classify(err: sqlx::Error) -> RepoError {
    let field = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint())
        .and_then(UniqueField::from_constraint);
    match field {
        Some(field) => RepoError::Duplicate(field),
        None => RepoError::Database(err),
    }
}
