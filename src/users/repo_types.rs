use rust_decimal::Decimal;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>, // absent for OAuth-only accounts
    pub external_id: Option<i64>,
    pub external_profile_img: Option<String>,
    pub phone_number: Option<String>,
    pub birth_day: Option<Date>,
    pub point: Decimal,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Family name followed by given name, as displayed to Korean users.
    pub fn display_name(&self) -> String {
        format!(
            "{}{}",
            self.last_name.as_deref().unwrap_or_default(),
            self.first_name.as_deref().unwrap_or_default()
        )
    }
}

/// Fields of a password signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
}

/// Fields written by profile completion.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub birth_day: Date,
}

/// Starting point balance of every new account; mirrors the column default.
#[cfg(test)]
pub fn initial_point() -> Decimal {
    Decimal::new(10_000_000, 2)
}
