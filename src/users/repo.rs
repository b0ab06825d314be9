use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, ProfileUpdate, User};
use crate::auth::oauth::ExternalIdentity;
use crate::db::{classify, RepoError};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    /// Whether `phone` belongs to any user other than `except`.
    async fn phone_taken(&self, phone: &str, except: Option<i64>) -> Result<bool, RepoError>;
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    /// Atomic get-or-create keyed on the external identity id. The flag is
    /// true when the row was inserted by this call.
    async fn get_or_create_external(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, bool), RepoError>;
    async fn set_external_profile_img(&self, id: i64, url: &str) -> Result<(), RepoError>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError>;
}

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, external_id,
                   external_profile_img, phone_number, birth_day, point, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, external_id,
                   external_profile_img, phone_number, birth_day, point, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn phone_taken(&self, phone: &str, except: Option<i64>) -> Result<bool, RepoError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE phone_number = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(phone)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, password_hash, external_id,
                      external_profile_img, phone_number, birth_day, point, created_at, updated_at
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn get_or_create_external(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, bool), RepoError> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (external_id, external_profile_img, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING id, first_name, last_name, email, password_hash, external_id,
                      external_profile_img, phone_number, birth_day, point, created_at, updated_at
            "#,
        )
        .bind(identity.external_id)
        .bind(&identity.profile_image_url)
        .bind(&identity.email)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;

        if let Some(user) = inserted {
            return Ok((user, true));
        }

        let existing = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, external_id,
                   external_profile_img, phone_number, birth_day, point, created_at, updated_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(identity.external_id)
        .fetch_one(&self.db)
        .await?;
        Ok((existing, false))
    }

    async fn set_external_profile_img(&self, id: i64, url: &str) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE users
               SET external_profile_img = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(url)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET first_name = $2, last_name = $3, phone_number = $4, birth_day = $5,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, external_id,
                      external_profile_img, phone_number, birth_day, point, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone_number)
        .bind(update.birth_day)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }
}
