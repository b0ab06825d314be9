use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{
    jwt::JwtKeys,
    oauth::{IdentityProvider, KakaoClient},
    password::PasswordHasher,
};
use crate::config::AppConfig;
use crate::hosts::repo::{HostRepository, PgHostRepository, PgRoomRepository, RoomRepository};
use crate::storage::{Storage, StorageClient};
use crate::users::repo::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub hosts: Arc<dyn HostRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub storage: Arc<dyn StorageClient>,
    pub identity: Arc<dyn IdentityProvider>,
    pub jwt: JwtKeys,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub async fn init(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;
        let identity = Arc::new(KakaoClient::new(&config.oauth)?) as Arc<dyn IdentityProvider>;

        Ok(Self {
            jwt: JwtKeys::new(&config.jwt),
            hasher: PasswordHasher::new(&config.password)?,
            users: Arc::new(PgUserRepository::new(db.clone())),
            hosts: Arc::new(PgHostRepository::new(db.clone())),
            rooms: Arc::new(PgRoomRepository::new(db)),
            storage,
            identity,
            config,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// State backed entirely by in-memory fakes.
    pub fn fake() -> Self {
        Self::fake_with(
            Arc::new(crate::testing::MemoryDb::seeded()),
            Arc::new(crate::testing::FakeStorage::default()),
        )
    }

    pub fn fake_with_storage(storage: Arc<crate::testing::FakeStorage>) -> Self {
        Self::fake_with(Arc::new(crate::testing::MemoryDb::seeded()), storage)
    }

    pub fn fake_with_identity(
        db: Arc<crate::testing::MemoryDb>,
        identity: crate::testing::FakeIdentity,
    ) -> Self {
        let mut state = Self::fake_with(db, Arc::new(crate::testing::FakeStorage::default()));
        state.identity = Arc::new(identity);
        state
    }

    pub fn fake_with(
        db: Arc<crate::testing::MemoryDb>,
        storage: Arc<crate::testing::FakeStorage>,
    ) -> Self {
        let config = Arc::new(AppConfig::for_tests());
        Self {
            jwt: JwtKeys::new(&config.jwt),
            hasher: PasswordHasher::new(&config.password).expect("test argon2 params"),
            users: db.clone(),
            hosts: db.clone(),
            rooms: db,
            storage,
            identity: Arc::new(crate::testing::FakeIdentity::rejecting()),
            config,
        }
    }
}
