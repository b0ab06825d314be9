//! In-memory stand-ins for the database, object storage and identity
//! provider, used by unit and router tests.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::{
    auth::oauth::{ExternalIdentity, IdentityError, IdentityProvider},
    db::{RepoError, UniqueField},
    hosts::{
        repo::{HostRepository, RoomRepository},
        repo_types::{Host, NewRoom, Room, RoomDetails},
    },
    state::AppState,
    storage::StorageClient,
    users::{
        repo::UserRepository,
        repo_types::{initial_point, NewUser, ProfileUpdate, User},
    },
};

fn missing_row() -> RepoError {
    RepoError::Database(sqlx::Error::RowNotFound)
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    hosts: Vec<Host>,
    categories: Vec<(i64, String)>,
    room_types: Vec<(i64, String)>,
    facilities: Vec<(i64, String)>,
    rooms: Vec<Room>,
    room_facilities: Vec<(i64, i64)>,
    images: Vec<(i64, String)>,
}

impl Tables {
    fn email_taken(&self, email: Option<&str>, except: Option<i64>) -> bool {
        email.is_some()
            && self
                .users
                .iter()
                .any(|u| u.email.as_deref() == email && Some(u.id) != except)
    }

    fn phone_taken(&self, phone: &str, except: Option<i64>) -> bool {
        self.users
            .iter()
            .any(|u| u.phone_number.as_deref() == Some(phone) && Some(u.id) != except)
    }

    fn insert_user(&mut self, f: impl FnOnce(&mut User)) -> User {
        let now = OffsetDateTime::now_utc();
        let mut user = User {
            id: self.users.len() as i64 + 1,
            first_name: None,
            last_name: None,
            email: None,
            password_hash: None,
            external_id: None,
            external_profile_img: None,
            phone_number: None,
            birth_day: None,
            point: initial_point(),
            created_at: now,
            updated_at: now,
        };
        f(&mut user);
        self.users.push(user.clone());
        user
    }

    fn catalog_name(list: &[(i64, String)], id: i64) -> Option<String> {
        list.iter().find(|(i, _)| *i == id).map(|(_, n)| n.clone())
    }

    fn room_details(&self, room_id: i64) -> Result<Option<RoomDetails>, RepoError> {
        let Some(room) = self.rooms.iter().find(|r| r.id == room_id).cloned() else {
            return Ok(None);
        };
        let host_user = self
            .hosts
            .iter()
            .find(|h| h.id == room.host_id)
            .and_then(|h| self.users.iter().find(|u| u.id == h.user_id))
            .ok_or_else(missing_row)?;
        let category =
            Tables::catalog_name(&self.categories, room.category_id).ok_or_else(missing_row)?;
        let room_type =
            Tables::catalog_name(&self.room_types, room.room_type_id).ok_or_else(missing_row)?;
        let facilities = self
            .room_facilities
            .iter()
            .filter(|(r, _)| *r == room_id)
            .filter_map(|(_, f)| Tables::catalog_name(&self.facilities, *f))
            .collect();
        let images = self
            .images
            .iter()
            .filter(|(r, _)| *r == room_id)
            .map(|(_, url)| url.clone())
            .collect();

        Ok(Some(RoomDetails {
            host_first_name: host_user.first_name.clone(),
            host_last_name: host_user.last_name.clone(),
            room,
            category,
            room_type,
            facilities,
            images,
        }))
    }
}

/// All tables behind one mutex. Every repository call takes the lock once and
/// never awaits while holding it, so each call is atomic.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    fail_summary: AtomicBool,
}

impl MemoryDb {
    /// Catalog rows most tests rely on.
    pub fn seeded() -> Self {
        let db = Self::default();
        {
            let mut t = db.lock();
            t.categories.push((1, "아파트".into()));
            t.room_types.push((1, "집 전체".into()));
            t.facilities.extend([
                (1, "무선 인터넷".into()),
                (2, "주방".into()),
                (3, "주차".into()),
            ]);
        }
        db
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory db poisoned")
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn room_facility_count(&self) -> usize {
        self.lock().room_facilities.len()
    }

    pub fn image_count(&self) -> usize {
        self.lock().images.len()
    }

    /// Makes the summary read inside `create_room` fail, after the inserts.
    pub fn fail_summary_reads(&self) {
        self.fail_summary.store(true, Ordering::SeqCst);
    }

    pub fn rooms_named(&self, name: &str) -> usize {
        self.lock().rooms.iter().filter(|r| r.name == name).count()
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn phone_taken(&self, phone: &str, except: Option<i64>) -> Result<bool, RepoError> {
        Ok(self.lock().phone_taken(phone, except))
    }

    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut t = self.lock();
        if t.email_taken(Some(new.email.as_str()), None) {
            return Err(RepoError::Duplicate(UniqueField::Email));
        }
        if t.phone_taken(&new.phone_number, None) {
            return Err(RepoError::Duplicate(UniqueField::PhoneNumber));
        }
        Ok(t.insert_user(|u| {
            u.first_name = Some(new.first_name);
            u.last_name = Some(new.last_name);
            u.email = Some(new.email);
            u.password_hash = Some(new.password_hash);
            u.phone_number = Some(new.phone_number);
        }))
    }

    async fn get_or_create_external(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, bool), RepoError> {
        let mut t = self.lock();
        if let Some(user) = t
            .users
            .iter()
            .find(|u| u.external_id == Some(identity.external_id))
        {
            return Ok((user.clone(), false));
        }
        if t.email_taken(identity.email.as_deref(), None) {
            return Err(RepoError::Duplicate(UniqueField::Email));
        }
        let user = t.insert_user(|u| {
            u.external_id = Some(identity.external_id);
            u.external_profile_img = identity.profile_image_url.clone();
            u.email = identity.email.clone();
        });
        Ok((user, true))
    }

    async fn set_external_profile_img(&self, id: i64, url: &str) -> Result<(), RepoError> {
        let mut t = self.lock();
        let user = t.users.iter_mut().find(|u| u.id == id).ok_or_else(missing_row)?;
        user.external_profile_img = Some(url.to_string());
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, RepoError> {
        let mut t = self.lock();
        if t.phone_taken(&update.phone_number, Some(id)) {
            return Err(RepoError::Duplicate(UniqueField::PhoneNumber));
        }
        let user = t.users.iter_mut().find(|u| u.id == id).ok_or_else(missing_row)?;
        user.first_name = Some(update.first_name);
        user.last_name = Some(update.last_name);
        user.phone_number = Some(update.phone_number);
        user.birth_day = Some(update.birth_day);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }
}

#[async_trait]
impl HostRepository for MemoryDb {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Host>, RepoError> {
        Ok(self.lock().hosts.iter().find(|h| h.user_id == user_id).cloned())
    }

    async fn get_or_create(&self, user_id: i64) -> Result<(Host, bool), RepoError> {
        let mut t = self.lock();
        if let Some(host) = t.hosts.iter().find(|h| h.user_id == user_id) {
            return Ok((host.clone(), false));
        }
        let host = Host {
            id: t.hosts.len() as i64 + 1,
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.hosts.push(host.clone());
        Ok((host, true))
    }
}

#[async_trait]
impl RoomRepository for MemoryDb {
    async fn category_exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.lock().categories.iter().any(|(i, _)| *i == id))
    }

    async fn room_type_exists(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.lock().room_types.iter().any(|(i, _)| *i == id))
    }

    async fn count_facilities(&self, ids: &[i64]) -> Result<i64, RepoError> {
        let t = self.lock();
        Ok(t.facilities.iter().filter(|(i, _)| ids.contains(i)).count() as i64)
    }

    async fn room_name_exists(&self, name: &str) -> Result<bool, RepoError> {
        Ok(self.lock().rooms.iter().any(|r| r.name == name))
    }

    async fn create_room(
        &self,
        host_id: i64,
        room: &NewRoom,
        facility_ids: &[i64],
        image_urls: &[String],
    ) -> Result<RoomDetails, RepoError> {
        let mut t = self.lock();
        if t.rooms.iter().any(|r| r.name == room.name) {
            return Err(RepoError::Duplicate(UniqueField::RoomName));
        }
        // Foreign keys, checked before anything is written.
        if !facility_ids
            .iter()
            .all(|id| t.facilities.iter().any(|(i, _)| i == id))
        {
            return Err(missing_row());
        }

        let marks = (t.rooms.len(), t.room_facilities.len(), t.images.len());
        let id = t.rooms.len() as i64 + 1;
        t.rooms.push(Room {
            id,
            name: room.name.clone(),
            address: room.address.clone(),
            detail_address: room.detail_address.clone(),
            price: room.price,
            description: room.description.clone(),
            latitude: room.latitude,
            longitude: room.longitude,
            maximum_occupancy: room.maximum_occupancy,
            bedroom: room.bedroom,
            bathroom: room.bathroom,
            bed: room.bed,
            host_id,
            category_id: room.category_id,
            room_type_id: room.room_type_id,
            created_at: OffsetDateTime::now_utc(),
        });
        t.room_facilities.extend(facility_ids.iter().map(|f| (id, *f)));
        t.images.extend(image_urls.iter().map(|url| (id, url.clone())));

        let details = if self.fail_summary.load(Ordering::SeqCst) {
            Err(RepoError::Database(sqlx::Error::PoolTimedOut))
        } else {
            t.room_details(id).and_then(|d| d.ok_or_else(missing_row))
        };
        if details.is_err() {
            // Roll back everything this call wrote.
            t.rooms.truncate(marks.0);
            t.room_facilities.truncate(marks.1);
            t.images.truncate(marks.2);
        }
        details
    }
}

/// Object store kept in a map. Puts are counted from 1 across the store's
/// lifetime so a test can fail a specific one.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<BTreeMap<String, Bytes>>,
    deleted: Mutex<Vec<String>>,
    puts: AtomicUsize,
    fail_on: Option<usize>,
    delay: Option<Duration>,
    yield_on_put: bool,
}

impl FakeStorage {
    pub fn failing_on(nth_put: usize) -> Self {
        Self {
            fail_on: Some(nth_put),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every put yields to the scheduler once, so concurrent callers interleave.
    pub fn yielding() -> Self {
        Self {
            yield_on_put: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("fake storage poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("fake storage poisoned").clone()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.yield_on_put {
            tokio::task::yield_now().await;
        }
        if self.fail_on == Some(n) {
            anyhow::bail!("injected failure on put #{n}");
        }
        self.objects
            .lock()
            .expect("fake storage poisoned")
            .insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().expect("fake storage poisoned").remove(key);
        self.deleted
            .lock()
            .expect("fake storage poisoned")
            .push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://images.fake.local/{key}")
    }
}

/// Identity provider answering every token with the same identity, or
/// rejecting all of them.
#[derive(Clone, Default)]
pub struct FakeIdentity {
    identity: Arc<Mutex<Option<ExternalIdentity>>>,
}

impl FakeIdentity {
    pub fn with(identity: ExternalIdentity) -> Self {
        Self {
            identity: Arc::new(Mutex::new(Some(identity))),
        }
    }

    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn set_profile_image(&self, url: &str) {
        if let Some(identity) = self.identity.lock().expect("fake identity poisoned").as_mut() {
            identity.profile_image_url = Some(url.to_string());
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn fetch_identity(&self, _access_token: &str) -> Result<ExternalIdentity, IdentityError> {
        self.identity
            .lock()
            .expect("fake identity poisoned")
            .clone()
            .ok_or(IdentityError::Rejected)
    }
}

pub const SEED_PASSWORD: &str = "abcd1234!";

/// Creates a password account named 홍길동 with [`SEED_PASSWORD`].
pub async fn seed_user(st: &AppState, email: &str, phone: &str) -> User {
    seed_named_user(st, email, phone, "길동", "홍").await
}

pub async fn seed_named_user(
    st: &AppState,
    email: &str,
    phone: &str,
    first_name: &str,
    last_name: &str,
) -> User {
    st.users
        .create(NewUser {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password_hash: st.hasher.hash(SEED_PASSWORD).unwrap(),
            phone_number: phone.into(),
        })
        .await
        .unwrap()
}

/// A user value that is not stored anywhere.
pub fn user_fixture(id: i64, email: Option<&str>, password_hash: Option<&str>) -> User {
    let now = OffsetDateTime::now_utc();
    User {
        id,
        first_name: Some("길동".into()),
        last_name: Some("홍".into()),
        email: email.map(str::to_string),
        password_hash: password_hash.map(str::to_string),
        external_id: None,
        external_profile_img: None,
        phone_number: Some("010-1234-5678".into()),
        birth_day: None,
        point: initial_point(),
        created_at: now,
        updated_at: now,
    }
}
