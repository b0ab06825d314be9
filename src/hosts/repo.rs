use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::repo_types::{Host, NewRoom, RoomDetails, RoomDetailsRow};
use crate::db::{classify, RepoError, UniqueField};

#[async_trait]
pub trait HostRepository: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Host>, RepoError>;
    /// Idempotent; the flag is true when this call created the record.
    async fn get_or_create(&self, user_id: i64) -> Result<(Host, bool), RepoError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn category_exists(&self, id: i64) -> Result<bool, RepoError>;
    async fn room_type_exists(&self, id: i64) -> Result<bool, RepoError>;
    /// Number of catalog facilities whose id is in `ids`.
    async fn count_facilities(&self, ids: &[i64]) -> Result<i64, RepoError>;
    async fn room_name_exists(&self, name: &str) -> Result<bool, RepoError>;
    /// Inserts the room, its facility links and its image rows as one unit
    /// and returns the joined view of what was written. The view is read
    /// before commit, so any failure leaves nothing behind.
    ///
    /// A room with the same name already present yields
    /// `RepoError::Duplicate(UniqueField::RoomName)` and writes nothing.
    async fn create_room(
        &self,
        host_id: i64,
        room: &NewRoom,
        facility_ids: &[i64],
        image_urls: &[String],
    ) -> Result<RoomDetails, RepoError>;
}

pub struct PgHostRepository {
    db: PgPool,
}

impl PgHostRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HostRepository for PgHostRepository {
    async fn find_by_user(&self, user_id: i64) -> Result<Option<Host>, RepoError> {
        let host = sqlx::query_as::<_, Host>(
            r#"SELECT id, user_id, created_at FROM hosts WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(host)
    }

    async fn get_or_create(&self, user_id: i64) -> Result<(Host, bool), RepoError> {
        let inserted = sqlx::query_as::<_, Host>(
            r#"
            INSERT INTO hosts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;

        match inserted {
            Some(host) => Ok((host, true)),
            None => {
                let host = self
                    .find_by_user(user_id)
                    .await?
                    .ok_or(RepoError::Database(sqlx::Error::RowNotFound))?;
                Ok((host, false))
            }
        }
    }
}

pub struct PgRoomRepository {
    db: PgPool,
}

impl PgRoomRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn category_exists(&self, id: i64) -> Result<bool, RepoError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn room_type_exists(&self, id: i64) -> Result<bool, RepoError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM room_types WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn count_facilities(&self, ids: &[i64]) -> Result<i64, RepoError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM facilities WHERE id = ANY($1)")
                .bind(ids)
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    async fn room_name_exists(&self, name: &str) -> Result<bool, RepoError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn create_room(
        &self,
        host_id: i64,
        room: &NewRoom,
        facility_ids: &[i64],
        image_urls: &[String],
    ) -> Result<RoomDetails, RepoError> {
        let mut tx = self.db.begin().await?;

        // ON CONFLICT makes a concurrent insert of the same name wait for the
        // first transaction and then return no row.
        let room_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO rooms (name, address, detail_address, price, description, latitude,
                               longitude, maximum_occupancy, bedroom, bathroom, bed, host_id,
                               category_id, room_type_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&room.name)
        .bind(&room.address)
        .bind(&room.detail_address)
        .bind(room.price)
        .bind(&room.description)
        .bind(room.latitude)
        .bind(room.longitude)
        .bind(room.maximum_occupancy)
        .bind(room.bedroom)
        .bind(room.bathroom)
        .bind(room.bed)
        .bind(host_id)
        .bind(room.category_id)
        .bind(room.room_type_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let Some(room_id) = room_id else {
            tx.rollback().await?;
            return Err(RepoError::Duplicate(UniqueField::RoomName));
        };

        sqlx::query(
            r#"
            INSERT INTO room_facilities (room_id, facility_id)
            SELECT $1, UNNEST($2::BIGINT[])
            "#,
        )
        .bind(room_id)
        .bind(facility_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO images (room_id, url)
            SELECT $1, UNNEST($2::VARCHAR[])
            "#,
        )
        .bind(room_id)
        .bind(image_urls)
        .execute(&mut *tx)
        .await?;

        let Some(details) = load_details(&mut *tx, room_id).await? else {
            tx.rollback().await?;
            return Err(RepoError::Database(sqlx::Error::RowNotFound));
        };

        tx.commit().await?;
        Ok(details)
    }
}

async fn load_details(
    conn: &mut PgConnection,
    room_id: i64,
) -> Result<Option<RoomDetails>, RepoError> {
    let row = sqlx::query_as::<_, RoomDetailsRow>(
        r#"
        SELECT r.id, r.name, r.address, r.detail_address, r.price, r.description,
               r.latitude, r.longitude, r.maximum_occupancy, r.bedroom, r.bathroom, r.bed,
               r.host_id, r.category_id, r.room_type_id, r.created_at,
               u.first_name AS host_first_name, u.last_name AS host_last_name,
               c.name AS category, t.name AS room_type
        FROM rooms r
        JOIN hosts h ON h.id = r.host_id
        JOIN users u ON u.id = h.user_id
        JOIN categories c ON c.id = r.category_id
        JOIN room_types t ON t.id = r.room_type_id
        WHERE r.id = $1
        "#,
    )
    .bind(room_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let facilities = sqlx::query_scalar::<_, String>(
        r#"
        SELECT f.name
          FROM room_facilities rf
          JOIN facilities f ON f.id = rf.facility_id
         WHERE rf.room_id = $1
         ORDER BY rf.id ASC
        "#,
    )
    .bind(room_id)
    .fetch_all(&mut *conn)
    .await?;

    let images = sqlx::query_scalar::<_, String>(
        "SELECT url FROM images WHERE room_id = $1 ORDER BY id ASC",
    )
    .bind(room_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(RoomDetails {
        room: row.room,
        host_first_name: row.host_first_name,
        host_last_name: row.host_last_name,
        category: row.category,
        room_type: row.room_type,
        facilities,
        images,
    }))
}
