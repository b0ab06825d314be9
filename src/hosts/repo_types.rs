use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Capability record allowing a user to register rooms.
#[derive(Debug, Clone, FromRow)]
pub struct Host {
    pub id: i64,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub detail_address: String,
    pub price: Decimal,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub maximum_occupancy: i32,
    pub bedroom: i32,
    pub bathroom: i32,
    pub bed: i32,
    pub host_id: i64,
    pub category_id: i64,
    pub room_type_id: i64,
    pub created_at: OffsetDateTime,
}

/// Room attributes as submitted, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoom {
    pub name: String,
    pub address: String,
    pub detail_address: String,
    pub price: Decimal,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub maximum_occupancy: i32,
    pub bedroom: i32,
    pub bathroom: i32,
    pub bed: i32,
    pub category_id: i64,
    pub room_type_id: i64,
}

/// A room joined with everything its summary shows.
#[derive(Debug, Clone)]
pub struct RoomDetails {
    pub room: Room,
    pub host_first_name: Option<String>,
    pub host_last_name: Option<String>,
    pub category: String,
    pub room_type: String,
    pub facilities: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, FromRow)]
pub(super) struct RoomDetailsRow {
    #[sqlx(flatten)]
    pub room: Room,
    pub host_first_name: Option<String>,
    pub host_last_name: Option<String>,
    pub category: String,
    pub room_type: String,
}
