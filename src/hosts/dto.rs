use std::{collections::HashMap, ops::RangeInclusive, str::FromStr};

use bytes::Bytes;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::repo_types::{NewRoom, RoomDetails};
use crate::error::AppError;

/// One uploaded image part.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

pub const FACILITY_IDS: &str = "facility_ids";
pub const FILES: &str = "files";
// Older clients send the region under this key.
const ADDRESS_ALIAS: &str = "state/province/region";

// Column limits of the rooms table.
const ROOM_NAME_MAX_CHARS: usize = 100;
const ADDRESS_MAX_CHARS: usize = 200;
// NUMERIC(10, 2)
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 100_000_000;

// Declaration order; the first missing key is the one reported.
const REQUIRED_FIELDS: [&str; 13] = [
    "room_name",
    "address",
    "detail_address",
    "price",
    "description",
    "latitude",
    "longitude",
    "maximum_occupancy",
    "bedroom",
    "bathroom",
    "bed",
    "category_id",
    "room_type_id",
];

/// Raw multipart fields of a room registration.
#[derive(Debug, Default)]
pub struct RoomForm {
    fields: HashMap<String, String>,
    facility_ids: Vec<String>,
    files: Vec<UploadItem>,
}

/// A fully extracted room registration request.
#[derive(Debug)]
pub struct RoomRegistration {
    pub room: NewRoom,
    /// Distinct ids, in submission order.
    pub facility_ids: Vec<i64>,
    pub files: Vec<UploadItem>,
}

fn list_key(name: &str) -> &str {
    name.strip_suffix("[]").unwrap_or(name)
}

impl RoomForm {
    pub fn push_text(&mut self, name: &str, value: String) {
        match list_key(name) {
            FACILITY_IDS => self.facility_ids.push(value),
            ADDRESS_ALIAS => {
                self.fields.insert("address".to_string(), value);
            }
            key => {
                self.fields.insert(key.to_string(), value);
            }
        }
    }

    pub fn push_file(&mut self, item: UploadItem) {
        self.files.push(item);
    }

    pub fn is_file_field(name: &str) -> bool {
        list_key(name) == FILES
    }

    fn text(&self, key: &'static str) -> Result<&str, AppError> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::KeyError(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<T, AppError> {
        self.text(key)?
            .parse::<T>()
            .map_err(|_| AppError::InvalidField(key))
    }

    fn bounded_text(&self, key: &'static str, max_chars: usize) -> Result<String, AppError> {
        let value = self.text(key)?;
        if value.chars().count() > max_chars {
            return Err(AppError::InvalidField(key));
        }
        Ok(value.to_string())
    }

    fn in_range<T>(&self, key: &'static str, range: RangeInclusive<T>) -> Result<T, AppError>
    where
        T: FromStr + PartialOrd,
    {
        let value = self.parsed::<T>(key)?;
        if !range.contains(&value) {
            return Err(AppError::InvalidField(key));
        }
        Ok(value)
    }

    fn price(&self) -> Result<Decimal, AppError> {
        let price = self
            .parsed::<Decimal>("price")?
            .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if price < Decimal::ZERO || price >= Decimal::from(PRICE_LIMIT) {
            return Err(AppError::InvalidField("price"));
        }
        Ok(price)
    }

    pub fn into_registration(self) -> Result<RoomRegistration, AppError> {
        for key in REQUIRED_FIELDS {
            self.text(key)?;
        }

        let room = NewRoom {
            name: self.bounded_text("room_name", ROOM_NAME_MAX_CHARS)?,
            address: self.bounded_text("address", ADDRESS_MAX_CHARS)?,
            detail_address: self.bounded_text("detail_address", ADDRESS_MAX_CHARS)?,
            price: self.price()?,
            description: self.text("description")?.to_string(),
            latitude: self.in_range("latitude", -90.0..=90.0)?,
            longitude: self.in_range("longitude", -180.0..=180.0)?,
            maximum_occupancy: self.in_range("maximum_occupancy", 0..=i32::MAX)?,
            bedroom: self.in_range("bedroom", 0..=i32::MAX)?,
            bathroom: self.in_range("bathroom", 0..=i32::MAX)?,
            bed: self.in_range("bed", 0..=i32::MAX)?,
            category_id: self.parsed("category_id")?,
            room_type_id: self.parsed("room_type_id")?,
        };

        let mut facility_ids: Vec<i64> = Vec::with_capacity(self.facility_ids.len());
        for raw in &self.facility_ids {
            let id = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::InvalidField(FACILITY_IDS))?;
            if !facility_ids.contains(&id) {
                facility_ids.push(id);
            }
        }

        Ok(RoomRegistration {
            room,
            facility_ids,
            files: self.files,
        })
    }
}

/// Denormalized view of a freshly registered room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: i64,
    pub room_name: String,
    pub address: String,
    pub price: Decimal,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub maximum_occupancy: i32,
    pub bedroom: i32,
    pub bathroom: i32,
    pub bed: i32,
    pub host_name: String,
    pub category: String,
    pub room_type: String,
    pub facilities: Vec<String>,
    pub images: Vec<String>,
}

impl From<RoomDetails> for RoomSummary {
    fn from(d: RoomDetails) -> Self {
        let host_name = format!(
            "{}{}",
            d.host_last_name.unwrap_or_default(),
            d.host_first_name.unwrap_or_default()
        );
        Self {
            id: d.room.id,
            room_name: d.room.name,
            address: format!("{} {}", d.room.address, d.room.detail_address)
                .trim()
                .to_string(),
            price: d.room.price,
            description: d.room.description,
            latitude: d.room.latitude,
            longitude: d.room.longitude,
            maximum_occupancy: d.room.maximum_occupancy,
            bedroom: d.room.bedroom,
            bathroom: d.room.bathroom,
            bed: d.room.bed,
            host_name,
            category: d.category,
            room_type: d.room_type,
            facilities: d.facilities,
            images: d.images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomInfo {
    pub room_info: RoomSummary,
}

#[derive(Debug, Serialize)]
pub struct HostName {
    pub host_name: String,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}
