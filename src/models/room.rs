use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A room with a fixed number of beds and a monthly fee.
///
/// `occupancy` counts beds currently filled and is bounded by `capacity` at
/// all times. The occupancy ledger in the database layer is the only code
/// allowed to move this counter; everything else treats it as read-only.
///
/// Rooms with occupants cannot be deleted, and capacity can never be resized
/// below the current occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    /// Human-facing label ("101", "2B"). Unique across the house.
    pub number: String,
    /// Free-form category label ("single", "double", "dorm").
    pub room_type: String,
    pub capacity: i64,
    pub occupancy: i64,
    pub monthly_fee: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a room. Occupancy always starts at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomInput {
    pub number: String,
    pub room_type: String,
    pub capacity: i64,
    pub monthly_fee: f64,
}

/// Input for updating a room. All fields are optional for partial updates.
///
/// Occupancy is deliberately absent — it can only change through
/// assignment operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoomInput {
    pub number: Option<String>,
    pub room_type: Option<String>,
    pub capacity: Option<i64>,
    pub monthly_fee: Option<f64>,
}

/// Upper bounds for room fields, settable from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_capacity: i64,
    pub max_monthly_fee: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_capacity: 12,
            max_monthly_fee: 1_000_000.0,
        }
    }
}
