use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The active binding between one resident and one room.
///
/// A resident has at most one assignment at a time (enforced by a unique
/// index on `resident_id`). Transfers repoint the existing row to the new
/// room and reset `since`; they never create a second row. Absence of a row
/// means "unassigned".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub room_id: Uuid,
    /// Date the resident moved into the current room. Reset on transfer.
    pub since: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for assigning a resident to a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignInput {
    pub resident_id: Uuid,
    pub room_id: Uuid,
}

/// Input for transferring a resident to a different room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    pub resident_id: Uuid,
    pub new_room_id: Uuid,
}

/// Confirmation payload for a completed transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub from_room_id: Uuid,
    pub to_room_id: Uuid,
}
