//! Occupancy ledger: the only legal mutators of `rooms.occupancy`.
//!
//! Both operations are single guarded UPDATE statements, so the bounds check
//! and the counter change are one atomic step inside whatever transaction
//! the caller has open. The schema-level CHECK constraint backs them up —
//! occupancy can never leave `0..=capacity` even if a new code path writes
//! the column by mistake.

use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Claim one bed in the room: occupancy += 1.
///
/// Fails with [`Error::Capacity`] when the room is full and
/// [`Error::NotFound`] when the room does not exist.
pub(super) fn reserve_bed(conn: &Connection, room_id: Uuid) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE rooms SET occupancy = occupancy + 1, updated_at = ?
         WHERE id = ? AND occupancy < capacity",
        (&now, room_id.to_string()),
    )?;
    if changed == 1 {
        return Ok(());
    }

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rooms WHERE id = ?",
        [room_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 0 {
        Err(Error::NotFound(format!("room {room_id} not found")))
    } else {
        Err(Error::Capacity(format!("room {room_id} has no free beds")))
    }
}

/// Give one bed back: occupancy -= 1, floored at 0.
///
/// Releasing a bed in an empty or missing room is a no-op, never an error.
pub(super) fn release_bed(conn: &Connection, room_id: Uuid) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE rooms SET occupancy = occupancy - 1, updated_at = ?
         WHERE id = ? AND occupancy > 0",
        (&now, room_id.to_string()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::CreateRoomInput;

    fn setup() -> (Database, Uuid) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let room = db
            .create_room(CreateRoomInput {
                number: "101".to_string(),
                room_type: "double".to_string(),
                capacity: 2,
                monthly_fee: 5000.0,
            })
            .unwrap();
        (db, room.id)
    }

    #[test]
    fn reserve_fills_beds_then_rejects_with_capacity() {
        let (db, room_id) = setup();
        let conn = db.conn.lock().unwrap();

        reserve_bed(&conn, room_id).unwrap();
        reserve_bed(&conn, room_id).unwrap();
        let err = reserve_bed(&conn, room_id).unwrap_err();
        assert!(matches!(err, Error::Capacity(_)));

        let occupancy: i64 = conn
            .query_row(
                "SELECT occupancy FROM rooms WHERE id = ?",
                [room_id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(occupancy, 2);
    }

    #[test]
    fn reserve_on_missing_room_is_not_found() {
        let (db, _) = setup();
        let conn = db.conn.lock().unwrap();
        let err = reserve_bed(&conn, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn release_floors_at_zero() {
        let (db, room_id) = setup();
        let conn = db.conn.lock().unwrap();

        reserve_bed(&conn, room_id).unwrap();
        release_bed(&conn, room_id).unwrap();
        release_bed(&conn, room_id).unwrap(); // already empty, no-op
        release_bed(&conn, room_id).unwrap();

        let occupancy: i64 = conn
            .query_row(
                "SELECT occupancy FROM rooms WHERE id = ?",
                [room_id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(occupancy, 0);
    }
}
