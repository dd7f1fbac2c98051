//! Assignment manager: create, transfer, and release resident-room bindings.
//!
//! Per resident the state machine is Unassigned → Assigned (assign),
//! Assigned → Assigned (transfer to a different room), Assigned → Unassigned
//! (release). Every mutation takes the connection lock once and runs inside
//! a rusqlite transaction; dropping an uncommitted transaction rolls it
//! back, so any `?` exit leaves the store exactly as it was.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Assignment, TransferOutcome};

use super::{ledger, parse_date, parse_datetime, parse_uuid, Database};

impl Database {
    /// Assign an unassigned resident to a room with a free bed.
    pub fn assign(&self, resident_id: Uuid, room_id: Uuid) -> Result<Assignment> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        ensure_resident_exists(&tx, resident_id)?;
        if active_assignment(&tx, resident_id)?.is_some() {
            return Err(Error::Conflict(format!(
                "resident {resident_id} already has an active assignment"
            )));
        }

        ledger::reserve_bed(&tx, room_id)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let since = now.date_naive();
        tx.execute(
            "INSERT INTO assignments (id, resident_id, room_id, since, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                resident_id.to_string(),
                room_id.to_string(),
                since.to_string(),
                now.to_rfc3339(),
            ),
        )?;
        tx.commit()?;

        Ok(Assignment {
            id,
            resident_id,
            room_id,
            since,
            created_at: now,
        })
    }

    /// Move a resident to a different room as a single all-or-nothing unit:
    /// release the old bed, reserve the new one, repoint the assignment and
    /// reset its `since` date. If the target room is full or missing, the
    /// transaction rolls back and no partial mutation is observable.
    pub fn transfer(&self, resident_id: Uuid, new_room_id: Uuid) -> Result<TransferOutcome> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        ensure_resident_exists(&tx, resident_id)?;
        let assignment = active_assignment(&tx, resident_id)?.ok_or_else(|| {
            Error::InvalidState(format!("resident {resident_id} has no active assignment"))
        })?;
        if assignment.room_id == new_room_id {
            return Err(Error::InvalidState(format!(
                "resident {resident_id} is already in room {new_room_id}; transfer requires a different room"
            )));
        }

        ledger::release_bed(&tx, assignment.room_id)?;
        ledger::reserve_bed(&tx, new_room_id)?;

        let since = Utc::now().date_naive();
        tx.execute(
            "UPDATE assignments SET room_id = ?, since = ? WHERE id = ?",
            (
                new_room_id.to_string(),
                since.to_string(),
                assignment.id.to_string(),
            ),
        )?;
        tx.commit()?;

        Ok(TransferOutcome {
            from_room_id: assignment.room_id,
            to_room_id: new_room_id,
        })
    }

    /// Remove the resident's active assignment, if any, and release its bed.
    /// Returns whether an assignment was removed.
    pub fn release(&self, resident_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let released = release_in_tx(&tx, resident_id)?;
        tx.commit()?;
        Ok(released)
    }

    /// The resident's active assignment, or `None` if unassigned.
    pub fn get_assignment(&self, resident_id: Uuid) -> Result<Option<Assignment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        active_assignment(&conn, resident_id)
    }
}

/// Delete the active assignment and give its bed back, inside the caller's
/// transaction. The unique index on `assignments.resident_id` guarantees at
/// most one row, so this is a single release rather than a loop.
pub(super) fn release_in_tx(conn: &Connection, resident_id: Uuid) -> Result<bool> {
    let Some(assignment) = active_assignment(conn, resident_id)? else {
        return Ok(false);
    };

    ledger::release_bed(conn, assignment.room_id)?;
    conn.execute(
        "DELETE FROM assignments WHERE id = ?",
        [assignment.id.to_string()],
    )?;
    Ok(true)
}

pub(super) fn active_assignment(
    conn: &Connection,
    resident_id: Uuid,
) -> Result<Option<Assignment>> {
    let mut stmt = conn.prepare(
        "SELECT id, resident_id, room_id, since, created_at
         FROM assignments WHERE resident_id = ?",
    )?;

    let mut rows = stmt.query([resident_id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(Assignment {
            id: parse_uuid(row.get::<_, String>(0)?),
            resident_id: parse_uuid(row.get::<_, String>(1)?),
            room_id: parse_uuid(row.get::<_, String>(2)?),
            since: parse_date(row.get::<_, String>(3)?),
            created_at: parse_datetime(row.get::<_, String>(4)?),
        }))
    } else {
        Ok(None)
    }
}

pub(super) fn ensure_resident_exists(conn: &Connection, resident_id: Uuid) -> Result<()> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM residents WHERE id = ?",
        [resident_id.to_string()],
        |row| row.get(0),
    )?;
    if count == 0 {
        return Err(Error::NotFound(format!("resident {resident_id} not found")));
    }
    Ok(())
}
