mod assignments;
mod ledger;
mod payments;
mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::billing;
use crate::error::{Error, Result};
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    limits: Limits,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))
            .map_err(Error::Internal)?;
        std::fs::create_dir_all(parent).map_err(|e| Error::Internal(e.into()))?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            limits: Limits::default(),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "bunkhouse")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map_err(Error::Internal)?;
        let db_path = dirs.data_dir().join("bunkhouse.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            limits: Limits::default(),
        })
    }

    /// Replace the default room-field bounds (CLI override).
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn).map_err(Error::Internal)
    }

    // ============================================================
    // Resident operations
    // ============================================================

    pub fn get_all_residents(&self) -> Result<Vec<Resident>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, email, guardian_name, created_at, updated_at
             FROM residents ORDER BY name",
        )?;

        let residents = stmt
            .query_map([], map_resident_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(residents)
    }

    /// Case-insensitive substring search over name and phone.
    pub fn search_residents(&self, query: &str) -> Result<Vec<Resident>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, email, guardian_name, created_at, updated_at
             FROM residents WHERE name LIKE ?1 OR phone LIKE ?1 ORDER BY name",
        )?;

        let pattern = format!("%{}%", query);
        let residents = stmt
            .query_map([pattern], map_resident_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(residents)
    }

    pub fn get_resident(&self, id: Uuid) -> Result<Option<Resident>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, email, guardian_name, created_at, updated_at
             FROM residents WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_resident_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_resident(&self, input: CreateResidentInput) -> Result<Resident> {
        if input.name.trim().is_empty() {
            return Err(Error::Validation("resident name must not be empty".into()));
        }
        if input.phone.trim().is_empty() {
            return Err(Error::Validation("resident phone must not be empty".into()));
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO residents (id, name, phone, email, guardian_name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.phone,
                &input.email,
                &input.guardian_name,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Resident {
            id,
            name: input.name,
            phone: input.phone,
            email: input.email,
            guardian_name: input.guardian_name,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_resident(
        &self,
        id: Uuid,
        input: UpdateResidentInput,
    ) -> Result<Option<Resident>> {
        let Some(existing) = self.get_resident(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let phone = input.phone.unwrap_or(existing.phone);
        let email = input.email.or(existing.email);
        let guardian_name = input.guardian_name.or(existing.guardian_name);

        conn.execute(
            "UPDATE residents SET name = ?, phone = ?, email = ?, guardian_name = ?, updated_at = ? WHERE id = ?",
            (
                &name,
                &phone,
                &email,
                &guardian_name,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Resident {
            id,
            name,
            phone,
            email,
            guardian_name,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a resident and everything hanging off them in one transaction:
    /// the active assignment (its bed is released), the payment history, and
    /// any complaints. Orphaned payment history is meaningless once the
    /// resident is gone.
    pub fn delete_resident(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM residents WHERE id = ?",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(false);
        }

        assignments::release_in_tx(&tx, id)?;
        tx.execute("DELETE FROM payments WHERE resident_id = ?", [id.to_string()])?;
        tx.execute(
            "DELETE FROM complaints WHERE resident_id = ?",
            [id.to_string()],
        )?;
        tx.execute("DELETE FROM residents WHERE id = ?", [id.to_string()])?;
        tx.commit()?;

        Ok(true)
    }

    // ============================================================
    // Room operations
    // ============================================================

    pub fn get_all_rooms(&self) -> Result<Vec<Room>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, number, room_type, capacity, occupancy, monthly_fee, created_at, updated_at
             FROM rooms ORDER BY number",
        )?;

        let rooms = stmt
            .query_map([], map_room_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rooms)
    }

    pub fn get_room(&self, id: Uuid) -> Result<Option<Room>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        room_row(&conn, id)
    }

    pub fn create_room(&self, input: CreateRoomInput) -> Result<Room> {
        self.check_room_limits(input.capacity, input.monthly_fee)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let duplicates: i64 = conn.query_row(
            "SELECT COUNT(*) FROM rooms WHERE number = ?",
            [&input.number],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Err(Error::Conflict(format!(
                "room number {} already exists",
                input.number
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO rooms (id, number, room_type, capacity, occupancy, monthly_fee, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
            (
                id.to_string(),
                &input.number,
                &input.room_type,
                input.capacity,
                input.monthly_fee,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Room {
            id,
            number: input.number,
            room_type: input.room_type,
            capacity: input.capacity,
            occupancy: 0,
            monthly_fee: input.monthly_fee,
            created_at: now,
            updated_at: now,
        })
    }

    /// Update a room's label, type, capacity, or fee. Capacity can never be
    /// resized below the current occupancy. Check and mutation run on one
    /// lock acquisition, and the UPDATE itself re-checks occupancy so a
    /// stale read can never shrink an occupied room.
    pub fn update_room(&self, id: Uuid, input: UpdateRoomInput) -> Result<Option<Room>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = room_row(&conn, id)? else {
            return Ok(None);
        };

        let capacity = input.capacity.unwrap_or(existing.capacity);
        let monthly_fee = input.monthly_fee.unwrap_or(existing.monthly_fee);
        self.check_room_limits(capacity, monthly_fee)?;
        if capacity < existing.occupancy {
            return Err(Error::InvalidState(format!(
                "cannot resize room {} to {} beds while {} are occupied",
                existing.number, capacity, existing.occupancy
            )));
        }

        let number = input.number.unwrap_or(existing.number);
        let room_type = input.room_type.unwrap_or(existing.room_type);

        let duplicates: i64 = conn.query_row(
            "SELECT COUNT(*) FROM rooms WHERE number = ? AND id != ?",
            (&number, id.to_string()),
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            return Err(Error::Conflict(format!(
                "room number {number} already exists"
            )));
        }

        let now = Utc::now();
        let rows = conn.execute(
            "UPDATE rooms SET number = ?, room_type = ?, capacity = ?, monthly_fee = ?, updated_at = ?
             WHERE id = ? AND occupancy <= ?",
            (
                &number,
                &room_type,
                capacity,
                monthly_fee,
                now.to_rfc3339(),
                id.to_string(),
                capacity,
            ),
        )?;
        if rows == 0 {
            return Err(Error::InvalidState(format!(
                "cannot resize room {number} below its occupancy"
            )));
        }

        Ok(Some(Room {
            id,
            number,
            room_type,
            capacity,
            occupancy: existing.occupancy,
            monthly_fee,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a room. Rooms with occupants cannot be deleted. Guarded like
    /// the ledger statements: the DELETE only matches an empty room, so the
    /// check and the removal are one atomic step under one lock.
    pub fn delete_room(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(room) = room_row(&conn, id)? else {
            return Ok(false);
        };
        if room.occupancy > 0 {
            return Err(Error::Conflict(format!(
                "room {} still has {} occupant(s)",
                room.number, room.occupancy
            )));
        }

        let rows = conn.execute(
            "DELETE FROM rooms WHERE id = ? AND occupancy = 0",
            [id.to_string()],
        )?;
        if rows == 0 {
            return Err(Error::Conflict(format!(
                "room {} still has occupants",
                room.number
            )));
        }
        Ok(true)
    }

    fn check_room_limits(&self, capacity: i64, monthly_fee: f64) -> Result<()> {
        if capacity < 1 || capacity > self.limits.max_capacity {
            return Err(Error::Validation(format!(
                "capacity must be between 1 and {}",
                self.limits.max_capacity
            )));
        }
        if monthly_fee < 0.0 || monthly_fee > self.limits.max_monthly_fee {
            return Err(Error::Validation(format!(
                "monthly fee must be between 0 and {}",
                self.limits.max_monthly_fee
            )));
        }
        Ok(())
    }

    // ============================================================
    // Complaint operations
    // ============================================================

    pub fn get_all_complaints(&self) -> Result<Vec<Complaint>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, resident_id, subject, body, status, created_at
             FROM complaints ORDER BY created_at DESC",
        )?;

        let complaints = stmt
            .query_map([], map_complaint_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(complaints)
    }

    pub fn get_complaint(&self, id: Uuid) -> Result<Option<Complaint>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, resident_id, subject, body, status, created_at
             FROM complaints WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_complaint_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_complaint(&self, input: CreateComplaintInput) -> Result<Complaint> {
        let conn = self.conn.lock().expect("database lock poisoned");
        assignments::ensure_resident_exists(&conn, input.resident_id)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO complaints (id, resident_id, subject, body, status, created_at)
             VALUES (?, ?, ?, ?, 'open', ?)",
            (
                id.to_string(),
                input.resident_id.to_string(),
                &input.subject,
                &input.body,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Complaint {
            id,
            resident_id: input.resident_id,
            subject: input.subject,
            body: input.body,
            status: ComplaintStatus::Open,
            created_at: now,
        })
    }

    pub fn update_complaint(
        &self,
        id: Uuid,
        input: UpdateComplaintInput,
    ) -> Result<Option<Complaint>> {
        let Some(existing) = self.get_complaint(id)? else {
            return Ok(None);
        };

        let subject = input.subject.unwrap_or(existing.subject);
        let body = input.body.unwrap_or(existing.body);
        let status = input.status.unwrap_or(existing.status);

        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE complaints SET subject = ?, body = ?, status = ? WHERE id = ?",
            (&subject, &body, status.as_str(), id.to_string()),
        )?;

        Ok(Some(Complaint {
            id,
            resident_id: existing.resident_id,
            subject,
            body,
            status,
            created_at: existing.created_at,
        }))
    }

    pub fn delete_complaint(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM complaints WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Dashboard
    // ============================================================

    /// Aggregate counts, all computed from live rows. The defaulter count
    /// runs the billing derivation per assigned resident on the fly.
    pub fn dashboard(&self) -> Result<DashboardSummary> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let residents: i64 =
            conn.query_row("SELECT COUNT(*) FROM residents", [], |row| row.get(0))?;
        let rooms: i64 = conn.query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))?;
        let (beds_total, beds_occupied): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(capacity), 0), COALESCE(SUM(occupancy), 0) FROM rooms",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let open_complaints: i64 = conn.query_row(
            "SELECT COUNT(*) FROM complaints WHERE status = 'open'",
            [],
            |row| row.get(0),
        )?;

        let assigned: Vec<Uuid> = {
            let mut stmt = conn.prepare("SELECT resident_id FROM assignments")?;
            let ids = stmt
                .query_map([], |row| Ok(parse_uuid(row.get::<_, String>(0)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let today = billing::today();
        let mut defaulters = 0;
        for resident_id in assigned {
            let snapshot = payments::snapshot_for(&conn, resident_id, today)?;
            if snapshot.status.is_defaulting() {
                defaulters += 1;
            }
        }

        Ok(DashboardSummary {
            residents,
            rooms,
            beds_total,
            beds_occupied,
            open_complaints,
            defaulters,
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            limits: self.limits,
        }
    }
}

fn map_resident_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resident> {
    Ok(Resident {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        guardian_name: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn room_row(conn: &Connection, id: Uuid) -> Result<Option<Room>> {
    let mut stmt = conn.prepare(
        "SELECT id, number, room_type, capacity, occupancy, monthly_fee, created_at, updated_at
         FROM rooms WHERE id = ?",
    )?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(map_room_row(row)?))
    } else {
        Ok(None)
    }
}

fn map_room_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: parse_uuid(row.get::<_, String>(0)?),
        number: row.get(1)?,
        room_type: row.get(2)?,
        capacity: row.get(3)?,
        occupancy: row.get(4)?,
        monthly_fee: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn map_complaint_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: parse_uuid(row.get::<_, String>(0)?),
        resident_id: parse_uuid(row.get::<_, String>(1)?),
        subject: row.get(2)?,
        body: row.get(3)?,
        status: ComplaintStatus::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(ComplaintStatus::Open),
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    s.parse().unwrap_or_else(|_| Utc::now().date_naive())
}
