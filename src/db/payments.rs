//! Payment acceptance guard and billing read path.
//!
//! `record_payment` validates a proposed amount against a snapshot computed
//! inside the same transaction as the insert, so two concurrent payments
//! cannot both validate against the same pre-payment state. The payments
//! table is append-only: the insert here is the only mutation.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::billing::{self, round2};
use crate::error::{Error, Result};
use crate::models::{BillingSnapshot, Payment, PaymentReceipt};

use super::{assignments, parse_date, parse_datetime, parse_uuid, Database};

impl Database {
    /// The resident's current billing snapshot, derived fresh from the
    /// active assignment and the most recent payment. Pure read; calling it
    /// twice on the same day with no intervening payment returns identical
    /// snapshots.
    pub fn billing_status(&self, resident_id: Uuid) -> Result<BillingSnapshot> {
        let conn = self.conn.lock().expect("database lock poisoned");
        snapshot_for(&conn, resident_id, billing::today())
    }

    /// Accept a payment if and only if it equals the currently payable
    /// amount to the cent. On success the payment is inserted dated today
    /// and the post-payment snapshot (now `Paid`, due in 30 days) is
    /// returned for confirmation. Partial and over-payments are rejected
    /// with `Validation`.
    pub fn record_payment(&self, resident_id: Uuid, amount: f64) -> Result<PaymentReceipt> {
        let today = billing::today();
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let snapshot = snapshot_for(&tx, resident_id, today)?;
        if round2(amount) != round2(snapshot.total_payable) {
            return Err(amount_mismatch(&snapshot, amount));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        tx.execute(
            "INSERT INTO payments (id, resident_id, amount, paid_on, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                resident_id.to_string(),
                round2(amount),
                today.to_string(),
                now.to_rfc3339(),
            ),
        )?;

        let confirmed = snapshot_for(&tx, resident_id, today)?;
        tx.commit()?;

        Ok(PaymentReceipt {
            payment: Payment {
                id,
                resident_id,
                amount: round2(amount),
                paid_on: today,
                created_at: now,
            },
            snapshot: confirmed,
        })
    }

    /// A resident's payment history, newest first.
    pub fn get_payments(&self, resident_id: Uuid) -> Result<Vec<Payment>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        assignments::ensure_resident_exists(&conn, resident_id)?;

        let mut stmt = conn.prepare(
            "SELECT id, resident_id, amount, paid_on, created_at
             FROM payments WHERE resident_id = ? ORDER BY paid_on DESC, created_at DESC",
        )?;

        let payments = stmt
            .query_map([resident_id.to_string()], |row| {
                Ok(Payment {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    resident_id: parse_uuid(row.get::<_, String>(1)?),
                    amount: row.get(2)?,
                    paid_on: parse_date(row.get::<_, String>(3)?),
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(payments)
    }
}

/// Load everything the billing engine needs and derive a snapshot, all
/// against the caller's connection (and therefore inside its transaction,
/// when one is open).
pub(super) fn snapshot_for(
    conn: &Connection,
    resident_id: Uuid,
    today: NaiveDate,
) -> Result<BillingSnapshot> {
    assignments::ensure_resident_exists(conn, resident_id)?;
    let assignment = assignments::active_assignment(conn, resident_id)?;

    let (monthly_fee, room_type) = match &assignment {
        Some(a) => conn.query_row(
            "SELECT monthly_fee, room_type FROM rooms WHERE id = ?",
            [a.room_id.to_string()],
            |row| Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?)),
        )?,
        None => (0.0, String::new()),
    };

    let last_payment_date = last_payment_date(conn, resident_id)?;

    billing::compute_snapshot(
        assignment.as_ref(),
        monthly_fee,
        &room_type,
        last_payment_date,
        today,
    )
}

fn last_payment_date(conn: &Connection, resident_id: Uuid) -> Result<Option<NaiveDate>> {
    let mut stmt = conn.prepare(
        "SELECT paid_on FROM payments WHERE resident_id = ?
         ORDER BY paid_on DESC, created_at DESC LIMIT 1",
    )?;
    let mut rows = stmt.query([resident_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_date(row.get::<_, String>(0)?))),
        None => Ok(None),
    }
}

fn amount_mismatch(snapshot: &BillingSnapshot, amount: f64) -> Error {
    let msg = match snapshot.last_payment_date {
        None => format!(
            "first payment must equal the monthly fee of {:.2}; got {:.2}",
            snapshot.monthly_fee, amount
        ),
        Some(_) if snapshot.days_late == 0 => format!(
            "renewal must equal the monthly fee of {:.2}; got {:.2}",
            snapshot.monthly_fee, amount
        ),
        Some(_) => format!(
            "payment is {} day(s) late; expected monthly fee {:.2} plus fine {:.2} = {:.2}; got {:.2}",
            snapshot.days_late,
            snapshot.monthly_fee,
            snapshot.fine,
            snapshot.total_payable,
            amount
        ),
    };
    Error::Validation(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingStatus, CreateResidentInput, CreateRoomInput};

    fn setup() -> (Database, Uuid) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let resident = db
            .create_resident(CreateResidentInput {
                name: "Asha".to_string(),
                phone: "555-0100".to_string(),
                email: None,
                guardian_name: None,
            })
            .unwrap();
        let room = db
            .create_room(CreateRoomInput {
                number: "101".to_string(),
                room_type: "double".to_string(),
                capacity: 2,
                monthly_fee: 5000.0,
            })
            .unwrap();
        db.assign(resident.id, room.id).unwrap();
        (db, resident.id)
    }

    /// Insert a payment row directly with a chosen date, bypassing the
    /// guard, to set up late-renewal states.
    fn backdate_payment(db: &Database, resident_id: Uuid, paid_on: &str, amount: f64) {
        let conn = db.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO payments (id, resident_id, amount, paid_on, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                resident_id.to_string(),
                amount,
                paid_on,
                Utc::now().to_rfc3339(),
            ),
        )
        .unwrap();
    }

    #[test]
    fn late_renewal_requires_fee_plus_fine() {
        let (db, resident_id) = setup();
        // Last paid 33 days ago: 3 days late, fine 300.
        let paid_on = (billing::today() - chrono::Days::new(33)).to_string();
        backdate_payment(&db, resident_id, &paid_on, 5000.0);

        let snap = db.billing_status(resident_id).unwrap();
        assert_eq!(snap.days_late, 3);
        assert_eq!(snap.status, BillingStatus::Late);
        assert_eq!(snap.total_payable, 5300.0);

        // Bare fee is no longer enough, and the message names the fine.
        let err = db.record_payment(resident_id, 5000.0).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("3 day(s) late"), "message: {msg}");
                assert!(msg.contains("300.00"), "message: {msg}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }

        let receipt = db.record_payment(resident_id, 5300.0).unwrap();
        assert_eq!(receipt.snapshot.status, BillingStatus::Paid);
        assert_eq!(receipt.snapshot.fine, 0.0);
    }

    #[test]
    fn first_payment_message_names_the_monthly_fee() {
        let (db, resident_id) = setup();
        let err = db.record_payment(resident_id, 4000.0).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("first payment"), "message: {msg}");
                assert!(msg.contains("5000.00"), "message: {msg}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejected_payment_inserts_nothing() {
        let (db, resident_id) = setup();
        db.record_payment(resident_id, 4999.0).unwrap_err();
        assert!(db.get_payments(resident_id).unwrap().is_empty());
    }

    #[test]
    fn amounts_are_compared_at_cent_precision() {
        let (db, resident_id) = setup();
        // 4999.999 rounds to 5000.00 and is accepted.
        let receipt = db.record_payment(resident_id, 4999.999).unwrap();
        assert_eq!(receipt.payment.amount, 5000.0);
    }
}
