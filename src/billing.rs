//! Billing derivation engine.
//!
//! A resident's payment state is never stored; it is a pure function of the
//! active assignment, the room's current fee, the most recent payment date,
//! and a reference date. Billing runs on a rolling 30-day cycle: each payment
//! opens a new cycle, and every day past the due date adds a fixed fine.
//!
//! All arithmetic is done at day granularity on [`NaiveDate`] so two calls on
//! the same calendar day cannot disagree, regardless of wall-clock time.

use chrono::{Days, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::models::{Assignment, BillingSnapshot, BillingStatus};

/// Length of one billing cycle in days.
pub const CYCLE_DAYS: u64 = 30;

/// Fine accrued per day past the due date, in currency units. Fixed rate.
pub const FINE_PER_DAY: f64 = 100.0;

/// Ordered status tiers: the first entry whose upper bound (inclusive, in
/// days late) covers the value wins. Extend here to add tiers.
const STATUS_TIERS: &[(i64, BillingStatus)] = &[
    (0, BillingStatus::Paid),
    (4, BillingStatus::Late),
    (30, BillingStatus::Defaulter),
    (i64::MAX, BillingStatus::CriticalDefaulter),
];

/// The reference date billing computations use: the current UTC calendar day.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Round a currency amount to two decimal places for equality checks.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn classify(days_late: i64) -> BillingStatus {
    STATUS_TIERS
        .iter()
        .find(|(upper, _)| days_late <= *upper)
        .map(|(_, status)| *status)
        .unwrap_or(BillingStatus::CriticalDefaulter)
}

/// Compute a resident's billing snapshot.
///
/// Fails with [`Error::Precondition`] if the resident has no active
/// assignment — billing only applies to assigned residents. With an
/// assignment but no payment on record the snapshot is `PaymentPending` with
/// no due date and the bare monthly fee payable. Otherwise the due date is
/// 30 days after the last payment, and each whole day past it adds
/// [`FINE_PER_DAY`] to the total.
///
/// A resident exactly on the due date (`today == due_date`) is `Paid`:
/// `days_late <= 0` always counts as fully paid.
pub fn compute_snapshot(
    assignment: Option<&Assignment>,
    monthly_fee: f64,
    room_type: &str,
    last_payment_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<BillingSnapshot> {
    let assignment = assignment.ok_or_else(|| {
        Error::Precondition("resident must be assigned to a room before billing applies".into())
    })?;

    let (due_date, days_late) = match last_payment_date {
        Some(paid_on) => {
            let due = paid_on + Days::new(CYCLE_DAYS);
            let late = (today - due).num_days().max(0);
            (Some(due), late)
        }
        None => (None, 0),
    };

    let fine = days_late as f64 * FINE_PER_DAY;
    let status = match last_payment_date {
        Some(_) => classify(days_late),
        None => BillingStatus::PaymentPending,
    };

    Ok(BillingSnapshot {
        resident_id: assignment.resident_id,
        monthly_fee,
        room_type: room_type.to_string(),
        assigned_since: assignment.since,
        last_payment_date,
        due_date,
        days_late,
        fine,
        total_payable: monthly_fee + fine,
        status,
        today,
    })
}
