use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resident's billing state at a point in time.
///
/// Snapshots are derived, never persisted: the engine recomputes one from
/// the active assignment and the most recent payment every time it is asked.
/// Two computations over identical inputs yield identical snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub resident_id: Uuid,
    pub monthly_fee: f64,
    pub room_type: String,
    pub assigned_since: NaiveDate,
    /// Most recent payment date, `None` if the resident has never paid.
    pub last_payment_date: Option<NaiveDate>,
    /// `last_payment_date + 30 days`, `None` before the first payment.
    pub due_date: Option<NaiveDate>,
    pub days_late: i64,
    pub fine: f64,
    pub total_payable: f64,
    pub status: BillingStatus,
    /// The reference date the snapshot was computed against.
    pub today: NaiveDate,
}

/// Payment status derived from how far past the due date a resident is.
///
/// - `PaymentPending`: assigned but has never paid
/// - `Paid`: within the current 30-day cycle
/// - `Late`: 1-4 days past due
/// - `Defaulter`: 5-30 days past due
/// - `CriticalDefaulter`: more than 30 days past due
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BillingStatus {
    PaymentPending,
    Paid,
    Late,
    Defaulter,
    CriticalDefaulter,
}

impl BillingStatus {
    /// True for the tiers the dashboard counts as defaulting.
    pub fn is_defaulting(&self) -> bool {
        matches!(self, Self::Defaulter | Self::CriticalDefaulter)
    }
}
