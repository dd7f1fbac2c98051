use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable record of money received from a resident.
///
/// Payments are append-only — never updated, never deleted (except as part
/// of deleting the resident). The payment log is the sole source of billing
/// truth; due dates, fines, and statuses are all recomputed from it on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub amount: f64,
    /// Calendar date the payment was accepted, at day granularity.
    pub paid_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentInput {
    pub resident_id: Uuid,
    pub amount: f64,
}

/// Confirmation returned after a payment is accepted: the stored payment and
/// the freshly recomputed post-payment snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub snapshot: super::BillingSnapshot,
}
