//! Domain models for Bunkhouse.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`Resident`]: a person living in the house; identity fields only.
//! - [`Room`]: beds and a monthly fee; `occupancy` is owned by the
//!   occupancy ledger and bounded by `capacity` at all times.
//! - [`Assignment`]: the single active resident-to-room binding. At most one
//!   per resident; transfers replace it, never duplicate it.
//! - [`Payment`]: append-only money-received log, the sole source of billing
//!   truth.
//! - [`Complaint`]: free-text pass-through workflow.
//!
//! ## Derived Views
//!
//! - [`BillingSnapshot`]: a resident's due date, fine, and status, recomputed
//!   from the assignment and payment log on every read. Never persisted.
//! - [`DashboardSummary`]: aggregate counts computed at read time.

mod assignment;
mod billing;
mod complaint;
mod dashboard;
mod payment;
mod resident;
mod room;

pub use assignment::*;
pub use billing::*;
pub use complaint::*;
pub use dashboard::*;
pub use payment::*;
pub use resident::*;
pub use room::*;
