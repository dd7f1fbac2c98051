use serde::{Deserialize, Serialize};

/// Aggregate counts for the landing dashboard.
///
/// Everything here is computed at read time from live rows — the defaulter
/// count in particular runs the billing derivation per assigned resident
/// rather than reading any stored status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub residents: i64,
    pub rooms: i64,
    pub beds_total: i64,
    pub beds_occupied: i64,
    pub open_complaints: i64,
    /// Residents whose derived status is Defaulter or CriticalDefaulter.
    pub defaulters: i64,
}
