use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-text complaint raised by a resident.
///
/// Plain pass-through workflow: filed as `Open`, flipped to `Resolved` by
/// staff. Deleted together with the resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub subject: String,
    pub body: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Open,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// Input for filing a complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComplaintInput {
    pub resident_id: Uuid,
    pub subject: String,
    pub body: String,
}

/// Input for updating a complaint. All fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateComplaintInput {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub status: Option<ComplaintStatus>,
}
