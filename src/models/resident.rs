use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person living in the house.
///
/// Residents carry identity and contact fields only. Their room binding lives
/// in [`crate::models::Assignment`] and their payment state is derived on
/// demand from the payments log — a resident row never stores billing status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    /// Emergency contact, typically a parent or guardian.
    pub guardian_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new resident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResidentInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub guardian_name: Option<String>,
}

/// Input for updating a resident. All fields are optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResidentInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub guardian_name: Option<String>,
}
