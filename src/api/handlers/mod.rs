use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::error::Error;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Wraps the domain error for axum. Every error becomes a JSON body of
/// `{kind, message}` with the status the taxonomy prescribes; internal
/// errors are logged server-side and the client sees a generic message.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn not_found(what: &str) -> Self {
        Self(Error::NotFound(format!("{what} not found")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Capacity(_) => StatusCode::BAD_REQUEST,
            Error::Precondition(_) => StatusCode::PRECONDITION_FAILED,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if matches!(self.0, Error::Internal(_)) {
            tracing::error!("Internal error: {}", self.0);
            "Internal server error".to_string()
        } else {
            tracing::warn!("{}: {}", self.0.kind(), self.0);
            self.0.to_string()
        };

        let body = serde_json::json!({
            "kind": self.0.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Residents
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListResidentsQuery {
    /// Substring match over name and phone.
    pub q: Option<String>,
}

pub async fn list_residents(
    State(db): State<Database>,
    Query(query): Query<ListResidentsQuery>,
) -> ApiResult<Json<Vec<Resident>>> {
    let residents = match query.q {
        Some(q) => db.search_residents(&q)?,
        None => db.get_all_residents()?,
    };
    Ok(Json(residents))
}

pub async fn create_resident(
    State(db): State<Database>,
    Json(input): Json<CreateResidentInput>,
) -> ApiResult<(StatusCode, Json<Resident>)> {
    let resident = db.create_resident(input)?;
    Ok((StatusCode::CREATED, Json(resident)))
}

pub async fn get_resident(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Resident>> {
    db.get_resident(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("resident"))
}

pub async fn update_resident(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateResidentInput>,
) -> ApiResult<Json<Resident>> {
    db.update_resident(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("resident"))
}

pub async fn delete_resident(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_resident(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("resident"))
    }
}

pub async fn list_resident_payments(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(db.get_payments(id)?))
}

pub async fn get_billing_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BillingSnapshot>> {
    Ok(Json(db.billing_status(id)?))
}

// ============================================================
// Rooms
// ============================================================

pub async fn list_rooms(State(db): State<Database>) -> ApiResult<Json<Vec<Room>>> {
    Ok(Json(db.get_all_rooms()?))
}

pub async fn create_room(
    State(db): State<Database>,
    Json(input): Json<CreateRoomInput>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    let room = db.create_room(input)?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn get_room(State(db): State<Database>, Path(id): Path<Uuid>) -> ApiResult<Json<Room>> {
    db.get_room(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("room"))
}

pub async fn update_room(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRoomInput>,
) -> ApiResult<Json<Room>> {
    db.update_room(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("room"))
}

pub async fn delete_room(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_room(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("room"))
    }
}

// ============================================================
// Assignments
// ============================================================

pub async fn assign(
    State(db): State<Database>,
    Json(input): Json<AssignInput>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    let assignment = db.assign(input.resident_id, input.room_id)?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn transfer(
    State(db): State<Database>,
    Json(input): Json<TransferInput>,
) -> ApiResult<Json<TransferOutcome>> {
    Ok(Json(db.transfer(input.resident_id, input.new_room_id)?))
}

pub async fn get_assignment(
    State(db): State<Database>,
    Path(resident_id): Path<Uuid>,
) -> ApiResult<Json<Assignment>> {
    db.get_assignment(resident_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("assignment"))
}

pub async fn release(
    State(db): State<Database>,
    Path(resident_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.release(resident_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("assignment"))
    }
}

// ============================================================
// Payments
// ============================================================

pub async fn record_payment(
    State(db): State<Database>,
    Json(input): Json<RecordPaymentInput>,
) -> ApiResult<(StatusCode, Json<PaymentReceipt>)> {
    let receipt = db.record_payment(input.resident_id, input.amount)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// ============================================================
// Complaints
// ============================================================

pub async fn list_complaints(State(db): State<Database>) -> ApiResult<Json<Vec<Complaint>>> {
    Ok(Json(db.get_all_complaints()?))
}

pub async fn create_complaint(
    State(db): State<Database>,
    Json(input): Json<CreateComplaintInput>,
) -> ApiResult<(StatusCode, Json<Complaint>)> {
    let complaint = db.create_complaint(input)?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn get_complaint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Complaint>> {
    db.get_complaint(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("complaint"))
}

pub async fn update_complaint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateComplaintInput>,
) -> ApiResult<Json<Complaint>> {
    db.update_complaint(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("complaint"))
}

pub async fn delete_complaint(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_complaint(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("complaint"))
    }
}

// ============================================================
// Dashboard
// ============================================================

pub async fn dashboard(State(db): State<Database>) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(db.dashboard()?))
}
