mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Residents
        .route("/residents", get(handlers::list_residents))
        .route("/residents", post(handlers::create_resident))
        .route("/residents/{id}", get(handlers::get_resident))
        .route("/residents/{id}", put(handlers::update_resident))
        .route("/residents/{id}", delete(handlers::delete_resident))
        .route("/residents/{id}/payments", get(handlers::list_resident_payments))
        .route("/residents/{id}/billing", get(handlers::get_billing_status))
        // Rooms
        .route("/rooms", get(handlers::list_rooms))
        .route("/rooms", post(handlers::create_room))
        .route("/rooms/{id}", get(handlers::get_room))
        .route("/rooms/{id}", put(handlers::update_room))
        .route("/rooms/{id}", delete(handlers::delete_room))
        // Assignments
        .route("/assignments", post(handlers::assign))
        .route("/assignments/transfer", post(handlers::transfer))
        .route("/assignments/{resident_id}", get(handlers::get_assignment))
        .route("/assignments/{resident_id}", delete(handlers::release))
        // Payments
        .route("/payments", post(handlers::record_payment))
        // Complaints
        .route("/complaints", get(handlers::list_complaints))
        .route("/complaints", post(handlers::create_complaint))
        .route("/complaints/{id}", get(handlers::get_complaint))
        .route("/complaints/{id}", put(handlers::update_complaint))
        .route("/complaints/{id}", delete(handlers::delete_complaint))
        // Dashboard
        .route("/dashboard", get(handlers::dashboard))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
