//! API routes for booking-server

pub mod availability;
pub mod bookings;
pub mod health;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::actor_auth_middleware;
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, ServiceError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Marketplace browsing (no auth)
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/offers/{id}/slots", get(availability::get_slots))
        .route("/api/offers/{id}/fee", get(availability::get_fee));

    // Booking lifecycle (actor JWT)
    let authed = Router::new()
        .route("/api/bookings", post(bookings::create).get(bookings::list))
        .route("/api/bookings/{id}", get(bookings::get))
        .route("/api/bookings/{id}/confirm", post(bookings::confirm))
        .route("/api/bookings/{id}/check-in", post(bookings::check_in))
        .route("/api/bookings/{id}/complete", post(bookings::complete))
        .route("/api/bookings/{id}/cancel", post(bookings::cancel))
        .route("/api/bookings/{id}/reschedule", post(bookings::reschedule))
        .route("/api/bookings/{id}/no-show", post(bookings::no_show))
        .route("/api/sweeper/status", get(health::sweeper_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            actor_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
