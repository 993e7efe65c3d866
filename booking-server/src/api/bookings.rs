//! Booking endpoints: create, read and lifecycle transitions

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::models::{
    Booking, BookingCancel, BookingCreate, BookingCreated, BookingReschedule, BookingStatus,
    Payment,
};
use shared::{AppError, ErrorCode};

use super::ApiResult;
use crate::auth::ActorIdentity;
use crate::db;
use crate::engine::{create as create_engine, lifecycle};
use crate::error::ServiceError;
use crate::state::AppState;

/// POST /api/bookings
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Json(payload): Json<BookingCreate>,
) -> ApiResult<BookingCreated> {
    let created = create_engine::create_booking(&state, &identity, payload).await?;
    Ok(Json(created))
}

/// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<BookingStatus>,
    pub user_id: Option<i64>,
    pub store_id: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Vec<Booking>> {
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    // Customers only ever see their own bookings
    let user_id = if identity.role.is_operator() {
        query.user_id
    } else {
        Some(identity.actor_id)
    };

    let filter = db::bookings::BookingListFilter {
        user_id,
        store_id: query.store_id.filter(|_| identity.role.is_operator()),
        status: query.status,
        limit: per_page,
        offset: (page - 1) * per_page,
    };
    let bookings = db::bookings::list(&state.pool, &filter).await?;
    Ok(Json(bookings))
}

/// GET /api/bookings/:id
///
/// The detail view carries the booking's payment history alongside it.
#[derive(Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub payments: Vec<Payment>,
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<BookingDetail> {
    let booking = db::bookings::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !identity.role.is_operator() && booking.user_id != identity.actor_id {
        return Err(ServiceError::app(ErrorCode::NotResourceOwner));
    }
    let payments = db::payments::find_by_booking(&state.pool, id).await?;
    Ok(Json(BookingDetail { booking, payments }))
}

/// POST /api/bookings/:id/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    let booking = lifecycle::confirm(&state, &identity, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    let booking = lifecycle::check_in(&state, &identity, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    let booking = lifecycle::complete(&state, &identity, id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
    payload: Option<Json<BookingCancel>>,
) -> ApiResult<Booking> {
    let req = payload.map(|Json(p)| p).unwrap_or_default();
    let booking = lifecycle::cancel(&state, &identity, id, req).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/reschedule
pub async fn reschedule(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingReschedule>,
) -> ApiResult<Booking> {
    let booking = lifecycle::reschedule(&state, &identity, id, payload).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/no-show
pub async fn no_show(
    State(state): State<AppState>,
    Extension(identity): Extension<ActorIdentity>,
    Path(id): Path<i64>,
    payload: Option<Json<BookingCancel>>,
) -> ApiResult<Booking> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let booking = lifecycle::mark_no_show(&state, &identity, id, reason).await?;
    Ok(Json(booking))
}
