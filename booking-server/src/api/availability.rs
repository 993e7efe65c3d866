//! Availability endpoints: slot grid and fee quote for an offer

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Offer, Service};
use shared::{AppError, ErrorCode};

use super::ApiResult;
use crate::db;
use crate::engine::slots::{self, DaySchedule, Slot, MILLIS_PER_MINUTE};
use crate::engine::fees;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// GET /api/offers/:id/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    /// Store-local calendar date, "YYYY-MM-DD"
    pub date: String,
    pub staff_id: Option<i64>,
    pub branch_id: Option<i64>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub offer_id: i64,
    pub service_id: i64,
    pub date: String,
    pub slots: Vec<Slot>,
}

/// Load an offer and its service, enforcing the offer is still bookable.
async fn load_bookable_offer(
    state: &AppState,
    offer_id: i64,
    now: i64,
) -> ServiceResult<(Offer, Service)> {
    let offer = db::offers::find_by_id(&state.pool, offer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OfferNotFound))?;
    if now >= offer.expires_at {
        return Err(ServiceError::app(ErrorCode::OfferExpired));
    }
    if !offer.is_bookable(now) {
        return Err(ServiceError::app(ErrorCode::OfferNotActive));
    }
    let service = db::services::find_by_id(&state.pool, offer.service_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::new(ErrorCode::ServiceNotFound))?;
    Ok((offer, service))
}

pub async fn get_slots(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
    Query(query): Query<SlotsQuery>,
) -> ApiResult<SlotsResponse> {
    let now = state.now();
    let (offer, service) = load_bookable_offer(&state, offer_id, now).await?;

    let store = db::stores::find_store(&state.pool, service.store_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;
    let branch = match query.branch_id.or(service.branch_id) {
        Some(branch_id) => db::stores::find_branch(&state.pool, branch_id)
            .await?
            .filter(|b| b.active && b.store_id == store.id)
            .map(Some)
            .ok_or_else(|| AppError::new(ErrorCode::BranchNotFound))?,
        None => None,
    };
    let schedule = DaySchedule::resolve(&store, branch.as_ref());

    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d").map_err(|_| {
        AppError::with_message(ErrorCode::InvalidFormat, "date must be \"YYYY-MM-DD\"")
    })?;
    let day_start = slots::local_midnight_millis(date, schedule.utc_offset_minutes);
    let day_end = day_start + 24 * 60 * MILLIS_PER_MINUTE;
    if day_end <= now {
        return Err(ServiceError::app(ErrorCode::DateInPast));
    }

    let staff_scope = query.staff_id.filter(|_| service.requires_exclusive_staff);
    let counts: HashMap<i64, i64> =
        db::bookings::slot_counts(&state.pool, service.id, day_start, day_end, staff_scope)
            .await?
            .into_iter()
            .map(|c| (c.start_time, c.count))
            .collect();

    // A closed day lists as empty; only the point query in create rejects it
    let slot_list = slots::enumerate_slots(
        &schedule,
        &service,
        date,
        now,
        &counts,
        staff_scope.is_some(),
    )
    .unwrap_or_default();

    Ok(Json(SlotsResponse {
        offer_id: offer.id,
        service_id: service.id,
        date: query.date,
        slots: slot_list,
    }))
}

/// GET /api/offers/:id/fee
#[derive(Serialize)]
pub struct FeeResponse {
    pub offer_id: i64,
    pub service_id: i64,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub access_fee: Decimal,
    pub currency: String,
}

pub async fn get_fee(
    State(state): State<AppState>,
    Path(offer_id): Path<i64>,
) -> ApiResult<FeeResponse> {
    let now = state.now();
    let (offer, service) = load_bookable_offer(&state, offer_id, now).await?;

    Ok(Json(FeeResponse {
        offer_id: offer.id,
        service_id: service.id,
        price: service.price,
        discount_percent: offer.discount_percent,
        access_fee: fees::access_fee(service.price, offer.discount_percent),
        currency: service.currency,
    }))
}
