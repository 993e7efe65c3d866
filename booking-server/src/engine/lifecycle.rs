//! Booking lifecycle transitions.
//!
//! Every transition is a conditional update keyed on the expected current
//! status. When the update moves zero rows the booking is reloaded to
//! report either "not found" or "cannot do X in state Y" — the race loser
//! always gets an accurate answer.

use serde_json::json;
use shared::models::{
    Booking, BookingCancel, BookingReschedule, BookingStatus, PaymentStatus, Service,
};
use shared::{AppError, ErrorCode};

use crate::auth::ActorIdentity;
use crate::db;
use crate::engine::create::{capacity_lock_id, rejection_error};
use crate::engine::slots::{self, DaySchedule, MILLIS_PER_MINUTE};
use crate::error::{ServiceError, ServiceResult};
use crate::external::notify;
use crate::state::AppState;

/// Last instant a customer may still cancel a booking of this service.
pub(crate) fn cancellation_deadline(start_time: i64, service: &Service) -> i64 {
    start_time - service.min_cancellation_hours as i64 * 60 * MILLIS_PER_MINUTE
}

/// Inclusive check-in bounds around the booked start.
///
/// Opens `early_checkin_minutes` before start when the service allows it
/// (at start otherwise), closes `grace_period_minutes` after start.
pub(crate) fn check_in_window(start_time: i64, service: &Service) -> (i64, i64) {
    let earliest = if service.allow_early_checkin {
        start_time - service.early_checkin_minutes as i64 * MILLIS_PER_MINUTE
    } else {
        start_time
    };
    let latest = start_time + service.grace_period_minutes as i64 * MILLIS_PER_MINUTE;
    (earliest, latest)
}

/// Only bookings that are neither settled nor mid-service may move.
pub(crate) fn reschedulable(status: BookingStatus) -> bool {
    !status.is_terminal() && status != BookingStatus::CheckedIn
}

/// Load a booking and enforce the actor guard: customers may only act on
/// their own bookings, operators on any.
async fn load_guarded(
    state: &AppState,
    actor: &ActorIdentity,
    id: i64,
) -> ServiceResult<Booking> {
    let booking = db::bookings::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
    if !actor.role.is_operator() && booking.user_id != actor.actor_id {
        return Err(ServiceError::app(ErrorCode::NotResourceOwner));
    }
    Ok(booking)
}

/// Reload after a zero-row conditional update and explain the refusal.
async fn explain_refusal(
    state: &AppState,
    id: i64,
    attempted: &str,
) -> ServiceError {
    match db::bookings::find_by_id(&state.pool, id).await {
        Ok(Some(b)) => ServiceError::App(AppError::invalid_state(b.status.as_str(), attempted)),
        Ok(None) => ServiceError::app(ErrorCode::BookingNotFound),
        Err(e) => e,
    }
}

async fn reload(state: &AppState, id: i64) -> ServiceResult<Booking> {
    db::bookings::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ServiceError::app(ErrorCode::BookingNotFound))
}

/// PENDING -> CONFIRMED. Normally driven by payment settlement right after
/// create; exposed for operators resolving stuck bookings.
pub async fn confirm(state: &AppState, actor: &ActorIdentity, id: i64) -> ServiceResult<Booking> {
    let booking = load_guarded(state, actor, id).await?;
    let now = state.now();

    if db::bookings::mark_confirmed(&state.pool, id, now).await? == 0 {
        return Err(explain_refusal(state, id, "confirm").await);
    }

    tracing::info!(booking_id = id, "Booking confirmed");
    notify(state, &booking, "booking.confirmed", json!(null));
    reload(state, id).await
}

/// CONFIRMED -> CHECKED_IN.
///
/// The check-in window opens `early_checkin_minutes` before start when the
/// service allows early check-in (at start otherwise) and closes
/// `grace_period_minutes` after start. The actual service end is pinned at
/// check-in time plus the service duration.
pub async fn check_in(state: &AppState, actor: &ActorIdentity, id: i64) -> ServiceResult<Booking> {
    let booking = load_guarded(state, actor, id).await?;
    let now = state.now();

    let service = db::services::find_by_id(&state.pool, booking.service_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ServiceNotFound))?;

    let (earliest, latest) = check_in_window(booking.start_time, &service);
    if now < earliest {
        return Err(ServiceError::App(
            AppError::invalid_request("Too early to check in")
                .with_detail("earliest_checkin", earliest),
        ));
    }
    if now > latest {
        return Err(ServiceError::App(
            AppError::invalid_request("Check-in window has closed")
                .with_detail("latest_checkin", latest),
        ));
    }

    let service_end_time = now + service.duration_minutes as i64 * MILLIS_PER_MINUTE;
    if db::bookings::mark_checked_in(&state.pool, id, now, service_end_time).await? == 0 {
        return Err(explain_refusal(state, id, "check in").await);
    }

    tracing::info!(booking_id = id, service_end_time, "Booking checked in");
    reload(state, id).await
}

/// CHECKED_IN -> COMPLETED, by an operator.
pub async fn complete(state: &AppState, actor: &ActorIdentity, id: i64) -> ServiceResult<Booking> {
    if !actor.role.is_operator() {
        return Err(ServiceError::app(ErrorCode::PermissionDenied));
    }
    let booking = load_guarded(state, actor, id).await?;
    let now = state.now();

    let actual_minutes = booking
        .service_started_at
        .map(|started| (now - started) / MILLIS_PER_MINUTE);
    let details = json!({
        "completed_by": actor.actor_id,
        "actual_duration_minutes": actual_minutes,
    });
    if db::bookings::mark_completed(&state.pool, id, now, false, &details).await? == 0 {
        return Err(explain_refusal(state, id, "complete").await);
    }

    tracing::info!(booking_id = id, "Booking completed");
    notify(state, &booking, "booking.completed", json!(null));
    reload(state, id).await
}

/// PENDING|CONFIRMED -> CANCELLED.
///
/// Customers are held to the service's cancellation window; operators may
/// cancel at any time. A paid access fee is refunded on an in-window
/// cancellation.
pub async fn cancel(
    state: &AppState,
    actor: &ActorIdentity,
    id: i64,
    req: BookingCancel,
) -> ServiceResult<Booking> {
    let booking = load_guarded(state, actor, id).await?;
    let now = state.now();

    if !actor.role.is_operator() {
        let service = db::services::find_by_id(&state.pool, booking.service_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ServiceNotFound))?;
        let deadline = cancellation_deadline(booking.start_time, &service);
        if now > deadline {
            return Err(ServiceError::App(
                AppError::new(ErrorCode::CancellationWindowClosed)
                    .with_detail("cancellation_deadline", deadline),
            ));
        }
    }

    if db::bookings::mark_cancelled(&state.pool, id, now, req.reason.as_deref()).await? == 0 {
        return Err(explain_refusal(state, id, "cancel").await);
    }

    if booking.payment_status == PaymentStatus::Paid {
        db::payments::mark_refunded(&state.pool, id, now).await?;
    }

    tracing::info!(booking_id = id, reason = ?req.reason, "Booking cancelled");
    notify(state, &booking, "booking.cancelled", json!({ "reason": req.reason }));
    reload(state, id).await
}

/// Move a PENDING or CONFIRMED booking to a new slot.
///
/// The new slot goes through the same capacity transaction as create; from
/// here on all time-based decisions key off the new start.
pub async fn reschedule(
    state: &AppState,
    actor: &ActorIdentity,
    id: i64,
    req: BookingReschedule,
) -> ServiceResult<Booking> {
    let booking = load_guarded(state, actor, id).await?;
    if !reschedulable(booking.status) {
        return Err(ServiceError::App(AppError::invalid_state(
            booking.status.as_str(),
            "reschedule",
        )));
    }
    let now = state.now();

    let service = db::services::find_by_id(&state.pool, booking.service_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::new(ErrorCode::ServiceNotFound))?;
    let store = db::stores::find_store(&state.pool, booking.store_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;
    let branch = match booking.branch_id {
        Some(branch_id) => db::stores::find_branch(&state.pool, branch_id).await?,
        None => None,
    };

    let schedule = DaySchedule::resolve(&store, branch.as_ref());
    let new_start = slots::parse_local_start(&req.new_start_time, schedule.utc_offset_minutes)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::InvalidFormat, "new_start_time must be \"YYYY-MM-DD HH:MM\"")
        })?;
    if new_start <= now {
        return Err(ServiceError::app(ErrorCode::DateInPast));
    }
    let new_end = new_start + service.duration_minutes as i64 * MILLIS_PER_MINUTE;
    let staff_scope = booking.staff_id.filter(|_| service.requires_exclusive_staff);

    let mut tx = state.pool.begin().await.map_err(ServiceError::from)?;
    // Same capacity serializer as create
    if !db::services::lock_row(&mut tx, capacity_lock_id(&service)).await? {
        return Err(ServiceError::app(ErrorCode::ServiceNotFound));
    }

    // The booking's own row must not count against the slot it may
    // already occupy, or a same-slot reschedule on a capacity-1 service
    // refuses itself.
    let count =
        db::bookings::count_active(&mut *tx, service.id, new_start, staff_scope, Some(id)).await?;
    let check = slots::evaluate_slot(
        &schedule,
        &service,
        new_start,
        now,
        count,
        staff_scope.is_some(),
    );
    if let Some(rejection) = check.rejection {
        return Err(ServiceError::App(rejection_error(
            rejection,
            check.remaining_slots,
            &service,
            now,
        )));
    }

    if db::bookings::reschedule(&mut tx, id, new_start, new_end, now).await? == 0 {
        drop(tx);
        return Err(explain_refusal(state, id, "reschedule").await);
    }
    tx.commit().await.map_err(ServiceError::from)?;

    tracing::info!(booking_id = id, new_start, "Booking rescheduled");
    notify(
        state,
        &booking,
        "booking.rescheduled",
        json!({ "new_start_time": new_start, "reason": req.reason }),
    );
    reload(state, id).await
}

/// Operator override: CONFIRMED (never checked in) -> NO_SHOW.
pub async fn mark_no_show(
    state: &AppState,
    actor: &ActorIdentity,
    id: i64,
    reason: Option<String>,
) -> ServiceResult<Booking> {
    if !actor.role.is_operator() {
        return Err(ServiceError::app(ErrorCode::PermissionDenied));
    }
    let booking = load_guarded(state, actor, id).await?;
    let now = state.now();

    let reason = reason.unwrap_or_else(|| "marked by operator".into());
    let details = json!({
        "marked_by": actor.actor_id,
        "auto_processed": false,
    });
    if db::bookings::mark_no_show(&state.pool, id, now, &reason, &details).await? == 0 {
        return Err(explain_refusal(state, id, "mark no-show").await);
    }

    tracing::info!(booking_id = id, %reason, "Booking marked as no-show");
    notify(state, &booking, "booking.no_show", json!({ "reason": reason }));
    reload(state, id).await
}

/// Fire-and-forget notification to the booking's customer and the store's
/// merchant.
pub(crate) fn notify(
    state: &AppState,
    booking: &Booking,
    event: &'static str,
    details: serde_json::Value,
) {
    let state = state.clone();
    let (booking_id, user_id, store_id) = (booking.id, booking.user_id, booking.store_id);
    tokio::spawn(async move {
        let merchant_id = match db::stores::find_store(&state.pool, store_id).await {
            Ok(store) => store.map(|s| s.merchant_id),
            Err(e) => {
                tracing::warn!(booking_id, error = %e, "Store lookup for notification failed");
                None
            }
        };
        for ev in notify::fanout(event, booking_id, user_id, merchant_id, details) {
            state.notifier.send(ev).await;
        }
    });
}

/// Best-effort hooks after a booking commits: attach the entry artifact
/// and tell the customer. Neither can fail the booking.
pub fn spawn_post_commit_hooks(state: AppState, booking: Booking) {
    tokio::spawn(async move {
        match state.artifacts.generate(booking.id, booking.user_id).await {
            Ok(artifact_ref) => {
                match db::bookings::set_artifact_ref(&state.pool, booking.id, &artifact_ref, state.now())
                    .await
                {
                    Ok(0) => tracing::debug!(booking_id = booking.id, "Artifact ref already attached"),
                    Ok(_) => tracing::debug!(booking_id = booking.id, "Artifact ref attached"),
                    Err(e) => {
                        tracing::warn!(booking_id = booking.id, error = %e, "Failed to store artifact ref")
                    }
                }
            }
            Err(e) => {
                tracing::warn!(booking_id = booking.id, error = %e, "Artifact generation failed")
            }
        }

        notify(
            &state,
            &booking,
            "booking.created",
            json!({
                "start_time": booking.start_time,
                "access_fee": booking.access_fee.to_string(),
            }),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const HOUR: i64 = 60 * MILLIS_PER_MINUTE;

    fn service() -> Service {
        Service {
            id: 1,
            store_id: 1,
            branch_id: None,
            name: "Hot stone massage".into(),
            price: Decimal::new(8000, 2),
            currency: "USD".into(),
            duration_minutes: 25,
            buffer_minutes: 5,
            grace_period_minutes: 10,
            min_advance_minutes: 60,
            max_advance_minutes: 43200,
            max_concurrent_bookings: 3,
            requires_exclusive_staff: false,
            auto_complete_on_duration: false,
            allow_early_checkin: true,
            early_checkin_minutes: 15,
            min_cancellation_hours: 2,
            online_booking_enabled: true,
            active: true,
        }
    }

    #[test]
    fn cancellation_closes_at_the_deadline() {
        let svc = service();
        let start = 1_750_000_000_000_i64;
        let deadline = cancellation_deadline(start, &svc);
        assert_eq!(deadline, start - 2 * HOUR);

        // 2.5 hours out: still inside the window
        assert!(start - 5 * HOUR / 2 <= deadline);
        // 1.5 hours out: too late
        assert!(start - 3 * HOUR / 2 > deadline);
    }

    #[test]
    fn check_in_window_spans_early_checkin_to_grace() {
        let mut svc = service();
        let start = 1_750_000_000_000_i64;

        let (earliest, latest) = check_in_window(start, &svc);
        assert_eq!(earliest, start - 15 * MILLIS_PER_MINUTE);
        assert_eq!(latest, start + 10 * MILLIS_PER_MINUTE);

        svc.allow_early_checkin = false;
        let (earliest, _) = check_in_window(start, &svc);
        assert_eq!(earliest, start);
    }

    #[test]
    fn settled_or_in_service_bookings_cannot_move() {
        assert!(reschedulable(BookingStatus::Pending));
        assert!(reschedulable(BookingStatus::Confirmed));
        assert!(!reschedulable(BookingStatus::CheckedIn));
        assert!(!reschedulable(BookingStatus::Completed));
        assert!(!reschedulable(BookingStatus::Cancelled));
        assert!(!reschedulable(BookingStatus::NoShow));
        assert!(!reschedulable(BookingStatus::Expired));
    }
}
