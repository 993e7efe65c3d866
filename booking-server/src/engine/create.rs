//! Booking creation.
//!
//! One transaction covers the capacity check, the charge and the insert:
//! the service row is locked first, so two requests for the last slot
//! serialize and the loser sees a full slot. The payment call
//! happens while the lock is held; its hard timeout bounds how long the
//! lock can live, and any charge failure rolls the whole booking back.

use rust_decimal::Decimal;
use shared::models::{
    Booking, BookingCreate, BookingCreated, BookingKind, BookingStatus, Offer, Payment,
    PaymentStatus, Service,
};
use shared::{util, AppError, ErrorCode};

use crate::auth::ActorIdentity;
use crate::db;
use crate::engine::slots::{self, DaySchedule, SlotRejection, MILLIS_PER_MINUTE};
use crate::engine::{fees, lifecycle};
use crate::error::{ServiceError, ServiceResult};
use crate::external::payment::ChargeError;
use crate::state::AppState;

/// Map a slot rejection to the wire error.
pub(crate) fn rejection_error(
    rejection: SlotRejection,
    remaining: i32,
    service: &Service,
    now: i64,
) -> AppError {
    match rejection {
        SlotRejection::NonWorkingDay => {
            AppError::with_message(ErrorCode::NonWorkingDay, "The store is closed on that day")
        }
        SlotRejection::OutsideHours => AppError::slot_unavailable("outside opening hours"),
        SlotRejection::OutsideWindow => AppError::with_message(
            ErrorCode::OutsideBookingWindow,
            format!(
                "Bookings must start between {} and {} minutes from now",
                service.min_advance_minutes, service.max_advance_minutes
            ),
        )
        .with_detail("min_advance_minutes", service.min_advance_minutes)
        .with_detail("max_advance_minutes", service.max_advance_minutes)
        .with_detail(
            "earliest_start",
            now + service.min_advance_minutes as i64 * MILLIS_PER_MINUTE,
        )
        .with_detail(
            "latest_start",
            now + service.max_advance_minutes as i64 * MILLIS_PER_MINUTE,
        ),
        SlotRejection::Full => {
            AppError::slot_unavailable("slot is fully booked").with_detail("remaining_slots", remaining)
        }
    }
}

/// The row every booking path locks to serialize capacity counting.
///
/// Capacity is counted per service, so the lock must be the service row:
/// creates through two different offers of one service, or an offer
/// booking racing a plain service booking, all contend on the same row.
pub(crate) fn capacity_lock_id(service: &Service) -> i64 {
    service.id
}

struct ResolvedTarget {
    offer: Option<Offer>,
    service: Service,
}

/// Resolve and validate the offer/service the request points at.
async fn resolve_target(
    state: &AppState,
    req: &BookingCreate,
    now: i64,
) -> ServiceResult<ResolvedTarget> {
    let (offer, service_id) = match req.kind {
        BookingKind::OfferRedemption => {
            let offer_id = req.offer_id.ok_or_else(|| {
                AppError::with_message(ErrorCode::InvalidBookingKind, "offer_id is required for offer redemptions")
            })?;
            let offer = db::offers::find_by_id(&state.pool, offer_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::OfferNotFound))?;
            if now >= offer.expires_at {
                return Err(ServiceError::app(ErrorCode::OfferExpired));
            }
            if !offer.is_bookable(now) {
                return Err(ServiceError::app(ErrorCode::OfferNotActive));
            }
            let service_id = offer.service_id;
            (Some(offer), service_id)
        }
        BookingKind::ServiceOnly => {
            let service_id = req.service_id.ok_or_else(|| {
                AppError::with_message(ErrorCode::InvalidBookingKind, "service_id is required for service bookings")
            })?;
            (None, service_id)
        }
    };

    let service = db::services::find_by_id(&state.pool, service_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::new(ErrorCode::ServiceNotFound))?;
    if !service.online_booking_enabled {
        return Err(ServiceError::app(ErrorCode::OnlineBookingDisabled));
    }

    Ok(ResolvedTarget { offer, service })
}

/// Create a booking end to end. Returns the committed booking plus the
/// slot's remaining capacity after this booking took its place.
pub async fn create_booking(
    state: &AppState,
    actor: &ActorIdentity,
    req: BookingCreate,
) -> ServiceResult<BookingCreated> {
    let now = state.now();

    let ResolvedTarget { offer, service } = resolve_target(state, &req, now).await?;

    let user = db::users::find_by_id(&state.pool, actor.actor_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !user.active {
        return Err(ServiceError::app(ErrorCode::UserInactive));
    }

    let store = db::stores::find_store(&state.pool, service.store_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;

    let branch = match req.branch_id.or(service.branch_id) {
        Some(branch_id) => {
            let branch = db::stores::find_branch(&state.pool, branch_id)
                .await?
                .filter(|b| b.active && b.store_id == store.id)
                .ok_or_else(|| AppError::new(ErrorCode::BranchNotFound))?;
            Some(branch)
        }
        None => None,
    };

    if let Some(staff_id) = req.staff_id {
        let member = db::staff::find_by_id(&state.pool, staff_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::StaffNotFound))?;
        if !member.active {
            return Err(ServiceError::app(ErrorCode::StaffInactive));
        }
        let at_branch = member.store_id == store.id
            && match (member.branch_id, branch.as_ref()) {
                (Some(mb), Some(b)) => mb == b.id,
                (None, _) | (_, None) => member.store_id == store.id,
            };
        if !at_branch {
            return Err(ServiceError::app(ErrorCode::StaffNotAtBranch));
        }
    }

    let schedule = DaySchedule::resolve(&store, branch.as_ref());
    let start_time = slots::parse_local_start(&req.start_time, schedule.utc_offset_minutes)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::InvalidFormat, "start_time must be \"YYYY-MM-DD HH:MM\"")
        })?;
    if start_time <= now {
        return Err(ServiceError::app(ErrorCode::DateInPast));
    }

    let end_time = start_time + service.duration_minutes as i64 * MILLIS_PER_MINUTE;
    let staff_scope = req.staff_id.filter(|_| service.requires_exclusive_staff);

    // Fee before the transaction: pure math, no lock needed
    let (access_fee, fee_required) = match req.kind {
        BookingKind::OfferRedemption => {
            let offer_ref = offer.as_ref().ok_or_else(|| {
                ServiceError::app_msg(ErrorCode::InternalError, "offer redemption without offer")
            })?;
            (fees::access_fee(service.price, offer_ref.discount_percent), true)
        }
        BookingKind::ServiceOnly => (Decimal::ZERO, false),
    };

    if fee_required && req.payment.is_none() {
        return Err(ServiceError::App(
            AppError::with_message(ErrorCode::RequiredField, "payment is required for offer redemptions")
                .with_detail("field", "payment"),
        ));
    }

    let mut tx = state.pool.begin().await.map_err(ServiceError::from)?;

    // Serialize capacity counting on the service row
    if !db::services::lock_row(&mut tx, capacity_lock_id(&service)).await? {
        return Err(ServiceError::app(ErrorCode::ServiceNotFound));
    }

    let count =
        db::bookings::count_active(&mut *tx, service.id, start_time, staff_scope, None).await?;
    let check = slots::evaluate_slot(
        &schedule,
        &service,
        start_time,
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

    let booking_id = util::snowflake_id();
    let booking = Booking {
        id: booking_id,
        kind: req.kind,
        offer_id: offer.as_ref().map(|o| o.id),
        service_id: service.id,
        user_id: user.id,
        store_id: store.id,
        branch_id: branch.as_ref().map(|b| b.id),
        staff_id: req.staff_id,
        payment_id: None,
        start_time,
        end_time,
        status: BookingStatus::Pending,
        payment_status: if fee_required {
            PaymentStatus::Pending
        } else {
            PaymentStatus::NotRequired
        },
        access_fee,
        qr_artifact_ref: None,
        checked_in_at: None,
        service_started_at: None,
        service_end_time: None,
        completed_at: None,
        auto_completed: false,
        completion_method: None,
        completion_details: None,
        no_show_marked_at: None,
        no_show_reason: None,
        no_show_details: None,
        expired_at: None,
        expiry_reason: None,
        expiry_details: None,
        cancelled_at: None,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    };
    db::bookings::insert(&mut tx, &booking).await?;

    // Charge while the slot lock is held; the gateway timeout bounds the
    // transaction's lifetime. Any failure drops the transaction whole.
    let mut committed = booking;
    if fee_required {
        let payment_payload = req.payment.as_ref().ok_or_else(|| {
            ServiceError::app_msg(ErrorCode::InternalError, "payment payload vanished")
        })?;
        let outcome = state
            .payments
            .charge(
                booking_id,
                access_fee,
                &service.currency,
                &payment_payload.method,
                &payment_payload.reference,
            )
            .await
            .map_err(|e| match e {
                ChargeError::Declined(reason) => AppError::payment_failed(reason),
                ChargeError::Unreachable(reason) => {
                    tracing::warn!(booking_id, %reason, "Payment gateway unreachable");
                    AppError::payment_failed("payment gateway did not respond")
                }
            })?;

        let payment = Payment {
            id: util::snowflake_id(),
            booking_id,
            amount: access_fee,
            currency: service.currency.clone(),
            method: payment_payload.method.clone(),
            status: PaymentStatus::Paid,
            transaction_id: Some(outcome.transaction_id),
            created_at: now,
        };
        db::payments::insert(&mut tx, &payment).await?;
        db::bookings::set_payment(&mut tx, booking_id, payment.id, PaymentStatus::Paid, now)
            .await?;
        committed.payment_id = Some(payment.id);
        committed.payment_status = PaymentStatus::Paid;
    }

    tx.commit().await.map_err(ServiceError::from)?;

    let remaining_slots = (check.remaining_slots - 1).max(0);
    tracing::info!(
        booking_id,
        user_id = user.id,
        service_id = service.id,
        start_time,
        kind = ?req.kind,
        remaining_slots,
        "Booking created"
    );

    // Payment settled (or none needed): promote PENDING to CONFIRMED
    if db::bookings::mark_confirmed(&state.pool, booking_id, state.now()).await? > 0 {
        committed.status = BookingStatus::Confirmed;
    }

    lifecycle::spawn_post_commit_hooks(state.clone(), committed.clone());

    Ok(BookingCreated {
        booking: committed,
        remaining_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn service(id: i64) -> Service {
        Service {
            id,
            store_id: 1,
            branch_id: None,
            name: "Deep tissue massage".into(),
            price: Decimal::new(8000, 2),
            currency: "USD".into(),
            duration_minutes: 25,
            buffer_minutes: 5,
            grace_period_minutes: 10,
            min_advance_minutes: 60,
            max_advance_minutes: 43200,
            max_concurrent_bookings: 3,
            requires_exclusive_staff: true,
            auto_complete_on_duration: false,
            allow_early_checkin: true,
            early_checkin_minutes: 15,
            min_cancellation_hours: 24,
            online_booking_enabled: true,
            active: true,
        }
    }

    #[test]
    fn capacity_lock_is_the_service_row_for_every_booking_path() {
        // Two offers of the same service, and a plain service booking,
        // must all contend on one row or capacity counting races.
        let svc = service(7);
        assert_eq!(capacity_lock_id(&svc), 7);
        // Nothing about the offer feeds the lock target.
        assert_eq!(capacity_lock_id(&service(7)), capacity_lock_id(&svc));
    }

    #[test]
    fn outside_window_error_names_the_legal_bounds() {
        let svc = service(1);
        let now = 1_750_000_000_000_i64;
        let err = rejection_error(SlotRejection::OutsideWindow, 3, &svc, now);
        assert_eq!(err.code, ErrorCode::OutsideBookingWindow);
        assert!(err.message.contains("60"));
        assert!(err.message.contains("43200"));
        let details = err.details.as_ref().unwrap();
        assert_eq!(details["min_advance_minutes"], 60);
        assert_eq!(details["max_advance_minutes"], 43200);
        assert_eq!(
            details["earliest_start"],
            now + 60 * MILLIS_PER_MINUTE
        );
        assert_eq!(
            details["latest_start"],
            now + 43200 * MILLIS_PER_MINUTE
        );
    }
}
