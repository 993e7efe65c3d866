//! Booking repository
//!
//! Every lifecycle transition is a conditional update guarded by the
//! booking's expected current status. `rows_affected() == 0` means the
//! booking was missing or in another state; callers reload the row to
//! report which.

use serde_json::Value;
use shared::models::{Booking, BookingStatus, PaymentStatus};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ServiceResult;

const COLUMNS: &str = "id, kind, offer_id, service_id, user_id, store_id, branch_id, staff_id, payment_id, start_time, end_time, status, payment_status, access_fee, qr_artifact_ref, checked_in_at, service_started_at, service_end_time, completed_at, auto_completed, completion_method, completion_details, no_show_marked_at, no_show_reason, no_show_details, expired_at, expiry_reason, expiry_details, cancelled_at, cancellation_reason, created_at, updated_at";

/// Statuses that hold a slot. Everything else releases capacity.
const LIVE_STATUSES: &str = "('PENDING', 'CONFIRMED', 'CHECKED_IN', 'COMPLETED')";

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Booking>> {
    let booking =
        sqlx::query_as::<_, Booking>(&format!("SELECT {COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(booking)
}

pub async fn insert(tx: &mut Transaction<'_, Postgres>, b: &Booking) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO bookings (id, kind, offer_id, service_id, user_id, store_id, branch_id, staff_id, payment_id, start_time, end_time, status, payment_status, access_fee, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)",
    )
    .bind(b.id)
    .bind(b.kind)
    .bind(b.offer_id)
    .bind(b.service_id)
    .bind(b.user_id)
    .bind(b.store_id)
    .bind(b.branch_id)
    .bind(b.staff_id)
    .bind(b.payment_id)
    .bind(b.start_time)
    .bind(b.end_time)
    .bind(b.status)
    .bind(b.payment_status)
    .bind(b.access_fee)
    .bind(b.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn count_active_sql() -> String {
    format!(
        "SELECT COUNT(*) FROM bookings \
         WHERE service_id = $1 AND start_time = $2 \
           AND ($3::BIGINT IS NULL OR staff_id = $3) \
           AND ($4::BIGINT IS NULL OR id <> $4) \
           AND status IN {LIVE_STATUSES}"
    )
}

/// Count live bookings holding the given slot.
///
/// With a staff scope only that staff member's bookings compete; otherwise
/// the count is service-wide. `exclude_booking` keeps a booking's own hold
/// out of the count when it is being moved.
pub async fn count_active<'e, E>(
    executor: E,
    service_id: i64,
    start_time: i64,
    staff_scope: Option<i64>,
    exclude_booking: Option<i64>,
) -> ServiceResult<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(&count_active_sql())
        .bind(service_id)
        .bind(start_time)
        .bind(staff_scope)
        .bind(exclude_booking)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Per-slot live booking counts within a time range, for day availability.
#[derive(Debug, sqlx::FromRow)]
pub struct SlotCount {
    pub start_time: i64,
    pub count: i64,
}

pub async fn slot_counts(
    pool: &PgPool,
    service_id: i64,
    from: i64,
    to: i64,
    staff_scope: Option<i64>,
) -> ServiceResult<Vec<SlotCount>> {
    let counts = match staff_scope {
        Some(staff_id) => {
            sqlx::query_as::<_, SlotCount>(&format!(
                "SELECT start_time, COUNT(*) AS count FROM bookings WHERE service_id = $1 AND start_time >= $2 AND start_time < $3 AND staff_id = $4 AND status IN {LIVE_STATUSES} GROUP BY start_time"
            ))
            .bind(service_id)
            .bind(from)
            .bind(to)
            .bind(staff_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SlotCount>(&format!(
                "SELECT start_time, COUNT(*) AS count FROM bookings WHERE service_id = $1 AND start_time >= $2 AND start_time < $3 AND status IN {LIVE_STATUSES} GROUP BY start_time"
            ))
            .bind(service_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(counts)
}

/// Listing filter for booking queries.
#[derive(Debug, Default, Clone)]
pub struct BookingListFilter {
    pub user_id: Option<i64>,
    pub store_id: Option<i64>,
    pub status: Option<BookingStatus>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list(pool: &PgPool, filter: &BookingListFilter) -> ServiceResult<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {COLUMNS} FROM bookings \
         WHERE ($1::BIGINT IS NULL OR user_id = $1) \
           AND ($2::BIGINT IS NULL OR store_id = $2) \
           AND ($3::TEXT IS NULL OR status = $3) \
         ORDER BY created_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(filter.user_id)
    .bind(filter.store_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;
    Ok(bookings)
}

pub async fn set_payment(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: i64,
    payment_id: i64,
    payment_status: PaymentStatus,
    now: i64,
) -> ServiceResult<()> {
    sqlx::query("UPDATE bookings SET payment_id = $1, payment_status = $2, updated_at = $3 WHERE id = $4")
        .bind(payment_id)
        .bind(payment_status)
        .bind(now)
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Best-effort post-commit attachment of the entry artifact reference.
pub async fn set_artifact_ref(
    pool: &PgPool,
    id: i64,
    artifact_ref: &str,
    now: i64,
) -> ServiceResult<u64> {
    let rows = sqlx::query(
        "UPDATE bookings SET qr_artifact_ref = $1, updated_at = $2 WHERE id = $3 AND qr_artifact_ref IS NULL",
    )
    .bind(artifact_ref)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

// --- lifecycle conditional updates ---

pub async fn mark_confirmed(pool: &PgPool, id: i64, now: i64) -> ServiceResult<u64> {
    let rows = sqlx::query(
        "UPDATE bookings SET status = 'CONFIRMED', updated_at = $1 WHERE id = $2 AND status = 'PENDING'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn mark_checked_in(
    pool: &PgPool,
    id: i64,
    now: i64,
    service_end_time: i64,
) -> ServiceResult<u64> {
    let rows = sqlx::query(
        "UPDATE bookings SET status = 'CHECKED_IN', checked_in_at = $1, service_started_at = $1, service_end_time = $2, updated_at = $1 WHERE id = $3 AND status = 'CONFIRMED'",
    )
    .bind(now)
    .bind(service_end_time)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn mark_completed(
    pool: &PgPool,
    id: i64,
    now: i64,
    auto: bool,
    details: &Value,
) -> ServiceResult<u64> {
    let method = if auto { "AUTOMATIC" } else { "MANUAL" };
    let rows = sqlx::query(
        "UPDATE bookings SET status = 'COMPLETED', completed_at = $1, auto_completed = $2, completion_method = $3, completion_details = $4, updated_at = $1 WHERE id = $5 AND status = 'CHECKED_IN'",
    )
    .bind(now)
    .bind(auto)
    .bind(method)
    .bind(details)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

/// Every non-terminal status may move to CANCELLED.
const CANCELLABLE_STATUSES: &str = "('PENDING', 'CONFIRMED', 'CHECKED_IN')";

pub async fn mark_cancelled(
    pool: &PgPool,
    id: i64,
    now: i64,
    reason: Option<&str>,
) -> ServiceResult<u64> {
    let rows = sqlx::query(&format!(
        "UPDATE bookings SET status = 'CANCELLED', cancelled_at = $1, cancellation_reason = $2, updated_at = $1 WHERE id = $3 AND status IN {CANCELLABLE_STATUSES}",
    ))
    .bind(now)
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn mark_no_show(
    pool: &PgPool,
    id: i64,
    now: i64,
    reason: &str,
    details: &Value,
) -> ServiceResult<u64> {
    let rows = sqlx::query(
        "UPDATE bookings SET status = 'NO_SHOW', no_show_marked_at = $1, no_show_reason = $2, no_show_details = $3, updated_at = $1 WHERE id = $4 AND status = 'CONFIRMED' AND checked_in_at IS NULL",
    )
    .bind(now)
    .bind(reason)
    .bind(details)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

const EXPIRE_SQL: &str = "UPDATE bookings SET status = 'EXPIRED', expired_at = $1, expiry_reason = $2, expiry_details = $3, updated_at = $1 WHERE id = $4 AND status = 'PENDING'";

pub async fn mark_expired(
    pool: &PgPool,
    id: i64,
    now: i64,
    reason: &str,
    details: &Value,
) -> ServiceResult<u64> {
    let rows = sqlx::query(EXPIRE_SQL)
    .bind(now)
    .bind(reason)
    .bind(details)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn reschedule(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    new_start: i64,
    new_end: i64,
    now: i64,
) -> ServiceResult<u64> {
    let rows = sqlx::query(
        "UPDATE bookings SET start_time = $1, end_time = $2, updated_at = $3 WHERE id = $4 AND status IN ('PENDING', 'CONFIRMED')",
    )
    .bind(new_start)
    .bind(new_end)
    .bind(now)
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected())
}

// --- sweeper candidate scans ---

/// A booking joined with the service rules the sweeper needs to act on it.
#[derive(Debug, sqlx::FromRow)]
pub struct SweepCandidate {
    #[sqlx(flatten)]
    pub booking: Booking,
    pub grace_period_minutes: i32,
    pub duration_minutes: i32,
}

/// CONFIRMED bookings never checked in whose grace window has fully elapsed:
/// `now > start_time + (grace + duration) minutes`.
pub async fn no_show_candidates(pool: &PgPool, now: i64) -> ServiceResult<Vec<SweepCandidate>> {
    let rows = sqlx::query_as::<_, SweepCandidate>(
        "SELECT b.*, s.grace_period_minutes, s.duration_minutes FROM bookings b \
         JOIN services s ON s.id = b.service_id \
         WHERE b.status = 'CONFIRMED' AND b.checked_in_at IS NULL \
           AND $1 > b.start_time + (s.grace_period_minutes + s.duration_minutes)::BIGINT * 60000 \
         ORDER BY b.start_time LIMIT 500",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// CHECKED_IN bookings past their actual service end, where the service
/// opts in to automatic completion.
pub async fn auto_complete_candidates(
    pool: &PgPool,
    now: i64,
) -> ServiceResult<Vec<SweepCandidate>> {
    let rows = sqlx::query_as::<_, SweepCandidate>(
        "SELECT b.*, s.grace_period_minutes, s.duration_minutes FROM bookings b \
         JOIN services s ON s.id = b.service_id \
         WHERE b.status = 'CHECKED_IN' AND s.auto_complete_on_duration \
           AND b.service_end_time IS NOT NULL AND b.service_end_time <= $1 \
         ORDER BY b.service_end_time LIMIT 500",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// PENDING bookings whose start has passed by more than the grace period.
/// Payment never confirmed them; the sweeper releases the slot.
pub async fn expired_pending_candidates(
    pool: &PgPool,
    now: i64,
) -> ServiceResult<Vec<SweepCandidate>> {
    let rows = sqlx::query_as::<_, SweepCandidate>(
        "SELECT b.*, s.grace_period_minutes, s.duration_minutes FROM bookings b \
         JOIN services s ON s.id = b.service_id \
         WHERE b.status = 'PENDING' \
           AND $1 > b.start_time + s.grace_period_minutes::BIGINT * 60000 \
         ORDER BY b.start_time LIMIT 500",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellable_statuses_are_exactly_the_non_terminal_ones() {
        use BookingStatus::*;
        for status in [Pending, Confirmed, CheckedIn, Completed, Cancelled, NoShow, Expired] {
            let listed = CANCELLABLE_STATUSES.contains(&format!("'{}'", status.as_str()));
            assert_eq!(
                listed,
                !status.is_terminal(),
                "cancel predicate disagrees with terminality for {}",
                status.as_str()
            );
        }
    }

    #[test]
    fn capacity_count_filters_staff_scope_and_own_booking() {
        let sql = count_active_sql();
        assert!(sql.contains("($3::BIGINT IS NULL OR staff_id = $3)"));
        assert!(sql.contains("($4::BIGINT IS NULL OR id <> $4)"));
        assert!(sql.contains("status IN ('PENDING', 'CONFIRMED', 'CHECKED_IN', 'COMPLETED')"));
    }

    #[test]
    fn expiry_persists_an_audit_trail() {
        assert!(EXPIRE_SQL.contains("expired_at = $1"));
        assert!(EXPIRE_SQL.contains("expiry_reason = $2"));
        assert!(EXPIRE_SQL.contains("expiry_details = $3"));
        // Only an unconfirmed booking can expire
        assert!(EXPIRE_SQL.contains("AND status = 'PENDING'"));
    }
}
