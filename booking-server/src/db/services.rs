//! Service repository

use shared::models::Service;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ServiceResult;

const COLUMNS: &str = "id, store_id, branch_id, name, price, currency, duration_minutes, buffer_minutes, grace_period_minutes, min_advance_minutes, max_advance_minutes, max_concurrent_bookings, requires_exclusive_staff, auto_complete_on_duration, allow_early_checkin, early_checkin_minutes, min_cancellation_hours, online_booking_enabled, active";

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Service>> {
    let service = sqlx::query_as::<_, Service>(&format!(
        "SELECT {COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(service)
}

/// Lock the service row for the duration of the transaction.
///
/// Postgres has no `COUNT ... FOR UPDATE`; locking the service row instead
/// serializes every concurrent capacity count against the service, which
/// is what keeps a slot from being double-sold.
pub async fn lock_row(tx: &mut Transaction<'_, Postgres>, id: i64) -> ServiceResult<bool> {
    let locked: Option<i64> =
        sqlx::query_scalar("SELECT id FROM services WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(locked.is_some())
}
