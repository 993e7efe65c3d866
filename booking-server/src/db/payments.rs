//! Payment repository

use shared::models::Payment;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ServiceResult;

pub async fn insert(tx: &mut Transaction<'_, Postgres>, p: &Payment) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO payments (id, booking_id, amount, currency, method, status, transaction_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(p.id)
    .bind(p.booking_id)
    .bind(p.amount)
    .bind(&p.currency)
    .bind(&p.method)
    .bind(p.status)
    .bind(p.transaction_id.as_deref())
    .bind(p.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Flag a booking's payment as refunded, on both the payment row and the
/// booking's denormalized payment status.
pub async fn mark_refunded(pool: &PgPool, booking_id: i64, now: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE payments SET status = 'REFUNDED' WHERE booking_id = $1 AND status = 'PAID'")
        .bind(booking_id)
        .execute(pool)
        .await?;
    sqlx::query(
        "UPDATE bookings SET payment_status = 'REFUNDED', updated_at = $1 WHERE id = $2 AND payment_status = 'PAID'",
    )
    .bind(now)
    .bind(booking_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_booking(pool: &PgPool, booking_id: i64) -> ServiceResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, booking_id, amount, currency, method, status, transaction_id, created_at FROM payments WHERE booking_id = $1 ORDER BY created_at",
    )
    .bind(booking_id)
    .fetch_all(pool)
    .await?;
    Ok(payments)
}
