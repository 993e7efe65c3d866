//! Offer repository

use shared::models::Offer;
use sqlx::PgPool;

use crate::error::ServiceResult;

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Offer>> {
    let offer = sqlx::query_as::<_, Offer>(
        "SELECT id, service_id, title, discount_percent, status, expires_at, created_at FROM offers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(offer)
}

/// Flip ACTIVE offers whose expiry has passed to EXPIRED. Returns rows moved.
pub async fn expire_stale(pool: &PgPool, now: i64) -> ServiceResult<u64> {
    let rows = sqlx::query("UPDATE offers SET status = 'EXPIRED' WHERE status = 'ACTIVE' AND expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected())
}
