//! Store and branch repository

use shared::models::{Branch, Store};
use sqlx::PgPool;

use crate::error::ServiceResult;

pub async fn find_store(pool: &PgPool, id: i64) -> ServiceResult<Option<Store>> {
    let store = sqlx::query_as::<_, Store>(
        "SELECT id, merchant_id, name, open_minutes, close_minutes, working_days, utc_offset_minutes, active FROM stores WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(store)
}

pub async fn find_branch(pool: &PgPool, id: i64) -> ServiceResult<Option<Branch>> {
    let branch = sqlx::query_as::<_, Branch>(
        "SELECT id, store_id, name, open_minutes, close_minutes, working_days, active FROM branches WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(branch)
}
