//! Staff repository

use shared::models::Staff;
use sqlx::PgPool;

use crate::error::ServiceResult;

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Staff>> {
    let member = sqlx::query_as::<_, Staff>(
        "SELECT id, store_id, branch_id, name, active FROM staff WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(member)
}
