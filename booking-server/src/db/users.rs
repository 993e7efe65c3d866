//! User repository

use shared::models::User;
use sqlx::PgPool;

use crate::error::ServiceResult;

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, active, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}
