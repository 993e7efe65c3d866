//! Staff Model

use serde::{Deserialize, Serialize};

/// Staff member attached to a store (optionally a specific branch)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Staff {
    pub id: i64,
    pub store_id: i64,
    pub branch_id: Option<i64>,
    pub name: String,
    pub active: bool,
}
