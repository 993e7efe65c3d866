//! Store and Branch Models

use serde::{Deserialize, Serialize};

/// Store (merchant location)
///
/// Opening hours are minutes from local midnight; `working_days` holds
/// ISO weekday numbers (1 = Monday … 7 = Sunday). All instants elsewhere
/// are UTC millis; `utc_offset_minutes` converts store-local wall time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub merchant_id: i64,
    pub name: String,
    pub open_minutes: i32,
    pub close_minutes: i32,
    pub working_days: Vec<i32>,
    pub utc_offset_minutes: i32,
    pub active: bool,
}

/// Branch of a store
///
/// Hour fields are optional; a branch without its own hours inherits
/// the parent store's schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub open_minutes: Option<i32>,
    pub close_minutes: Option<i32>,
    pub working_days: Option<Vec<i32>>,
    pub active: bool,
}
