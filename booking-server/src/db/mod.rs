//! Data access layer.
//!
//! Plain async functions over a [`sqlx::PgPool`] (or an explicit executor
//! when a caller holds a transaction). Lifecycle transitions are expressed
//! as conditional updates; callers inspect `rows_affected` to distinguish
//! "moved" from "was not in the expected state".

pub mod bookings;
pub mod offers;
pub mod payments;
pub mod services;
pub mod staff;
pub mod stores;
pub mod users;
