//! Service Model
//!
//! Read-mostly configuration of a bookable service: duration, buffer,
//! grace period, the legal advance-booking window, per-slot capacity and
//! the flags that drive check-in / auto-completion behavior.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bookable service owned by a store (optionally scoped to a branch)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Service {
    pub id: i64,
    pub store_id: i64,
    /// Branch scope; branch working hours take precedence when set
    pub branch_id: Option<i64>,
    pub name: String,
    /// Regular (undiscounted) price
    pub price: Decimal,
    pub currency: String,
    pub duration_minutes: i32,
    /// Mandatory gap after each booking
    pub buffer_minutes: i32,
    /// Tolerance after start before a missed booking becomes a no-show
    pub grace_period_minutes: i32,
    /// Earliest legal start, relative to now
    pub min_advance_minutes: i32,
    /// Latest legal start, relative to now
    pub max_advance_minutes: i32,
    /// Capacity per identical start time
    pub max_concurrent_bookings: i32,
    /// Staff-scoped bookings are exclusive regardless of capacity
    pub requires_exclusive_staff: bool,
    /// Sweeper may complete after the service window elapses
    pub auto_complete_on_duration: bool,
    pub allow_early_checkin: bool,
    pub early_checkin_minutes: i32,
    /// Cancellations inside this window are refused
    pub min_cancellation_hours: i32,
    pub online_booking_enabled: bool,
    pub active: bool,
}

impl Service {
    /// Slot spacing: duration plus the mandatory buffer
    pub fn slot_interval_minutes(&self) -> i32 {
        self.duration_minutes + self.buffer_minutes
    }

    /// Effective per-slot capacity for the given scope
    ///
    /// Staff-scoped exclusive services always have capacity 1.
    pub fn capacity_for(&self, staff_scoped: bool) -> i32 {
        if staff_scoped && self.requires_exclusive_staff {
            1
        } else {
            self.max_concurrent_bookings.max(0)
        }
    }
}
