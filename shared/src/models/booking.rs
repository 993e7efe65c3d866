//! Booking Model
//!
//! The central entity of the marketplace: a customer's time-bound,
//! conflict-free appointment against a discount offer (or a plain
//! service), carried through its whole lifecycle by the server.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Booking lifecycle status
///
/// `PENDING → CONFIRMED → CHECKED_IN → COMPLETED` is the happy path;
/// `CANCELLED`, `NO_SHOW` and `EXPIRED` are terminal side branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum BookingStatus {
    #[serde(rename = "PENDING")]
    #[cfg_attr(feature = "db", sqlx(rename = "PENDING"))]
    Pending,
    #[serde(rename = "CONFIRMED")]
    #[cfg_attr(feature = "db", sqlx(rename = "CONFIRMED"))]
    Confirmed,
    #[serde(rename = "CHECKED_IN")]
    #[cfg_attr(feature = "db", sqlx(rename = "CHECKED_IN"))]
    CheckedIn,
    #[serde(rename = "COMPLETED")]
    #[cfg_attr(feature = "db", sqlx(rename = "COMPLETED"))]
    Completed,
    #[serde(rename = "CANCELLED")]
    #[cfg_attr(feature = "db", sqlx(rename = "CANCELLED"))]
    Cancelled,
    #[serde(rename = "NO_SHOW")]
    #[cfg_attr(feature = "db", sqlx(rename = "NO_SHOW"))]
    NoShow,
    #[serde(rename = "EXPIRED")]
    #[cfg_attr(feature = "db", sqlx(rename = "EXPIRED"))]
    Expired,
}

impl BookingStatus {
    /// Terminal states admit no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::NoShow | Self::Expired
        )
    }

    /// The wire/database string for this status
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
            Self::Expired => "EXPIRED",
        }
    }
}

/// Booking kind discriminator
///
/// All kinds share one table and one lifecycle; kind-specific references
/// (offer vs. plain service) are nullable columns on the common record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum BookingKind {
    /// Redemption of a discount offer (access fee applies)
    #[default]
    #[serde(rename = "OFFER_REDEMPTION")]
    #[cfg_attr(feature = "db", sqlx(rename = "OFFER_REDEMPTION"))]
    OfferRedemption,
    /// Direct service booking without an offer (no access fee)
    #[serde(rename = "SERVICE_ONLY")]
    #[cfg_attr(feature = "db", sqlx(rename = "SERVICE_ONLY"))]
    ServiceOnly,
}

/// How a booking reached COMPLETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum CompletionMethod {
    #[serde(rename = "MANUAL")]
    #[cfg_attr(feature = "db", sqlx(rename = "MANUAL"))]
    Manual,
    #[serde(rename = "AUTOMATIC")]
    #[cfg_attr(feature = "db", sqlx(rename = "AUTOMATIC"))]
    Automatic,
}

/// Booking record
///
/// Timestamps are UTC epoch milliseconds. `end_time` is always
/// `start_time + service duration` as of the latest (re)schedule;
/// `service_end_time` is the actual end, set at check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: i64,
    pub kind: BookingKind,
    pub offer_id: Option<i64>,
    /// Governing service (denormalized for sweeper scans)
    pub service_id: i64,
    pub user_id: i64,
    pub store_id: i64,
    pub branch_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub payment_id: Option<i64>,
    pub start_time: i64,
    pub end_time: i64,
    pub status: BookingStatus,
    pub payment_status: super::PaymentStatus,
    /// Fee charged to unlock the discounted service
    pub access_fee: Decimal,
    /// Opaque reference to the verification artifact (set post-commit)
    pub qr_artifact_ref: Option<String>,
    pub checked_in_at: Option<i64>,
    pub service_started_at: Option<i64>,
    /// Actual service end (check-in time + duration), may differ from `end_time`
    pub service_end_time: Option<i64>,
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub auto_completed: bool,
    pub completion_method: Option<CompletionMethod>,
    /// Decision trail for completion (actual duration, actor)
    pub completion_details: Option<Value>,
    pub no_show_marked_at: Option<i64>,
    pub no_show_reason: Option<String>,
    /// Decision trail for automatic no-show (grace, duration, minutes overdue)
    pub no_show_details: Option<Value>,
    pub expired_at: Option<i64>,
    pub expiry_reason: Option<String>,
    /// Decision trail for sweeper expiry of an unconfirmed booking
    pub expiry_details: Option<Value>,
    pub cancelled_at: Option<i64>,
    pub cancellation_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Optional payment payload supplied with a create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// Payment method identifier (e.g. "card", "wallet")
    pub method: String,
    /// Opaque gateway reference (tokenized instrument)
    pub reference: String,
}

/// Create booking payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreate {
    #[serde(default)]
    pub kind: BookingKind,
    /// Required for OFFER_REDEMPTION
    pub offer_id: Option<i64>,
    /// Required for SERVICE_ONLY
    pub service_id: Option<i64>,
    /// Store-local start time, "YYYY-MM-DD HH:MM"
    pub start_time: String,
    pub branch_id: Option<i64>,
    pub staff_id: Option<i64>,
    /// When present, payment is attempted before the booking persists
    pub payment: Option<PaymentPayload>,
}

/// Cancel booking payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BookingCancel {
    pub reason: Option<String>,
}

/// Reschedule booking payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReschedule {
    /// Store-local new start time, "YYYY-MM-DD HH:MM"
    pub new_start_time: String,
    pub reason: Option<String>,
}

/// Create response: the booking plus the slot's remaining capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking: Booking,
    pub remaining_slots: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::CheckedIn.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&BookingStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"CHECKED_IN\"");
        let status: BookingStatus = serde_json::from_str("\"NO_SHOW\"").unwrap();
        assert_eq!(status, BookingStatus::NoShow);
        assert_eq!(BookingStatus::NoShow.as_str(), "NO_SHOW");
    }
}
