//! Payment Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum PaymentStatus {
    /// No access fee is collected for this booking kind
    #[serde(rename = "NOT_REQUIRED")]
    #[cfg_attr(feature = "db", sqlx(rename = "NOT_REQUIRED"))]
    NotRequired,
    /// Fee due, no successful charge yet
    #[serde(rename = "PENDING")]
    #[cfg_attr(feature = "db", sqlx(rename = "PENDING"))]
    Pending,
    #[serde(rename = "PAID")]
    #[cfg_attr(feature = "db", sqlx(rename = "PAID"))]
    Paid,
    #[serde(rename = "FAILED")]
    #[cfg_attr(feature = "db", sqlx(rename = "FAILED"))]
    Failed,
    #[serde(rename = "REFUNDED")]
    #[cfg_attr(feature = "db", sqlx(rename = "REFUNDED"))]
    Refunded,
}

/// Payment record, created only when an access fee was actually charged
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub status: PaymentStatus,
    /// Gateway transaction id
    pub transaction_id: Option<String>,
    pub created_at: i64,
}
