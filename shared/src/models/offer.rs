//! Offer Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Offer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum OfferStatus {
    #[serde(rename = "ACTIVE")]
    #[cfg_attr(feature = "db", sqlx(rename = "ACTIVE"))]
    Active,
    #[serde(rename = "INACTIVE")]
    #[cfg_attr(feature = "db", sqlx(rename = "INACTIVE"))]
    Inactive,
    #[serde(rename = "PAUSED")]
    #[cfg_attr(feature = "db", sqlx(rename = "PAUSED"))]
    Paused,
    #[serde(rename = "EXPIRED")]
    #[cfg_attr(feature = "db", sqlx(rename = "EXPIRED"))]
    Expired,
}

/// A store's time-limited discount against one service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Offer {
    pub id: i64,
    pub service_id: i64,
    pub title: String,
    /// Discount percentage, expected in (0, 100)
    pub discount_percent: Decimal,
    pub status: OfferStatus,
    /// Expiration instant (UTC millis)
    pub expires_at: i64,
    pub created_at: i64,
}

impl Offer {
    /// Whether the offer can be booked at `now`
    pub fn is_bookable(&self, now: i64) -> bool {
        self.status == OfferStatus::Active && now < self.expires_at
    }
}
