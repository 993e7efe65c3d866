//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 4xxx: Booking errors
/// - 5xxx: Payment errors
/// - 6xxx: Offer / Service errors
/// - 7xxx: Store / Staff / User errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Booking errors (4xxx)
    Booking,
    /// Payment errors (5xxx)
    Payment,
    /// Offer / Service errors (6xxx)
    Offer,
    /// Store / Staff / User errors (7xxx)
    Directory,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            4000..5000 => Self::Booking,
            5000..6000 => Self::Payment,
            6000..7000 => Self::Offer,
            7000..8000 => Self::Directory,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Booking => "booking",
            Self::Payment => "payment",
            Self::Offer => "offer",
            Self::Directory => "directory",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCode::ValidationFailed.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::NotAuthenticated.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::PermissionDenied.category(), ErrorCategory::Permission);
        assert_eq!(ErrorCode::SlotUnavailable.category(), ErrorCategory::Booking);
        assert_eq!(ErrorCode::PaymentFailed.category(), ErrorCategory::Payment);
        assert_eq!(ErrorCode::OfferExpired.category(), ErrorCategory::Offer);
        assert_eq!(ErrorCode::StaffInactive.category(), ErrorCategory::Directory);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::Booking.name(), "booking");
        assert_eq!(ErrorCategory::System.name(), "system");
    }
}
