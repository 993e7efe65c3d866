//! Unified error codes for the booking marketplace
//!
//! Error codes are shared between the server and its clients and are
//! organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Booking errors
//! - 5xxx: Payment errors
//! - 6xxx: Offer / Service errors
//! - 7xxx: Store / Staff / User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Actor does not own the resource being mutated
    NotResourceOwner = 2003,

    // ==================== 4xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Slot capacity exhausted or otherwise unbookable
    SlotUnavailable = 4002,
    /// Start time outside the legal advance-booking window
    OutsideBookingWindow = 4003,
    /// Illegal lifecycle transition attempted
    InvalidStateTransition = 4004,
    /// Cancellation refused: too close to the start time
    CancellationWindowClosed = 4005,
    /// Requested date falls on a non-working day
    NonWorkingDay = 4006,
    /// Requested date is in the past
    DateInPast = 4007,
    /// Online booking is disabled for this service
    OnlineBookingDisabled = 4008,
    /// Booking kind not recognized
    InvalidBookingKind = 4009,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,

    // ==================== 6xxx: Offer / Service ====================
    /// Offer not found
    OfferNotFound = 6001,
    /// Offer is not active
    OfferNotActive = 6002,
    /// Offer has passed its expiration timestamp
    OfferExpired = 6003,
    /// Service not found
    ServiceNotFound = 6101,

    // ==================== 7xxx: Store / Staff / User ====================
    /// Store not found
    StoreNotFound = 7001,
    /// Branch not found
    BranchNotFound = 7101,
    /// Staff member not found
    StaffNotFound = 7201,
    /// Staff member is inactive
    StaffInactive = 7202,
    /// Staff member is not attached to the requested branch/store
    StaffNotAtBranch = 7203,
    /// User not found
    UserNotFound = 7301,
    /// User account is inactive
    UserInactive = 7302,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::NotResourceOwner => "Actor does not own this resource",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::SlotUnavailable => "Slot is not available",
            ErrorCode::OutsideBookingWindow => "Start time is outside the booking window",
            ErrorCode::InvalidStateTransition => "Invalid booking state transition",
            ErrorCode::CancellationWindowClosed => "Too close to start time to cancel",
            ErrorCode::NonWorkingDay => "Requested date is not a working day",
            ErrorCode::DateInPast => "Requested date is in the past",
            ErrorCode::OnlineBookingDisabled => "Online booking is disabled for this service",
            ErrorCode::InvalidBookingKind => "Booking kind not recognized",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // Offer / Service
            ErrorCode::OfferNotFound => "Offer not found",
            ErrorCode::OfferNotActive => "Offer is not active",
            ErrorCode::OfferExpired => "Offer has expired",
            ErrorCode::ServiceNotFound => "Service not found",

            // Store / Staff / User
            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::StaffNotFound => "Staff member not found",
            ErrorCode::StaffInactive => "Staff member is inactive",
            ErrorCode::StaffNotAtBranch => "Staff member is not attached to this branch",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserInactive => "User account is inactive",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::NotResourceOwner),

            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::SlotUnavailable),
            4003 => Ok(ErrorCode::OutsideBookingWindow),
            4004 => Ok(ErrorCode::InvalidStateTransition),
            4005 => Ok(ErrorCode::CancellationWindowClosed),
            4006 => Ok(ErrorCode::NonWorkingDay),
            4007 => Ok(ErrorCode::DateInPast),
            4008 => Ok(ErrorCode::OnlineBookingDisabled),
            4009 => Ok(ErrorCode::InvalidBookingKind),

            5001 => Ok(ErrorCode::PaymentFailed),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),

            6001 => Ok(ErrorCode::OfferNotFound),
            6002 => Ok(ErrorCode::OfferNotActive),
            6003 => Ok(ErrorCode::OfferExpired),
            6101 => Ok(ErrorCode::ServiceNotFound),

            7001 => Ok(ErrorCode::StoreNotFound),
            7101 => Ok(ErrorCode::BranchNotFound),
            7201 => Ok(ErrorCode::StaffNotFound),
            7202 => Ok(ErrorCode::StaffInactive),
            7203 => Ok(ErrorCode::StaffNotAtBranch),
            7301 => Ok(ErrorCode::UserNotFound),
            7302 => Ok(ErrorCode::UserInactive),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidFormat.code(), 6);

        // Auth
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::TokenExpired.code(), 1003);

        // Permission
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::NotResourceOwner.code(), 2003);

        // Booking
        assert_eq!(ErrorCode::BookingNotFound.code(), 4001);
        assert_eq!(ErrorCode::SlotUnavailable.code(), 4002);
        assert_eq!(ErrorCode::OutsideBookingWindow.code(), 4003);
        assert_eq!(ErrorCode::InvalidStateTransition.code(), 4004);
        assert_eq!(ErrorCode::CancellationWindowClosed.code(), 4005);

        // Payment
        assert_eq!(ErrorCode::PaymentFailed.code(), 5001);

        // Offer / Service
        assert_eq!(ErrorCode::OfferNotFound.code(), 6001);
        assert_eq!(ErrorCode::OfferExpired.code(), 6003);
        assert_eq!(ErrorCode::ServiceNotFound.code(), 6101);

        // Store / Staff / User
        assert_eq!(ErrorCode::StoreNotFound.code(), 7001);
        assert_eq!(ErrorCode::StaffInactive.code(), 7202);
        assert_eq!(ErrorCode::UserNotFound.code(), 7301);

        // System
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_round_trip_conversion() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotAuthenticated,
            ErrorCode::PermissionDenied,
            ErrorCode::BookingNotFound,
            ErrorCode::SlotUnavailable,
            ErrorCode::InvalidStateTransition,
            ErrorCode::PaymentFailed,
            ErrorCode::OfferExpired,
            ErrorCode::StaffNotAtBranch,
            ErrorCode::InternalError,
        ];
        for code in codes {
            let value: u16 = code.into();
            assert_eq!(ErrorCode::try_from(value), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code_rejected() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
        assert_eq!(ErrorCode::BookingNotFound.to_string(), "E4001");
        assert_eq!(ErrorCode::InternalError.to_string(), "E9001");
    }

    #[test]
    fn test_messages_are_nonempty() {
        assert!(!ErrorCode::SlotUnavailable.message().is_empty());
        assert!(!ErrorCode::CancellationWindowClosed.message().is_empty());
    }
}
