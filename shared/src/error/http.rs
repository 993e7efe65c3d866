//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::BookingNotFound
            | Self::OfferNotFound
            | Self::ServiceNotFound
            | Self::StoreNotFound
            | Self::BranchNotFound
            | Self::StaffNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (capacity/state races lose here, not with 500s)
            Self::AlreadyExists
            | Self::SlotUnavailable
            | Self::InvalidStateTransition => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::NotResourceOwner
            | Self::StaffInactive
            | Self::UserInactive => StatusCode::FORBIDDEN,

            // 422 Unprocessable (business rules on otherwise valid input)
            Self::CancellationWindowClosed
            | Self::OutsideBookingWindow
            | Self::OfferNotActive
            | Self::OfferExpired
            | Self::OnlineBookingDisabled => StatusCode::UNPROCESSABLE_ENTITY,

            // 402 Payment Required
            Self::PaymentFailed => StatusCode::PAYMENT_REQUIRED,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::BookingNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::OfferNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::StaffNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::SlotUnavailable.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InvalidStateTransition.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ErrorCode::NotResourceOwner.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_business_rule_status() {
        assert_eq!(
            ErrorCode::CancellationWindowClosed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::OutsideBookingWindow.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::OfferExpired.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_payment_required_status() {
        assert_eq!(
            ErrorCode::PaymentFailed.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_defaults_to_bad_request() {
        assert_eq!(ErrorCode::ValidationFailed.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::DateInPast.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NonWorkingDay.http_status(), StatusCode::BAD_REQUEST);
    }
}
