//! Shared types for the booking marketplace
//!
//! Common types used across crates: the unified error system,
//! domain models, and small utilities (clock, id generation).

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
