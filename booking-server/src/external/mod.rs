//! External service clients.
//!
//! Plain reqwest REST clients, no vendor SDKs. Each client has a
//! development fallback when its URL is unconfigured so the server runs
//! end-to-end locally.

pub mod artifact;
pub mod notify;
pub mod payment;
