//! Booking engine.
//!
//! Pure slot and fee math lives in [`slots`] and [`fees`] and takes an
//! explicit `now`; the orchestration modules ([`create`], [`lifecycle`],
//! [`sweeper`]) tie that math to the database and external services.

pub mod create;
pub mod fees;
pub mod lifecycle;
pub mod slots;
pub mod sweeper;
