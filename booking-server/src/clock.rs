//! Time source abstraction.
//!
//! All slot math, lifecycle checks and the sweeper take their notion of "now"
//! from a [`Clock`] so that tests can pin time to a fixed instant.

use std::sync::Arc;

/// Provides the current time as UTC epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

pub type SharedClock = Arc<dyn Clock>;
